pub mod charting;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use typemaster::{
    editor::{EditorLayout, WrappedLine, MAX_CHARS},
    history,
};

use crate::{App, SetupField};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const SETUP_LEGEND: &str =
    "(↑/↓) select  (←/→) change  (enter) start  (e) edit passage  (h) history  (esc) quit";

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

fn editor_chunks(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area)
        .to_vec()
}

/// Text area of the custom passage editor inside its border.
pub fn editor_area(area: Rect) -> Rect {
    Block::default()
        .borders(Borders::ALL)
        .inner(editor_chunks(area)[1])
}

pub fn render_setup(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(1), // user
            Constraint::Length(1),
            Constraint::Length(3), // settings
            Constraint::Length(1),
            Constraint::Min(1), // passage preview
            Constraint::Length(1), // message
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let title = Paragraph::new(Span::styled(
        "typemaster",
        bold_style().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let user = Paragraph::new(format!("user: {}", app.config.username))
        .style(Style::default().add_modifier(Modifier::DIM))
        .alignment(Alignment::Center);
    f.render_widget(user, chunks[1]);

    let selected = app.selected_field();
    let rows: Vec<Line> = SetupField::ALL
        .iter()
        .map(|field| {
            let (label, value) = match field {
                SetupField::Duration => ("duration", app.config.duration.to_string()),
                SetupField::Difficulty => ("difficulty", app.config.difficulty.to_string()),
                SetupField::Mode => (
                    "passages",
                    if app.config.custom_mode {
                        "custom".to_string()
                    } else {
                        "random".to_string()
                    },
                ),
            };
            let style = if *field == selected {
                bold_style().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let marker = if *field == selected { "> " } else { "  " };
            Line::from(vec![
                Span::styled(format!("{marker}{label:<12}"), style),
                Span::styled(format!("< {value} >"), style),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(rows).alignment(Alignment::Center), chunks[3]);

    if app.config.custom_mode {
        let text = app.editor.text();
        let preview = if text.is_empty() {
            Span::styled("(empty, press e to write one)", dim_bold_style())
        } else {
            Span::styled(text, dim_bold_style())
        };
        let widget = Paragraph::new(preview)
            .block(Block::default().borders(Borders::ALL).title("custom passage"))
            .wrap(Wrap { trim: true });
        f.render_widget(widget, chunks[5]);
    }

    if let Some(message) = &app.message {
        let widget = Paragraph::new(Span::styled(message.as_str(), bold_style().fg(Color::Red)));
        let widget = widget.alignment(Alignment::Center);
        f.render_widget(widget, chunks[6]);
    }

    f.render_widget(legend(SETUP_LEGEND), chunks[7]);
}

fn editor_line(line: &WrappedLine, layout: &EditorLayout, app: &App) -> Line<'static> {
    let caret_style = Style::default().add_modifier(Modifier::REVERSED | Modifier::UNDERLINED);
    let selected_style = Style::default().bg(Color::Blue).fg(Color::White);

    let selection = app.editor.selected_range();
    let highlight = EditorLayout::highlight_columns(line, &selection);
    let caret = app.editor.caret();
    let caret_line = layout.lines().get(layout.line_of(caret));
    let on_caret_line = caret_line.map(|l| l.start) == Some(line.start);
    let caret_column = (app.editor.is_collapsed() && on_caret_line).then(|| caret - line.start);

    let mut spans: Vec<Span> = line
        .text
        .chars()
        .enumerate()
        .map(|(column, c)| {
            let style = if Some(column) == caret_column {
                caret_style
            } else if highlight.as_ref().is_some_and(|h| h.contains(&column)) {
                selected_style
            } else {
                Style::default()
            };
            Span::styled(c.to_string(), style)
        })
        .collect();

    if caret_column == Some(line.len) {
        spans.push(Span::styled(" ", caret_style));
    }
    Line::from(spans)
}

pub fn render_editor(app: &App, f: &mut Frame) {
    let area = f.area();
    let chunks = editor_chunks(area);
    let inner = editor_area(area);
    let layout = app.editor_layout(area);

    let title = Paragraph::new(Span::styled(
        format!("custom passage  {}/{}", app.editor.len(), MAX_CHARS),
        bold_style(),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);
    f.render_widget(Block::default().borders(Borders::ALL), chunks[1]);

    if app.editor.is_empty() {
        let caret = Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED));
        f.render_widget(Paragraph::new(caret), Rect { height: 1, ..inner });
    }

    for (top, line) in layout.visible_lines(app.editor.scroll_offset()) {
        if top < 0.0 || top >= inner.height as f32 {
            continue;
        }
        let row = Rect {
            y: inner.y + top as u16,
            height: 1,
            ..inner
        };
        f.render_widget(Paragraph::new(editor_line(line, &layout, app)), row);
    }

    f.render_widget(
        legend("(ctrl+a) select all  (ctrl+c) copy  (ctrl+v) paste  (esc) done"),
        chunks[2],
    );
}

pub fn render_typing(app: &App, f: &mut Frame) {
    let session = &app.session;
    let green_bold_style = bold_style().fg(Color::Green);
    let red_bold_style = bold_style().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold_style().add_modifier(Modifier::UNDERLINED);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // timer and live wpm
            Constraint::Length(1),
            Constraint::Min(1), // passage
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let status = Paragraph::new(Span::styled(
        format!(
            "{:.1}   {} wpm   passage {}/{}",
            session.remaining_secs(),
            session.current_wpm(),
            (session.passage_index() + 1).min(session.passages().len()),
            session.passages().len()
        ),
        dim_bold_style(),
    ))
    .alignment(Alignment::Center);
    f.render_widget(status, chunks[0]);

    if let Some(passage) = session.current_passage() {
        let input = session.input();
        let spans: Vec<Span> = passage
            .chars()
            .iter()
            .enumerate()
            .map(|(idx, &expected)| match input.get(idx) {
                Some(&typed) if typed == expected => {
                    Span::styled(expected.to_string(), green_bold_style)
                }
                Some(&typed) => Span::styled(
                    match typed {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red_bold_style,
                ),
                None if idx == input.len() => {
                    Span::styled(expected.to_string(), underlined_dim_bold_style)
                }
                None => Span::styled(expected.to_string(), dim_bold_style()),
            })
            .collect();

        let widget = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false });
        f.render_widget(widget, chunks[2]);
    }

    f.render_widget(legend("(enter) finish now  (esc) abandon"), chunks[3]);
}

pub fn render_results(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // headline
            Constraint::Length(1), // details
            Constraint::Length(1), // saved
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    if let Some(summary) = &app.last_summary {
        let headline = Paragraph::new(Span::styled(
            format!("{} wpm   {:.2}% acc", summary.wpm, summary.accuracy),
            bold_style(),
        ))
        .alignment(Alignment::Center);
        f.render_widget(headline, chunks[1]);

        let details = Paragraph::new(Span::styled(
            format!(
                "{}/{} correct   {:.0}s of {}s   {}   {} passage(s) done",
                summary.correct_chars,
                summary.total_chars,
                summary.elapsed_secs,
                summary.duration_secs,
                summary.difficulty,
                summary.passages_completed
            ),
            dim_bold_style(),
        ))
        .alignment(Alignment::Center);
        f.render_widget(details, chunks[2]);
    }

    let saved = match &app.last_record {
        Some(record) => Span::styled(
            format!("saved for {}", record.username),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ),
        None => Span::styled("result not saved", Style::default().fg(Color::Red)),
    };
    f.render_widget(Paragraph::new(saved).alignment(Alignment::Center), chunks[3]);

    f.render_widget(legend("(enter) again  (h) history  (esc) setup"), chunks[5]);
}

pub fn render_history(app: &App, f: &mut Frame) {
    let magenta_style = Style::default().fg(Color::Magenta);
    let stats = history::aggregate(&app.history);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // aggregate
            Constraint::Percentage(50), // chart
            Constraint::Min(1), // records
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let summary = Paragraph::new(Span::styled(
        format!(
            "{}   {} tests   {:.1} avg wpm   {:.2}% avg acc   {} best",
            app.config.username,
            stats.total_tests,
            stats.avg_wpm,
            stats.avg_accuracy,
            stats.best_wpm
        ),
        bold_style(),
    ))
    .alignment(Alignment::Center);
    f.render_widget(summary, chunks[0]);

    let points = charting::wpm_points(&app.history);
    let (tests, highest_wpm) = charting::compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&points)];
    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("test")
                .bounds([1.0, tests])
                .labels(vec![
                    Span::styled("1", bold_style()),
                    Span::styled(charting::format_label(tests), bold_style()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style()),
                    Span::styled(charting::format_label(highest_wpm), bold_style()),
                ]),
        );
    f.render_widget(chart, chunks[1]);

    let rows: Vec<Line> = if app.history.is_empty() {
        vec![Line::from(Span::styled("no tests yet", dim_bold_style()))]
    } else {
        app.history
            .iter()
            .skip(app.history_scroll)
            .map(|record| {
                Line::from(format!(
                    "{}   {:>3} wpm   {:>6.2}%   {:>3}s   {}",
                    record.date.format(history::DATE_FORMAT),
                    record.wpm,
                    record.accuracy,
                    record.duration_secs,
                    record
                        .difficulty()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| format!("level {}", record.difficulty_level))
                ))
            })
            .collect()
    };
    f.render_widget(
        Paragraph::new(rows).block(Block::default().borders(Borders::TOP).title("recent")),
        chunks[2],
    );

    f.render_widget(legend("(↑/↓) scroll  (esc) back"), chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_area_is_inside_margins_and_border() {
        let area = Rect::new(0, 0, 80, 24);
        let inner = editor_area(area);
        assert_eq!(inner.x, HORIZONTAL_MARGIN + 1);
        assert_eq!(inner.y, VERTICAL_MARGIN + 1 + 1);
        assert_eq!(inner.width, 80 - 2 * HORIZONTAL_MARGIN - 2);
        assert!(inner.height > 0);
    }

    #[test]
    fn editor_area_on_tiny_terminal_does_not_panic() {
        let inner = editor_area(Rect::new(0, 0, 4, 3));
        assert!(inner.width <= 4);
    }
}
