mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use typemaster::{
    app_dirs::AppDirs,
    clipboard::{Clipboard, SystemClipboard},
    config::{normalize_username, Config, ConfigStore, FileConfigStore},
    editor::{CellMeasure, EditorBuffer, EditorLayout, Viewport},
    history::{self, FileHistoryStore, Recorder, TypingRecord},
    passage::{Difficulty, PassageLibrary},
    runtime::{
        self, CrosstermEventSource, FixedTicker, Frame, HostEvent, PointerInput, Runner,
        SystemClock,
    },
    session::{InputEvent, Session, SessionSummary, SideEffect, TestDuration, Transition},
};

const TICK_RATE_MS: u64 = 50;
const WHEEL_STEP_LINES: f32 = 3.0;
const RECENT_RECORDS: usize = 10;

/// timed typing tests with graded passages and a local history
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// name recorded with every result
    #[clap(short = 'u', long)]
    user: Option<String>,

    /// test length in seconds
    #[clap(short = 's', long, value_enum)]
    secs: Option<TestDuration>,

    /// passage difficulty
    #[clap(short = 'l', long, value_enum)]
    level: Option<Difficulty>,

    /// type this text instead of a random passage
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// directory with easy.txt, medium.txt and hard.txt
    #[clap(long, value_name = "DIR")]
    passages: Option<PathBuf>,

    /// history log to read and append to
    #[clap(long, value_name = "PATH")]
    history_file: Option<PathBuf>,

    /// print statistics for the user and exit
    #[clap(long)]
    stats: bool,
}

impl Cli {
    /// Flags win over the stored configuration.
    fn apply_to(&self, config: &mut Config) {
        if let Some(user) = &self.user {
            config.username = normalize_username(user);
        }
        if let Some(secs) = self.secs {
            config.duration = secs;
        }
        if let Some(level) = self.level {
            config.difficulty = level;
        }
        if let Some(prompt) = &self.prompt {
            config.custom_mode = true;
            config.custom_passage = prompt.clone();
        }
        if let Some(dir) = &self.passages {
            config.passage_dir = Some(dir.clone());
        }
        if let Some(path) = &self.history_file {
            config.history_path = Some(path.clone());
        }
    }
}

fn passage_library(config: &Config) -> PassageLibrary {
    match &config.passage_dir {
        Some(dir) => PassageLibrary::Directory(dir.clone()),
        None => PassageLibrary::Bundled,
    }
}

fn history_store(config: &Config) -> FileHistoryStore {
    let path = config
        .history_path
        .clone()
        .or_else(AppDirs::history_path)
        .unwrap_or_else(|| PathBuf::from("typemaster_history.txt"));
    FileHistoryStore::with_path(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Setup,
    Editor,
    Typing,
    Results,
    History,
}

/// Rows of the setup screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Duration,
    Difficulty,
    Mode,
}

impl SetupField {
    pub const ALL: [SetupField; 3] = [
        SetupField::Duration,
        SetupField::Difficulty,
        SetupField::Mode,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub state: AppState,
    pub config: Config,
    config_store: Box<dyn ConfigStore>,
    library: PassageLibrary,
    recorder: Recorder<FileHistoryStore>,
    clipboard: Box<dyn Clipboard>,
    pub session: Session,
    pub editor: EditorBuffer,
    pub setup_field: usize,
    pub message: Option<String>,
    pub last_summary: Option<SessionSummary>,
    pub last_record: Option<TypingRecord>,
    pub history: Vec<TypingRecord>,
    pub history_scroll: usize,
    fresh_start: bool,
}

impl App {
    pub fn new(
        config: Config,
        config_store: Box<dyn ConfigStore>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        let library = passage_library(&config);
        let recorder = Recorder::new(history_store(&config));
        Self {
            state: AppState::Setup,
            session: Session::new(config.session_config()),
            editor: EditorBuffer::from_text(&config.custom_passage),
            config,
            config_store,
            library,
            recorder,
            clipboard,
            setup_field: 0,
            message: None,
            last_summary: None,
            last_record: None,
            history: Vec::new(),
            history_scroll: 0,
            fresh_start: false,
        }
    }

    pub fn selected_field(&self) -> SetupField {
        SetupField::ALL[self.setup_field % SetupField::ALL.len()]
    }

    fn save_config(&self) {
        if let Err(e) = self.config_store.save(&self.config) {
            warn!("failed to save config: {}", e);
        }
    }

    pub fn start_session(&mut self) {
        self.config.custom_passage = self.editor.text();
        let mut session = Session::new(self.config.session_config());
        match session.start(&self.library) {
            Ok(()) => {
                self.session = session;
                self.message = None;
                self.fresh_start = true;
                self.state = AppState::Typing;
            }
            Err(e) => {
                info!("cannot start session: {}", e);
                self.message = Some(format!("Cannot start: {}", e));
                self.state = AppState::Setup;
            }
        }
    }

    pub fn open_history(&mut self) {
        self.history = self.recorder.load(&self.config.username);
        self.history_scroll = 0;
        self.state = AppState::History;
    }

    /// Apply one frame of host input. Keys for the typing screen are batched into a
    /// single session tick together with the frame time.
    fn on_frame(&mut self, frame: &Frame, area: Rect) -> Flow {
        let mut typed: Vec<InputEvent> = Vec::new();

        for event in &frame.events {
            if let HostEvent::Key(key) = event {
                if runtime::is_quit(key) {
                    return Flow::Quit;
                }
            }
            if self.state == AppState::Typing {
                if let HostEvent::Key(key) = event {
                    typed.extend(runtime::typing_input(key));
                }
                continue;
            }
            if self.on_event(event, area) == Flow::Quit {
                return Flow::Quit;
            }
        }

        if self.state == AppState::Typing {
            // time spent on the setup screen does not count
            let dt = if std::mem::take(&mut self.fresh_start) {
                0.0
            } else {
                frame.dt
            };
            let transition = self.session.tick(&typed, dt);
            self.on_transition(transition);
        }
        Flow::Continue
    }

    fn on_transition(&mut self, transition: Transition) {
        for effect in transition.effects {
            match effect {
                SideEffect::PassageAdvanced { .. } => {}
                SideEffect::Completed(summary) => {
                    self.last_record = self.recorder.record(&self.config.username, &summary);
                    self.last_summary = Some(summary);
                    self.state = AppState::Results;
                }
                SideEffect::Aborted => {
                    self.state = AppState::Setup;
                }
            }
        }
    }

    fn on_event(&mut self, event: &HostEvent, area: Rect) -> Flow {
        match event {
            HostEvent::Key(key) if key.kind != KeyEventKind::Release => match self.state {
                AppState::Setup => return self.on_setup_key(key),
                AppState::Editor => self.on_editor_key(key, area),
                AppState::Results => self.on_results_key(key),
                AppState::History => self.on_history_key(key),
                AppState::Typing => {}
            },
            HostEvent::Mouse(mouse) if self.state == AppState::Editor => {
                if let Some(pointer) = runtime::pointer_input(mouse) {
                    self.on_editor_pointer(pointer, area);
                }
            }
            HostEvent::Resize if self.state == AppState::Editor => {
                let layout = self.editor_layout(area);
                self.editor.clamp_scroll(&layout);
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_setup_key(&mut self, key: &KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Up => {
                self.setup_field =
                    (self.setup_field + SetupField::ALL.len() - 1) % SetupField::ALL.len();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.setup_field = (self.setup_field + 1) % SetupField::ALL.len();
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                match self.selected_field() {
                    SetupField::Duration => self.config.duration = self.config.duration.next(),
                    SetupField::Difficulty => {
                        self.config.difficulty = self.config.difficulty.next()
                    }
                    SetupField::Mode => self.config.custom_mode = !self.config.custom_mode,
                }
                self.message = None;
                self.save_config();
            }
            KeyCode::Enter => self.start_session(),
            KeyCode::Char('e') => {
                self.message = None;
                self.state = AppState::Editor;
            }
            KeyCode::Char('h') => self.open_history(),
            _ => {}
        }
        Flow::Continue
    }

    pub fn editor_layout(&self, area: Rect) -> EditorLayout {
        let inner = ui::editor_area(area);
        // last column holds the caret after a full line
        let width = inner.width.saturating_sub(1).max(1);
        self.editor
            .layout(Viewport::cells(width, inner.height), &CellMeasure)
    }

    fn on_editor_key(&mut self, key: &KeyEvent, area: Rect) {
        if key.code == KeyCode::Esc {
            self.config.custom_passage = self.editor.text();
            self.config.custom_mode = !self.editor.is_empty();
            self.save_config();
            self.state = AppState::Setup;
            return;
        }
        if let Some(command) = runtime::edit_command(key) {
            if self.editor.apply(command, self.clipboard.as_mut()) {
                let layout = self.editor_layout(area);
                self.editor.follow_caret(&layout);
            }
        }
    }

    fn on_editor_pointer(&mut self, pointer: PointerInput, area: Rect) {
        let inner = ui::editor_area(area);
        let layout = self.editor_layout(area);
        let local = |column: u16, row: u16| {
            (
                column as f32 - inner.x as f32,
                row as f32 - inner.y as f32,
            )
        };

        match pointer {
            PointerInput::Press { column, row } => {
                let (x, y) = local(column, row);
                if x >= 0.0 && y >= 0.0 && x < inner.width as f32 && y < inner.height as f32 {
                    self.editor.press_at(x, y, &layout, &CellMeasure);
                }
            }
            PointerInput::Drag { column, row } => {
                let (x, y) = local(column, row);
                self.editor.drag_to(x, y, &layout, &CellMeasure);
            }
            PointerInput::WheelUp => self.editor.scroll_by(-WHEEL_STEP_LINES, &layout),
            PointerInput::WheelDown => self.editor.scroll_by(WHEEL_STEP_LINES, &layout),
        }
    }

    fn on_results_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('r') => self.start_session(),
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::Setup,
            _ => {}
        }
    }

    fn on_history_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Up => self.history_scroll = self.history_scroll.saturating_sub(1),
            KeyCode::Down => {
                if self.history_scroll + 1 < self.history.len() {
                    self.history_scroll += 1;
                }
            }
            KeyCode::Home => self.history_scroll = 0,
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => {
                self.state = AppState::Setup
            }
            _ => {}
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let env = env_logger::Env::new().filter_or("TYPEMASTER_LOG", "warn");
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn print_stats(config: &Config) {
    let recorder = Recorder::new(history_store(config));
    let records = recorder.load(&config.username);
    let stats = history::aggregate(&records);

    println!("User: {}", config.username);
    println!("Tests: {}", stats.total_tests);
    println!("Average WPM: {:.1}", stats.avg_wpm);
    println!("Average accuracy: {:.2}%", stats.avg_accuracy);
    println!("Best WPM: {}", stats.best_wpm);
    for record in records.iter().take(RECENT_RECORDS) {
        println!(
            "{}  {:>3} wpm  {:>6.2}%  {}s  level {}",
            record.date.format(history::DATE_FORMAT),
            record.wpm,
            record.accuracy,
            record.duration_secs,
            record.difficulty_level
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);

    if cli.stats {
        print_stats(&config);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(config, Box::new(config_store), Box::new(SystemClipboard::new()));
    if cli.prompt.is_some() {
        app.start_session();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
        SystemClock::new(),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let frame = runner.step();
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        if app.on_frame(&frame, area) == Flow::Quit {
            break;
        }
    }

    Ok(())
}
