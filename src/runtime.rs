use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use log::warn;

use crate::editor::EditCommand;
use crate::session::InputEvent;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait EventSource {
    /// Block for up to `timeout` for the first event, then take everything already pending.
    /// An empty batch means the timeout expired.
    fn drain(&mut self, timeout: Duration) -> Vec<HostEvent>;
}

fn host_event(ev: CtEvent) -> Option<HostEvent> {
    match ev {
        CtEvent::Key(key) => Some(HostEvent::Key(key)),
        CtEvent::Mouse(mouse) => Some(HostEvent::Mouse(mouse)),
        CtEvent::Resize(_, _) => Some(HostEvent::Resize),
        _ => None,
    }
}

/// Production event source polling crossterm on the calling thread
#[derive(Debug, Default)]
pub struct CrosstermEventSource;

impl CrosstermEventSource {
    pub fn new() -> Self {
        Self
    }

    fn next(&self, timeout: Duration) -> Option<CtEvent> {
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(ev) => Some(ev),
                Err(e) => {
                    warn!("failed to read terminal event: {}", e);
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                warn!("failed to poll terminal events: {}", e);
                None
            }
        }
    }
}

impl EventSource for CrosstermEventSource {
    fn drain(&mut self, timeout: Duration) -> Vec<HostEvent> {
        let mut events = Vec::new();
        let mut wait = timeout;
        while let Some(ev) = self.next(wait) {
            events.extend(host_event(ev));
            wait = Duration::ZERO;
        }
        events
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<HostEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<HostEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn drain(&mut self, timeout: Duration) -> Vec<HostEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(first) => std::iter::once(first).chain(self.rx.try_iter()).collect(),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }
}

/// Configurable ticker interface
pub trait Ticker {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Seconds elapsed since the previous frame.
pub trait FrameClock {
    fn delta_time(&mut self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Forget the time spent outside the frame loop, e.g. on the setup screen.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn delta_time(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        dt
    }
}

/// Clock that reports the same delta every frame.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    dt: f64,
}

impl FixedClock {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }
}

impl FrameClock for FixedClock {
    fn delta_time(&mut self) -> f64 {
        self.dt
    }
}

/// Everything that happened since the previous frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub events: Vec<HostEvent>,
    pub dt: f64,
}

/// Runner that advances the application one frame at a time
pub struct Runner<E: EventSource, T: Ticker, C: FrameClock> {
    event_source: E,
    ticker: T,
    clock: C,
}

impl<E: EventSource, T: Ticker, C: FrameClock> Runner<E, T, C> {
    pub fn new(event_source: E, ticker: T, clock: C) -> Self {
        Self {
            event_source,
            ticker,
            clock,
        }
    }

    /// Blocks up to one tick interval, then returns the batched events and the frame time.
    pub fn step(&mut self) -> Frame {
        let events = self.event_source.drain(self.ticker.interval());
        let dt = self.clock.delta_time();
        Frame { events, dt }
    }
}

fn is_press(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
}

fn has_command_modifier(key: &KeyEvent) -> bool {
    key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

/// Translate a key on the typing screen.
pub fn typing_input(key: &KeyEvent) -> Option<InputEvent> {
    if !is_press(key) {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if !has_command_modifier(key) => Some(InputEvent::Char(c)),
        KeyCode::Backspace => Some(InputEvent::Backspace),
        KeyCode::Enter => Some(InputEvent::Finish),
        KeyCode::Esc => Some(InputEvent::Abort),
        _ => None,
    }
}

/// Translate a key on the custom passage editor.
pub fn edit_command(key: &KeyEvent) -> Option<EditCommand> {
    if !is_press(key) {
        return None;
    }
    let extend = key.modifiers.contains(KeyModifiers::SHIFT);
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('a') => Some(EditCommand::SelectAll),
            KeyCode::Char('c') => Some(EditCommand::Copy),
            KeyCode::Char('v') => Some(EditCommand::Paste),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(c) if !has_command_modifier(key) => Some(EditCommand::Insert(c)),
        KeyCode::Backspace => Some(EditCommand::Backspace),
        KeyCode::Delete => Some(EditCommand::Delete),
        KeyCode::Left => Some(EditCommand::Left { extend }),
        KeyCode::Right => Some(EditCommand::Right { extend }),
        _ => None,
    }
}

/// Mouse input in terminal cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInput {
    Press { column: u16, row: u16 },
    Drag { column: u16, row: u16 },
    WheelUp,
    WheelDown,
}

/// Ctrl+C leaves the application from any screen.
pub fn is_quit(key: &KeyEvent) -> bool {
    is_press(key)
        && key.code == KeyCode::Char('c')
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

pub fn pointer_input(mouse: &MouseEvent) -> Option<PointerInput> {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerInput::Press { column, row }),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerInput::Drag { column, row }),
        MouseEventKind::ScrollUp => Some(PointerInput::WheelUp),
        MouseEventKind::ScrollDown => Some(PointerInput::WheelDown),
        _ => None,
    }
}
