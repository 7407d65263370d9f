//! Timed typing session.
//!
//! A session is driven by a single transition function, [`Session::tick`], called once
//! per frame with every input event gathered since the previous frame and the elapsed
//! frame time. Results leave the session as [`SideEffect`]s; persisting them is the
//! caller's job.

use crate::metrics;
use crate::passage::{Difficulty, Passage, PassageChoice, PassageSource};
use crate::typing_policy::{self, KeyEffect, Leg, Tally};
use clap::ValueEnum;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
pub enum TestDuration {
    #[value(name = "30")]
    #[strum(serialize = "30s")]
    Secs30,
    #[default]
    #[value(name = "60")]
    #[strum(serialize = "60s")]
    Secs60,
    #[value(name = "180")]
    #[strum(serialize = "180s")]
    Secs180,
}

impl TestDuration {
    pub fn secs(&self) -> u32 {
        match self {
            TestDuration::Secs30 => 30,
            TestDuration::Secs60 => 60,
            TestDuration::Secs180 => 180,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TestDuration::Secs30 => TestDuration::Secs60,
            TestDuration::Secs60 => TestDuration::Secs180,
            TestDuration::Secs180 => TestDuration::Secs30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionConfig {
    pub duration: TestDuration,
    pub difficulty: Difficulty,
    /// `Some` selects custom mode with this passage.
    pub custom_passage: Option<String>,
}

impl SessionConfig {
    pub fn choice(&self) -> PassageChoice {
        match &self.custom_passage {
            Some(text) => PassageChoice::Custom(text.clone()),
            None => PassageChoice::Level(self.difficulty),
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        match &self.custom_passage {
            Some(text) if text.trim().is_empty() => Err(SessionError::EmptyCustomPassage),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    EmptyCustomPassage,
    AlreadyStarted,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyCustomPassage => write!(f, "custom passage is empty"),
            SessionError::AlreadyStarted => write!(f, "session has already started"),
        }
    }
}

impl Error for SessionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Input already decoded from the host's key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Backspace,
    /// End the test now and keep the result.
    Finish,
    /// Leave without recording anything.
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub wpm: u32,
    pub accuracy: f64,
    pub correct_chars: usize,
    pub total_chars: usize,
    pub duration_secs: u32,
    pub elapsed_secs: f64,
    pub difficulty: Difficulty,
    pub passages_completed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    PassageAdvanced { index: usize },
    Completed(SessionSummary),
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub phase: Phase,
    pub effects: Vec<SideEffect>,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    phase: Phase,
    remaining_secs: f64,
    passages: Vec<Passage>,
    passage_index: usize,
    leg: Leg,
    tally: Tally,
    current_wpm: u32,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let remaining_secs = config.duration.secs() as f64;
        Self {
            config,
            phase: Phase::Idle,
            remaining_secs,
            passages: Vec::new(),
            passage_index: 0,
            leg: Leg::default(),
            tally: Tally::default(),
            current_wpm: 0,
        }
    }

    /// Validate the configuration, load passages and start the countdown.
    pub fn start(&mut self, source: &dyn PassageSource) -> Result<(), SessionError> {
        self.ensure_startable()?;
        let passages = source.load(&self.config.choice());
        self.start_with(passages)
    }

    /// Start with passages loaded by the caller.
    pub fn start_with(&mut self, mut passages: Vec<Passage>) -> Result<(), SessionError> {
        self.ensure_startable()?;
        if passages.is_empty() {
            passages.push(Passage::sentinel());
        }

        info!(
            "session started: {} passage(s), {}, {}",
            passages.len(),
            self.config.duration,
            self.config.difficulty
        );
        self.passages = passages;
        self.passage_index = 0;
        self.leg.reset();
        self.tally = Tally::default();
        self.current_wpm = 0;
        self.remaining_secs = self.config.duration.secs() as f64;
        self.phase = Phase::Running;
        Ok(())
    }

    fn ensure_startable(&self) -> Result<(), SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        self.config.validate()
    }

    /// Advance one frame: apply `events` in order, then run the clock by `dt` seconds.
    pub fn tick(&mut self, events: &[InputEvent], dt: f64) -> Transition {
        let mut effects = Vec::new();

        for event in events {
            if self.phase != Phase::Running {
                break;
            }
            self.handle(*event, &mut effects);
        }

        if self.phase == Phase::Running {
            self.remaining_secs = (self.remaining_secs - dt.max(0.0)).max(0.0);
            if self.remaining_secs <= 0.0 {
                debug!("time is up");
                self.complete(&mut effects);
            }
        }

        Transition {
            phase: self.phase,
            effects,
        }
    }

    fn handle(&mut self, event: InputEvent, effects: &mut Vec<SideEffect>) {
        match event {
            InputEvent::Char(c) => {
                let Some(passage) = self.passages.get(self.passage_index) else {
                    return;
                };
                let effect = typing_policy::apply_char(&mut self.leg, &mut self.tally, passage, c);
                if effect != KeyEffect::Ignored {
                    self.update_wpm();
                    self.advance_if_complete(effects);
                }
            }
            InputEvent::Backspace => {
                let Some(passage) = self.passages.get(self.passage_index) else {
                    return;
                };
                let effect =
                    typing_policy::apply_backspace(&mut self.leg, &mut self.tally, passage);
                if effect != KeyEffect::Ignored {
                    self.update_wpm();
                }
            }
            InputEvent::Finish => self.complete(effects),
            InputEvent::Abort => {
                info!("session aborted");
                self.phase = Phase::Aborted;
                effects.push(SideEffect::Aborted);
            }
        }
    }

    fn advance_if_complete(&mut self, effects: &mut Vec<SideEffect>) {
        let Some(passage) = self.passages.get(self.passage_index) else {
            return;
        };
        if !self.leg.is_complete(passage) {
            return;
        }

        self.passage_index += 1;
        self.leg.reset();
        if self.passage_index < self.passages.len() {
            debug!("advancing to passage {}", self.passage_index);
            effects.push(SideEffect::PassageAdvanced {
                index: self.passage_index,
            });
        } else {
            debug!("all passages typed");
            self.complete(effects);
        }
    }

    fn complete(&mut self, effects: &mut Vec<SideEffect>) {
        self.phase = Phase::Completed;
        let summary = self.summary();
        info!(
            "session completed: {} wpm, {:.1}% accuracy",
            summary.wpm, summary.accuracy
        );
        effects.push(SideEffect::Completed(summary));
    }

    fn update_wpm(&mut self) {
        self.current_wpm = metrics::wpm(self.tally.correct_chars, self.elapsed_secs());
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            wpm: metrics::wpm(self.tally.correct_chars, self.elapsed_secs()),
            accuracy: self.accuracy(),
            correct_chars: self.tally.correct_chars,
            total_chars: self.tally.total_chars,
            duration_secs: self.config.duration.secs(),
            elapsed_secs: self.elapsed_secs(),
            difficulty: self.config.difficulty,
            passages_completed: self.passage_index,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.config.duration.secs() as f64 - self.remaining_secs
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn passage_index(&self) -> usize {
        self.passage_index
    }

    pub fn current_passage(&self) -> Option<&Passage> {
        self.passages.get(self.passage_index)
    }

    pub fn input(&self) -> &[char] {
        &self.leg.input
    }

    /// Correct characters typed against the current passage.
    pub fn progress(&self) -> usize {
        self.leg.progress
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn current_wpm(&self) -> u32 {
        self.current_wpm
    }

    pub fn accuracy(&self) -> f64 {
        metrics::accuracy(self.tally.correct_chars, self.tally.total_chars)
    }
}
