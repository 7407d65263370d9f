use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// Substituted when a tier has nothing to type, so a session always has a passage.
pub const NO_PASSAGES: &str = "Error: No passages found.";

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
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Numeric level as written to the history log.
    pub fn level(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.level() == level)
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy.txt",
            Difficulty::Medium => "medium.txt",
            Difficulty::Hard => "hard.txt",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

/// One block of reference text, indexed by character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    text: String,
    chars: Vec<char>,
}

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn sentinel() -> Self {
        Self::new(NO_PASSAGES)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// What the user picked on the setup screen.
#[derive(Debug, Clone, PartialEq)]
pub enum PassageChoice {
    Level(Difficulty),
    Custom(String),
}

pub trait PassageSource {
    /// Ordered passages for one session. Never empty.
    fn load(&self, choice: &PassageChoice) -> Vec<Passage>;
}

/// Where tier files come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PassageLibrary {
    /// `<dir>/easy.txt`, `<dir>/medium.txt`, `<dir>/hard.txt`
    Directory(PathBuf),
    /// Tier files compiled into the binary.
    #[default]
    Bundled,
}

impl PassageLibrary {
    pub fn load_with_rng<R: Rng + ?Sized>(
        &self,
        choice: &PassageChoice,
        rng: &mut R,
    ) -> Vec<Passage> {
        let mut passages = match choice {
            PassageChoice::Custom(text) => vec![Passage::new(text.clone())],
            PassageChoice::Level(difficulty) => {
                let mut lines = self
                    .tier_contents(*difficulty)
                    .map(|contents| passage_lines(&contents))
                    .unwrap_or_default();
                lines.shuffle(rng);
                lines.into_iter().map(Passage::new).collect()
            }
        };

        if passages.is_empty() {
            warn!("no passages available for {:?}, using placeholder", choice);
            passages.push(Passage::sentinel());
        }

        debug!("loaded {} passage(s)", passages.len());
        passages
    }

    fn tier_contents(&self, difficulty: Difficulty) -> Option<String> {
        match self {
            PassageLibrary::Directory(dir) => {
                let path = dir.join(difficulty.file_name());
                match fs::read_to_string(&path) {
                    Ok(contents) => Some(contents),
                    Err(e) => {
                        warn!("cannot read passage file {}: {}", path.display(), e);
                        None
                    }
                }
            }
            PassageLibrary::Bundled => PASSAGE_DIR
                .get_file(difficulty.file_name())
                .and_then(|file| file.contents_utf8())
                .map(str::to_owned),
        }
    }
}

impl PassageSource for PassageLibrary {
    fn load(&self, choice: &PassageChoice) -> Vec<Passage> {
        self.load_with_rng(choice, &mut rand::thread_rng())
    }
}

/// Non-blank lines of a passage file, in file order.
pub fn passage_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}
