//! Typing history: an append-only plain text log of finished tests.
//!
//! Each record is a block of `Label: value` lines closed by a line of dashes:
//!
//! ```text
//! User: alice
//! Date: 2024-03-01 09:30:00
//! WPM: 52
//! Accuracy: 96.40%
//! Duration: 60 seconds
//! Difficulty: 2
//! ------------------------
//! ```

use crate::config::normalize_username;
use crate::passage::Difficulty;
use crate::session::SessionSummary;
use crate::util;
use chrono::{Local, NaiveDateTime, Timelike};
use itertools::Itertools;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TERMINATOR: &str = "------------------------";

const USER: &str = "User:";
const DATE: &str = "Date:";
const WPM: &str = "WPM:";
const ACCURACY: &str = "Accuracy:";
const DURATION: &str = "Duration:";
const DIFFICULTY: &str = "Difficulty:";

#[derive(Debug, Clone, PartialEq)]
pub struct TypingRecord {
    pub username: String,
    pub date: NaiveDateTime,
    pub wpm: u32,
    pub accuracy: f64,
    pub duration_secs: u32,
    pub difficulty_level: u8,
}

impl TypingRecord {
    pub fn from_summary(username: &str, summary: &SessionSummary, date: NaiveDateTime) -> Self {
        Self {
            username: username.to_owned(),
            date,
            wpm: summary.wpm,
            accuracy: util::round_to(summary.accuracy, 2),
            duration_secs: summary.duration_secs,
            difficulty_level: summary.difficulty.level(),
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        Difficulty::from_level(self.difficulty_level)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub total_tests: usize,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
    pub best_wpm: u32,
}

pub fn aggregate(records: &[TypingRecord]) -> Statistics {
    let wpms: Vec<f64> = records.iter().map(|r| r.wpm as f64).collect();
    let accuracies: Vec<f64> = records.iter().map(|r| r.accuracy).collect();

    Statistics {
        total_tests: records.len(),
        avg_wpm: util::mean(&wpms).unwrap_or(0.0),
        avg_accuracy: util::mean(&accuracies).unwrap_or(0.0),
        best_wpm: records.iter().map(|r| r.wpm).max().unwrap_or(0),
    }
}

/// Why a block could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    MissingField(&'static str),
    InvalidField { field: &'static str, value: String },
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRecord::MissingField(field) => write!(f, "missing field {}", field),
            MalformedRecord::InvalidField { field, value } => {
                write!(f, "invalid value for {} {:?}", field, value)
            }
        }
    }
}

impl Error for MalformedRecord {}

pub fn encode(record: &TypingRecord) -> String {
    format!(
        "{} {}\n{} {}\n{} {}\n{} {:.2}%\n{} {} seconds\n{} {}\n{}\n",
        USER,
        record.username,
        DATE,
        record.date.format(DATE_FORMAT),
        WPM,
        record.wpm,
        ACCURACY,
        record.accuracy,
        DURATION,
        record.duration_secs,
        DIFFICULTY,
        record.difficulty_level,
        TERMINATOR
    )
}

fn is_terminator(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-')
}

fn starts_record(line: &str) -> bool {
    line.trim_start().starts_with(USER)
}

fn field<'a>(lines: &[&'a str], label: &'static str) -> Result<&'a str, MalformedRecord> {
    lines
        .iter()
        .find_map(|line| line.trim_start().strip_prefix(label))
        .map(str::trim)
        .ok_or(MalformedRecord::MissingField(label))
}

fn parse_field<T: std::str::FromStr>(
    label: &'static str,
    value: &str,
) -> Result<T, MalformedRecord> {
    value.parse().map_err(|_| MalformedRecord::InvalidField {
        field: label,
        value: value.to_owned(),
    })
}

/// Decode the field lines of one block, terminator excluded.
pub fn decode_block(lines: &[&str]) -> Result<TypingRecord, MalformedRecord> {
    let username = field(lines, USER)?;
    if username.is_empty() {
        return Err(MalformedRecord::InvalidField {
            field: USER,
            value: String::new(),
        });
    }

    let date_raw = field(lines, DATE)?;
    let date = NaiveDateTime::parse_from_str(date_raw, DATE_FORMAT).map_err(|_| {
        MalformedRecord::InvalidField {
            field: DATE,
            value: date_raw.to_owned(),
        }
    })?;

    let wpm = parse_field(WPM, field(lines, WPM)?)?;

    let accuracy_raw = field(lines, ACCURACY)?;
    let accuracy = parse_field(
        ACCURACY,
        accuracy_raw.strip_suffix('%').unwrap_or(accuracy_raw).trim_end(),
    )?;

    let duration_raw = field(lines, DURATION)?;
    let duration_secs = parse_field(
        DURATION,
        duration_raw
            .strip_suffix("seconds")
            .unwrap_or(duration_raw)
            .trim_end(),
    )?;

    let difficulty_level = parse_field(DIFFICULTY, field(lines, DIFFICULTY)?)?;

    Ok(TypingRecord {
        username: username.to_owned(),
        date,
        wpm,
        accuracy,
        duration_secs,
        difficulty_level,
    })
}

/// Decode a whole log. Malformed blocks are skipped; a block without terminator is dropped,
/// including one cut short by the next `User:` line.
pub fn decode_all(contents: &str) -> Vec<TypingRecord> {
    let mut records = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in contents.lines() {
        if starts_record(line) && block.iter().any(|l| !l.trim().is_empty()) {
            debug!("dropping unterminated history block");
            block.clear();
        }
        if !is_terminator(line) {
            block.push(line);
            continue;
        }
        match decode_block(&block) {
            Ok(record) => records.push(record),
            Err(e) => debug!("skipping history block: {}", e),
        }
        block.clear();
    }

    if block.iter().any(|line| !line.trim().is_empty()) {
        debug!("dropping unterminated history block");
    }
    records
}

pub trait HistoryStore {
    fn append(&mut self, record: &TypingRecord) -> io::Result<()>;
    fn load_all(&self) -> io::Result<Vec<TypingRecord>>;
}

#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl HistoryStore for FileHistoryStore {
    fn append(&mut self, record: &TypingRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(encode(record).as_bytes())
    }

    fn load_all(&self) -> io::Result<Vec<TypingRecord>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(decode_all(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    records: Vec<TypingRecord>,
}

impl MemoryHistoryStore {
    pub fn records(&self) -> &[TypingRecord] {
        &self.records
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&mut self, record: &TypingRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> io::Result<Vec<TypingRecord>> {
        Ok(self.records.clone())
    }
}

/// Writes finished sessions to a [`HistoryStore`] and reads them back per user.
#[derive(Debug)]
pub struct Recorder<S: HistoryStore> {
    store: S,
}

impl<S: HistoryStore> Recorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stamp the summary with the local time and append it.
    pub fn record(&mut self, username: &str, summary: &SessionSummary) -> Option<TypingRecord> {
        let now = Local::now().naive_local();
        // the log keeps whole seconds
        let now = now.with_nanosecond(0).unwrap_or(now);
        self.record_at(username, summary, now)
    }

    /// Returns the written record, or `None` if the store refused it.
    pub fn record_at(
        &mut self,
        username: &str,
        summary: &SessionSummary,
        date: NaiveDateTime,
    ) -> Option<TypingRecord> {
        let username = normalize_username(username);
        let record = TypingRecord::from_summary(&username, summary, date);
        match self.store.append(&record) {
            Ok(()) => {
                info!("recorded {} wpm for {}", record.wpm, record.username);
                Some(record)
            }
            Err(e) => {
                warn!("failed to write history record: {}", e);
                None
            }
        }
    }

    /// The user's records, newest first.
    pub fn load(&self, username: &str) -> Vec<TypingRecord> {
        let username = normalize_username(username);
        let all = match self.store.load_all() {
            Ok(records) => records,
            Err(e) => {
                warn!("failed to read history: {}", e);
                Vec::new()
            }
        };

        all.into_iter()
            .filter(|r| r.username == username)
            .sorted_by(|a, b| b.date.cmp(&a.date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record(user: &str, date: NaiveDateTime, wpm: u32) -> TypingRecord {
        TypingRecord {
            username: user.into(),
            date,
            wpm,
            accuracy: 95.5,
            duration_secs: 60,
            difficulty_level: 1,
        }
    }

    fn summary(wpm: u32, accuracy: f64) -> SessionSummary {
        SessionSummary {
            wpm,
            accuracy,
            correct_chars: 0,
            total_chars: 0,
            duration_secs: 60,
            elapsed_secs: 60.0,
            difficulty: Difficulty::Medium,
            passages_completed: 0,
        }
    }

    #[test]
    fn encode_layout() {
        let text = encode(&record("alice", at(1, 9), 52));
        assert_eq!(
            text,
            "User: alice\nDate: 2024-03-01 09:00:00\nWPM: 52\nAccuracy: 95.50%\n\
             Duration: 60 seconds\nDifficulty: 1\n------------------------\n"
        );
    }

    #[test]
    fn decode_encoded_block() {
        let original = record("bob", at(2, 10), 61);
        let decoded = decode_all(&encode(&original));
        assert_eq!(decoded, vec![original]);
    }

    #[test]
    fn decode_tolerates_missing_percent_and_unknown_lines() {
        let log = "User: carol\nNote: hello\nDate: 2024-03-05 12:00:00\nWPM: 40\n\
                   Accuracy: 88.5\nDuration: 30 seconds\nDifficulty: 3\n-----\n";
        let records = decode_all(log);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].accuracy, 88.5);
        assert_eq!(records[0].duration_secs, 30);
        assert_eq!(records[0].difficulty(), Some(Difficulty::Hard));
    }

    #[test]
    fn decode_block_reports_missing_field() {
        let lines = ["User: dave", "Date: 2024-03-05 12:00:00"];
        assert_matches!(decode_block(&lines), Err(MalformedRecord::MissingField(WPM)));
    }

    #[test]
    fn decode_block_reports_bad_value() {
        let lines = [
            "User: dave",
            "Date: yesterday",
            "WPM: 1",
            "Accuracy: 1%",
            "Duration: 1 seconds",
            "Difficulty: 1",
        ];
        assert_matches!(
            decode_block(&lines),
            Err(MalformedRecord::InvalidField { field: DATE, .. })
        );
    }

    #[test]
    fn malformed_block_does_not_affect_neighbours() {
        let mut log = encode(&record("a", at(1, 1), 10));
        log.push_str(
            "User: a\nDate: 2024-03-01 02:00:00\nWPM: fast\nAccuracy: 1%\n\
             Duration: 60 seconds\nDifficulty: 1\n------------------------\n",
        );
        log.push_str(&encode(&record("a", at(1, 3), 30)));

        let records = decode_all(&log);
        assert_eq!(records.iter().map(|r| r.wpm).collect::<Vec<_>>(), vec![10, 30]);
    }

    #[test]
    fn unterminated_trailing_block_is_dropped() {
        let mut log = encode(&record("a", at(1, 1), 10));
        log.push_str("User: a\nDate: 2024-03-01 02:00:00\nWPM: 20\n");
        assert_eq!(decode_all(&log).len(), 1);
    }

    #[test]
    fn torn_block_does_not_merge_into_next_record() {
        let mut log = String::from("User: alice\nDate: 2024-01-01 00:00:00\n");
        log.push_str(&encode(&record("bob", at(2, 10), 77)));

        let records = decode_all(&log);
        assert_eq!(records, vec![record("bob", at(2, 10), 77)]);
    }

    #[test]
    fn torn_block_between_complete_records() {
        let mut log = encode(&record("alice", at(1, 1), 10));
        log.push_str("User: alice\nDate: 2024-03-01 02:00:00\nWPM: 20\nAcc");
        log.push('\n');
        log.push_str(&encode(&record("carol", at(1, 3), 30)));

        let users: Vec<String> = decode_all(&log).into_iter().map(|r| r.username).collect();
        assert_eq!(users, vec!["alice", "carol"]);
    }

    #[test]
    fn aggregate_empty_is_zero() {
        assert_eq!(aggregate(&[]), Statistics::default());
    }

    #[test]
    fn aggregate_three_records() {
        let records = vec![
            record("a", at(1, 1), 40),
            record("a", at(1, 2), 60),
            record("a", at(1, 3), 50),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.avg_wpm, 50.0);
        assert_eq!(stats.best_wpm, 60);
        assert_eq!(stats.avg_accuracy, 95.5);
    }

    #[test]
    fn record_rounds_accuracy() {
        let mut recorder = Recorder::new(MemoryHistoryStore::default());
        let written = recorder
            .record_at("alice", &summary(42, 93.756), at(4, 8))
            .unwrap();
        assert_eq!(written.accuracy, 93.76);
        assert_eq!(written.difficulty_level, 2);
        assert_eq!(recorder.store().records(), &[written]);
    }

    #[test]
    fn load_filters_and_sorts_newest_first() {
        let mut store = MemoryHistoryStore::default();
        store.append(&record("alice", at(1, 1), 10)).unwrap();
        store.append(&record("bob", at(2, 1), 99)).unwrap();
        store.append(&record("alice", at(3, 1), 30)).unwrap();
        store.append(&record("alice", at(2, 1), 20)).unwrap();

        let recorder = Recorder::new(store);
        let wpms: Vec<u32> = recorder.load("alice").iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![30, 20, 10]);
        assert!(recorder.load("nobody").is_empty());
    }

    #[test]
    fn padded_or_blank_names_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let mut recorder = Recorder::new(FileHistoryStore::with_path(&path));
        let names = [" bob", "bob ", "", "eve\nUser: mallory"];
        for (written, name) in names.iter().enumerate() {
            assert!(recorder.record(name, &summary(30, 90.0)).is_some());
            assert!(!recorder.load(name).is_empty(), "name {:?}", name);
            let contents = fs::read_to_string(&path).unwrap();
            assert_eq!(decode_all(&contents).len(), written + 1);
        }
        assert!(recorder.load("bob").len() >= 2);
        assert!(recorder.load("mallory").is_empty());
    }

    #[test]
    fn load_keeps_file_order_for_equal_dates() {
        let mut store = MemoryHistoryStore::default();
        store.append(&record("a", at(1, 1), 1)).unwrap();
        store.append(&record("a", at(1, 1), 2)).unwrap();
        let recorder = Recorder::new(store);
        let wpms: Vec<u32> = recorder.load("a").iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![1, 2]);
    }

    #[test]
    fn file_store_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.txt");
        let mut store = FileHistoryStore::with_path(&path);
        assert!(store.load_all().unwrap().is_empty());

        store.append(&record("a", at(1, 1), 10)).unwrap();
        store.append(&record("a", at(1, 2), 20)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches(TERMINATOR).count(), 2);
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn failed_write_drops_record() {
        let dir = tempdir().unwrap();
        // a directory where the log file should be
        let mut recorder = Recorder::new(FileHistoryStore::with_path(dir.path()));
        assert_eq!(recorder.record("a", &summary(10, 100.0)), None);
        assert!(recorder.load("a").is_empty());
    }
}
