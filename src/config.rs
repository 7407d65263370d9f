use crate::passage::Difficulty;
use crate::session::{SessionConfig, TestDuration};
use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub username: String,
    pub duration: TestDuration,
    pub difficulty: Difficulty,
    pub custom_mode: bool,
    pub custom_passage: String,
    /// Directory holding `easy.txt`, `medium.txt` and `hard.txt`; bundled passages when unset.
    pub passage_dir: Option<PathBuf>,
    /// History log location; the state dir when unset.
    pub history_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: default_username(),
            duration: TestDuration::Secs60,
            difficulty: Difficulty::Easy,
            custom_mode: false,
            custom_passage: String::new(),
            passage_dir: None,
            history_path: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            duration: self.duration,
            difficulty: self.difficulty,
            custom_passage: self.custom_mode.then(|| self.custom_passage.clone()),
        }
    }
}

fn clean_username(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn default_username() -> String {
    std::env::var("USER")
        .ok()
        .and_then(|u| clean_username(&u))
        .unwrap_or_else(|| "guest".to_string())
}

/// The name as it is stored in the history log: one line, no surrounding whitespace,
/// falling back to the login name when nothing is left.
pub fn normalize_username(raw: &str) -> String {
    clean_username(raw).unwrap_or_else(default_username)
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typemaster") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typemaster_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(mut cfg) => {
                    cfg.username = normalize_username(&cfg.username);
                    return cfg;
                }
                Err(e) => warn!("ignoring unreadable config {}: {}", self.path.display(), e),
            },
            Err(e) => debug!("no config at {}: {}", self.path.display(), e),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            username: "alice".into(),
            duration: TestDuration::Secs180,
            difficulty: Difficulty::Hard,
            custom_mode: true,
            custom_passage: "my own words".into(),
            passage_dir: Some(PathBuf::from("/tmp/passages")),
            history_path: Some(PathBuf::from("/tmp/history.txt")),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_gives_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "username": "bob", "difficulty": "Medium" }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.username, "bob");
        assert_eq!(cfg.difficulty, Difficulty::Medium);
        assert_eq!(cfg.duration, TestDuration::Secs60);
    }

    #[test]
    fn username_is_trimmed_to_one_line() {
        assert_eq!(normalize_username("  bob "), "bob");
        assert_eq!(normalize_username("bob\nWPM: 999"), "bob WPM: 999");
        assert_eq!(normalize_username(""), default_username());
        assert_eq!(normalize_username(" \t\n"), default_username());
        assert!(!default_username().is_empty());
    }

    #[test]
    fn blank_stored_username_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "username": "  " }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.username, default_username());
    }

    #[test]
    fn session_config_follows_custom_mode() {
        let mut cfg = Config {
            custom_passage: "text".into(),
            ..Config::default()
        };
        assert_eq!(cfg.session_config().custom_passage, None);
        cfg.custom_mode = true;
        assert_eq!(cfg.session_config().custom_passage.as_deref(), Some("text"));
    }
}
