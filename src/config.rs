use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::problem::{Difficulty, Topic};
use crate::session::{clamp_timer, Pacing, SessionConfig, DEFAULT_TIMER_SECS};

/// Host preferences remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub timer_secs: u32,
    pub countdown_secs: u32,
    pub answer_delay_ms: u64,
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: Topic::Add,
            difficulty: Difficulty::Easy,
            timer_secs: DEFAULT_TIMER_SECS,
            countdown_secs: 3,
            answer_delay_ms: 600,
            sound: true,
        }
    }
}

impl Config {
    /// Bring out-of-range values back into bounds
    pub fn normalized(mut self) -> Self {
        self.timer_secs = clamp_timer(self.timer_secs);
        self.countdown_secs = self.countdown_secs.min(10);
        self.answer_delay_ms = self.answer_delay_ms.min(5_000);
        self
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig::new(self.topic, self.difficulty, self.timer_secs)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            countdown_secs: self.countdown_secs,
            answer_delay: Duration::from_millis(self.answer_delay_ms),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mathdash_config.json")),
        }
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
    /// Missing or unreadable files fall back to defaults
    fn load(&self) -> Config {
        let loaded = fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Config>(&bytes).ok());
        match loaded {
            Some(cfg) => cfg.normalized(),
            None => {
                debug!(path = %self.path.display(), "no usable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(cfg)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            topic: Topic::CubeRoot,
            difficulty: Difficulty::Expert,
            timer_secs: 120,
            countdown_secs: 0,
            answer_delay_ms: 0,
            sound: false,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn load_clamps_timer_and_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"topic":"square-root","timer_secs":9000}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.topic, Topic::SquareRoot);
        assert_eq!(cfg.timer_secs, 300);
        assert_eq!(cfg.difficulty, Difficulty::Easy);
        assert!(cfg.sound);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn pacing_and_session_from_config() {
        let cfg = Config::default();
        assert_eq!(cfg.pacing().answer_delay, Duration::from_millis(600));
        assert_eq!(cfg.pacing().countdown_secs, 3);
        assert_eq!(cfg.session().timer_secs, 60);
    }
}
