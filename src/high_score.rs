use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::problem::{Difficulty, Topic};

/// High scores are tracked per (topic, difficulty) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighScoreKey {
    pub topic: Topic,
    pub difficulty: Difficulty,
}

impl HighScoreKey {
    pub fn new(topic: Topic, difficulty: Difficulty) -> Self {
        Self { topic, difficulty }
    }
}

impl fmt::Display for HighScoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.topic.key(), self.difficulty.key())
    }
}

/// A stored best score
#[derive(Debug, Clone, PartialEq)]
pub struct HighScoreRecord {
    pub key: HighScoreKey,
    pub score: u32,
    pub achieved_at: Option<DateTime<Local>>,
}

/// Storage for best scores. The drill only needs `get` and `set`.
pub trait HighScoreStore {
    /// Best score for `key`, 0 when none has been recorded
    fn get(&self, key: HighScoreKey) -> Result<u32>;

    fn set(&mut self, key: HighScoreKey, score: u32) -> Result<()>;

    /// Every stored record, in no particular order
    fn all(&self) -> Result<Vec<HighScoreRecord>>;

    /// Store `score` if it beats the current best. Returns whether it did.
    fn record_if_higher(&mut self, key: HighScoreKey, score: u32) -> Result<bool> {
        if score > self.get(key)? {
            self.set(key, score)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Process-lifetime store
#[derive(Debug, Clone, Default)]
pub struct InMemoryHighScores {
    records: HashMap<HighScoreKey, HighScoreRecord>,
}

impl InMemoryHighScores {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HighScoreStore for InMemoryHighScores {
    fn get(&self, key: HighScoreKey) -> Result<u32> {
        Ok(self.records.get(&key).map_or(0, |r| r.score))
    }

    fn set(&mut self, key: HighScoreKey, score: u32) -> Result<()> {
        self.records.insert(
            key,
            HighScoreRecord {
                key,
                score,
                achieved_at: Some(Local::now()),
            },
        );
        Ok(())
    }

    fn all(&self) -> Result<Vec<HighScoreRecord>> {
        Ok(self.records.values().cloned().collect())
    }
}

/// One store shared between several drills
impl<S: HighScoreStore> HighScoreStore for Arc<Mutex<S>> {
    fn get(&self, key: HighScoreKey) -> Result<u32> {
        self.lock().map_err(|_| Error::LockPoisoned)?.get(key)
    }

    fn set(&mut self, key: HighScoreKey, score: u32) -> Result<()> {
        self.lock().map_err(|_| Error::LockPoisoned)?.set(key, score)
    }

    fn all(&self) -> Result<Vec<HighScoreRecord>> {
        self.lock().map_err(|_| Error::LockPoisoned)?.all()
    }

    // Check and update under one lock so two sessions cannot interleave.
    fn record_if_higher(&mut self, key: HighScoreKey, score: u32) -> Result<bool> {
        self.lock()
            .map_err(|_| Error::LockPoisoned)?
            .record_if_higher(key, score)
    }
}

/// SQLite-backed store that survives restarts
#[derive(Debug)]
pub struct SqliteHighScores {
    conn: Connection,
}

impl SqliteHighScores {
    /// Open the database at the default state location
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mathdash_scores.db"));
        Self::open(path)
    }

    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS high_scores (
                topic TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                score INTEGER NOT NULL,
                achieved_at TEXT NOT NULL,
                PRIMARY KEY (topic, difficulty)
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Local))
}

impl HighScoreStore for SqliteHighScores {
    fn get(&self, key: HighScoreKey) -> Result<u32> {
        let score: Option<u32> = self
            .conn
            .query_row(
                "SELECT score FROM high_scores WHERE topic = ?1 AND difficulty = ?2",
                params![key.topic.key(), key.difficulty.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(score.unwrap_or(0))
    }

    fn set(&mut self, key: HighScoreKey, score: u32) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO high_scores (topic, difficulty, score, achieved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (topic, difficulty)
            DO UPDATE SET score = excluded.score, achieved_at = excluded.achieved_at
            "#,
            params![
                key.topic.key(),
                key.difficulty.key(),
                score,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<HighScoreRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT topic, difficulty, score, achieved_at FROM high_scores")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (topic, difficulty, score, achieved_at) = row?;
            // rows written by a newer build may name topics we do not know
            if let (Some(topic), Some(difficulty)) =
                (Topic::from_key(&topic), Difficulty::from_key(&difficulty))
            {
                records.push(HighScoreRecord {
                    key: HighScoreKey::new(topic, difficulty),
                    score,
                    achieved_at: parse_timestamp(&achieved_at),
                });
            }
        }
        Ok(records)
    }
}
