use thiserror::Error;

/// Failures from the storage and configuration layers.
///
/// The drill engine itself never returns these to its host; it logs them and
/// degrades (see `Drill`), so only hosts that talk to stores directly see them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("high score database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("high score store lock was poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
