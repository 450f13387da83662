// Engine surface for the terminal host, headless tests and other front ends.
// Nothing here touches the terminal except `runtime`'s crossterm event source.
pub mod answer;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod drill;
pub mod error;
pub mod feedback;
pub mod high_score;
pub mod problem;
pub mod runtime;
pub mod session;
pub mod source;
pub mod summary;
pub mod util;

pub use answer::{HistoryEntry, Outcome, UserAnswer};
pub use drill::{Drill, DrillView, Phase};
pub use problem::{generate, Difficulty, Problem, Topic};
pub use summary::{EndReason, SessionSummary};
