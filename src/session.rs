use std::collections::VecDeque;
use std::time::Duration;

use crate::answer::HistoryEntry;
use crate::problem::{Difficulty, Problem, Topic};

pub const MIN_TIMER_SECS: u32 = 1;
pub const MAX_TIMER_SECS: u32 = 300;
pub const DEFAULT_TIMER_SECS: u32 = 60;

/// What a session drills and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub timer_secs: u32,
}

impl SessionConfig {
    pub fn new(topic: Topic, difficulty: Difficulty, timer_secs: u32) -> Self {
        Self {
            topic,
            difficulty,
            timer_secs: clamp_timer(timer_secs),
        }
    }
}

/// Host-side pacing around the questions themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    /// Seconds of countdown before the first question; 0 starts immediately.
    pub countdown_secs: u32,
    /// How long an answered question stays up before the next one is posed.
    pub answer_delay: Duration,
}

pub fn clamp_timer(secs: u32) -> u32 {
    secs.clamp(MIN_TIMER_SECS, MAX_TIMER_SECS)
}

/// Mutable record of a running or finished session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub score: u32,
    pub total_questions: u32,
    pub total_elapsed_secs: f64,
    pub time_left_secs: u32,
    pub initial_time_limit: u32,
    pub current_problem: Option<Problem>,
    pub problem_posed_at: Option<Duration>,
    /// Set while an answer is being shown; the next problem is posed at this time.
    pub next_problem_at: Option<Duration>,
    /// Most recent first
    pub history: VecDeque<HistoryEntry>,
}

impl SessionState {
    pub fn for_config(config: &SessionConfig) -> Self {
        Self {
            time_left_secs: config.timer_secs,
            initial_time_limit: config.timer_secs,
            ..Self::default()
        }
    }

    pub fn is_processing_answer(&self) -> bool {
        self.next_problem_at.is_some()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.total_questions += 1;
        self.total_elapsed_secs += entry.elapsed_secs;
        self.history.push_front(entry);
    }

    pub fn answer_times(&self) -> Vec<f64> {
        self.history.iter().map(|h| h.elapsed_secs).collect()
    }
}
