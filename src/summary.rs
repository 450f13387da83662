use crate::session::SessionState;
use crate::util::{ratio_or_zero, std_dev};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EndReason {
    #[strum(to_string = "Test Stopped")]
    Stopped,
    #[strum(to_string = "Time's Up!")]
    TimedOut,
}

/// Frozen report produced when a session ends
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub reason: EndReason,
    pub score: u32,
    pub total_questions: u32,
    pub accuracy_percent: f64,
    pub questions_per_minute: f64,
    pub average_time_secs: f64,
    pub answer_time_std_dev: f64,
    pub elapsed_secs: u32,
    pub previous_high_score: u32,
    pub is_new_high_score: bool,
}

pub fn accuracy_percent(score: u32, total_questions: u32) -> f64 {
    ratio_or_zero(score as f64, total_questions as f64) * 100.0
}

pub fn average_time_secs(total_elapsed_secs: f64, total_questions: u32) -> f64 {
    ratio_or_zero(total_elapsed_secs, total_questions as f64)
}

pub fn questions_per_minute(total_questions: u32, elapsed_secs: u32) -> f64 {
    ratio_or_zero(total_questions as f64, elapsed_secs as f64 / 60.0)
}

/// Seconds the session ran. A timeout always counts the full limit.
pub fn elapsed_secs(state: &SessionState, reason: EndReason) -> u32 {
    match reason {
        EndReason::Stopped => state.initial_time_limit.saturating_sub(state.time_left_secs),
        EndReason::TimedOut => state.initial_time_limit,
    }
}

impl SessionSummary {
    pub fn from_state(state: &SessionState, reason: EndReason, previous_high_score: u32) -> Self {
        let elapsed = elapsed_secs(state, reason);
        Self {
            reason,
            score: state.score,
            total_questions: state.total_questions,
            accuracy_percent: accuracy_percent(state.score, state.total_questions),
            questions_per_minute: questions_per_minute(state.total_questions, elapsed),
            average_time_secs: average_time_secs(state.total_elapsed_secs, state.total_questions),
            answer_time_std_dev: std_dev(&state.answer_times()).unwrap_or(0.0),
            elapsed_secs: elapsed,
            previous_high_score,
            is_new_high_score: state.score > previous_high_score,
        }
    }
}
