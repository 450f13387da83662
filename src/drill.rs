use std::fmt;

use tracing::{debug, info, warn};

use crate::answer::{HistoryEntry, Outcome, UserAnswer};
use crate::clock::{Clock, SystemClock};
use crate::feedback::{AudioFeedback, Cue, Silent};
use crate::high_score::{HighScoreKey, HighScoreStore};
use crate::problem::{generate, Difficulty, Problem, Topic};
use crate::session::{Pacing, SessionConfig, SessionState, DEFAULT_TIMER_SECS};
use crate::source::{NumberSource, RngSource};
use crate::summary::{accuracy_percent, average_time_secs, EndReason, SessionSummary};

/// Where a drill is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown { remaining: u32 },
    Active,
    Ended,
}

/// Render-ready snapshot of a drill for the host to draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrillView {
    pub phase: Phase,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub question_text: Option<String>,
    pub time_left_secs: u32,
    pub score: u32,
    pub total_questions: u32,
    pub accuracy_percent: f64,
    pub average_time_secs: f64,
    pub high_score: u32,
    pub is_processing_answer: bool,
    pub last_entry: Option<HistoryEntry>,
}

/// Timed arithmetic drill: poses problems, scores answers, keeps history
/// and settles the high score when the session ends.
///
/// Every operation is safe to call in any phase; calls that make no sense in
/// the current phase are ignored.
pub struct Drill {
    config: SessionConfig,
    pacing: Pacing,
    state: SessionState,
    phase: Phase,
    summary: Option<SessionSummary>,
    /// Stored best for the current topic and difficulty, refreshed at start and end
    best: u32,
    source: Box<dyn NumberSource + Send>,
    clock: Box<dyn Clock + Send>,
    high_scores: Box<dyn HighScoreStore + Send>,
    feedback: Box<dyn AudioFeedback + Send>,
}

impl fmt::Debug for Drill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drill")
            .field("config", &self.config)
            .field("pacing", &self.pacing)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl Drill {
    pub fn new<H: HighScoreStore + Send + 'static>(high_scores: H) -> Self {
        Self {
            config: SessionConfig::new(Topic::Add, Difficulty::Easy, DEFAULT_TIMER_SECS),
            pacing: Pacing::default(),
            state: SessionState::default(),
            phase: Phase::Idle,
            summary: None,
            best: 0,
            source: Box::new(RngSource::from_entropy()),
            clock: Box::new(SystemClock::new()),
            high_scores: Box::new(high_scores),
            feedback: Box::new(Silent),
        }
    }

    pub fn with_source<S: NumberSource + Send + 'static>(mut self, source: S) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_clock<C: Clock + Send + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_feedback<A: AudioFeedback + Send + 'static>(mut self, feedback: A) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.pacing = pacing;
    }

    /// Begin a new session. Ignored while one is already counting down or running.
    pub fn start(&mut self, topic: Topic, difficulty: Difficulty, timer_secs: u32) {
        self.start_session(SessionConfig::new(topic, difficulty, timer_secs));
    }

    pub fn start_session(&mut self, config: SessionConfig) {
        if self.is_running() {
            debug!("start ignored, session already running");
            return;
        }

        self.config = SessionConfig::new(config.topic, config.difficulty, config.timer_secs);
        self.state = SessionState::for_config(&self.config);
        self.summary = None;
        self.best = self.read_best(self.key());
        info!(
            topic = %self.config.topic,
            difficulty = %self.config.difficulty,
            timer_secs = self.config.timer_secs,
            "session started"
        );

        if self.pacing.countdown_secs > 0 {
            self.phase = Phase::Countdown {
                remaining: self.pacing.countdown_secs,
            };
            self.feedback.play(Cue::CountdownBeep);
        } else {
            self.phase = Phase::Active;
            self.pose_next_problem();
        }
    }

    /// Advance one second. The host calls this once per elapsed second.
    pub fn tick(&mut self) {
        match self.phase {
            Phase::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = Phase::Active;
                    self.feedback.play(Cue::Go);
                    self.pose_next_problem();
                } else {
                    self.phase = Phase::Countdown { remaining };
                    self.feedback.play(Cue::CountdownBeep);
                }
            }
            Phase::Active => {
                self.update();
                self.state.time_left_secs = self.state.time_left_secs.saturating_sub(1);
                if self.state.time_left_secs == 0 {
                    self.finalize(EndReason::TimedOut);
                }
            }
            Phase::Idle | Phase::Ended => {}
        }
    }

    /// Pose the next problem once the post-answer delay has passed.
    /// Cheap to call on every host frame.
    pub fn update(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        if let Some(due) = self.state.next_problem_at {
            if self.clock.now() >= due {
                self.pose_next_problem();
            }
        }
    }

    /// Score a typed answer against the current problem.
    ///
    /// Returns `None` when the call was ignored: no running session, or an
    /// answer is still being shown.
    pub fn submit(&mut self, raw_answer: &str) -> Option<Outcome> {
        if !self.accepting_answers() {
            debug!("submit ignored");
            return None;
        }
        let problem = self.state.current_problem.clone()?;
        let user_answer = UserAnswer::parse(raw_answer);
        let is_correct = user_answer.value().is_some_and(|v| problem.accepts(v));

        let outcome = if is_correct {
            self.state.score += 1;
            self.feedback.play(Cue::Correct);
            Outcome::Correct
        } else {
            self.feedback.play(Cue::Wrong);
            Outcome::Wrong
        };
        debug!(question = %problem.display_text, answer = %user_answer, ?outcome, "answer scored");

        self.record(problem, user_answer, outcome);
        Some(outcome)
    }

    /// Give up on the current problem. Returns whether the skip was recorded.
    pub fn skip(&mut self) -> bool {
        if !self.accepting_answers() {
            return false;
        }
        let Some(problem) = self.state.current_problem.clone() else {
            return false;
        };
        debug!(question = %problem.display_text, "skipped");
        self.record(problem, UserAnswer::Skipped, Outcome::Skipped);
        true
    }

    /// End the running session early and report on it.
    pub fn stop(&mut self) -> Option<&SessionSummary> {
        if self.phase != Phase::Active {
            return None;
        }
        self.finalize(EndReason::Stopped);
        self.summary.as_ref()
    }

    fn accepting_answers(&self) -> bool {
        self.phase == Phase::Active && !self.state.is_processing_answer()
    }

    fn record(&mut self, problem: Problem, user_answer: UserAnswer, outcome: Outcome) {
        let now = self.clock.now();
        let posed_at = self.state.problem_posed_at.unwrap_or(now);
        let elapsed_secs = now.saturating_sub(posed_at).as_secs_f64();

        self.state.record(HistoryEntry {
            question_text: problem.display_text,
            user_answer,
            correct_answer: problem.expected_answer,
            elapsed_secs,
            outcome,
        });

        if self.pacing.answer_delay.is_zero() {
            self.pose_next_problem();
        } else {
            self.state.next_problem_at = Some(now + self.pacing.answer_delay);
        }
    }

    fn pose_next_problem(&mut self) {
        self.state.next_problem_at = None;
        if self.phase != Phase::Active {
            return;
        }
        let problem = generate(self.config.topic, self.config.difficulty, &mut *self.source);
        self.state.problem_posed_at = Some(self.clock.now());
        self.state.current_problem = Some(problem);
    }

    fn finalize(&mut self, reason: EndReason) {
        self.phase = Phase::Ended;
        self.state.next_problem_at = None;
        self.state.current_problem = None;

        let key = self.key();
        let previous = self.read_best(key);
        let mut summary = SessionSummary::from_state(&self.state, reason, previous);

        // check and store in one call; another session may have set a better score since
        summary.is_new_high_score = match self.high_scores.record_if_higher(key, summary.score) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(%key, error = %e, "could not save high score");
                summary.is_new_high_score
            }
        };
        if summary.is_new_high_score {
            info!(%key, score = summary.score, previous, "new high score");
            self.feedback.play(Cue::NewHighScore);
            self.best = summary.score;
        } else {
            self.best = self.read_best(key);
        }

        info!(
            %reason,
            score = summary.score,
            total_questions = summary.total_questions,
            elapsed_secs = summary.elapsed_secs,
            "session ended"
        );
        self.summary = Some(summary);
    }

    fn key(&self) -> HighScoreKey {
        HighScoreKey::new(self.config.topic, self.config.difficulty)
    }

    fn read_best(&self, key: HighScoreKey) -> u32 {
        self.high_scores.get(key).unwrap_or_else(|e| {
            warn!(%key, error = %e, "could not read high score");
            0
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Counting down or active
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Countdown { .. } | Phase::Active)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.state.current_problem.as_ref()
    }

    pub fn time_left_secs(&self) -> u32 {
        self.state.time_left_secs
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn total_questions(&self) -> u32 {
        self.state.total_questions
    }

    pub fn accuracy_percent(&self) -> f64 {
        accuracy_percent(self.state.score, self.state.total_questions)
    }

    pub fn average_time_secs(&self) -> f64 {
        average_time_secs(self.state.total_elapsed_secs, self.state.total_questions)
    }

    pub fn is_processing_answer(&self) -> bool {
        self.state.is_processing_answer()
    }

    /// Most recent first
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.state.history.iter()
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Stored best for a topic and difficulty, 0 if unknown or unreadable.
    /// Hosts poll this every frame, so read failures are only reported at start and end.
    pub fn high_score(&self, topic: Topic, difficulty: Difficulty) -> u32 {
        self.high_scores
            .get(HighScoreKey::new(topic, difficulty))
            .unwrap_or_default()
    }

    pub fn high_scores(&self) -> &dyn HighScoreStore {
        &*self.high_scores
    }

    pub fn view(&self) -> DrillView {
        DrillView {
            phase: self.phase,
            topic: self.config.topic,
            difficulty: self.config.difficulty,
            question_text: self
                .state
                .current_problem
                .as_ref()
                .map(|p| p.display_text.clone()),
            time_left_secs: self.state.time_left_secs,
            score: self.state.score,
            total_questions: self.state.total_questions,
            accuracy_percent: self.accuracy_percent(),
            average_time_secs: self.average_time_secs(),
            high_score: self.best,
            is_processing_answer: self.state.is_processing_answer(),
            last_entry: self.state.history.front().cloned(),
        }
    }
}
