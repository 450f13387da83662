use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use mathdash::config::{Config, ConfigStore};
use mathdash::feedback::{AudioFeedback, Cue};
use mathdash::problem::{Difficulty, Topic};
use mathdash::runtime::SecondPacer;
use mathdash::session::clamp_timer;
use mathdash::{Drill, Phase};

const TIMER_STEP_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Settings,
    Drill,
    Results,
    HighScores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Topic,
    Difficulty,
    Timer,
}

impl SettingsField {
    fn next(self) -> Self {
        match self {
            SettingsField::Topic => SettingsField::Difficulty,
            SettingsField::Difficulty => SettingsField::Timer,
            SettingsField::Timer => SettingsField::Topic,
        }
    }

    fn prev(self) -> Self {
        match self {
            SettingsField::Topic => SettingsField::Timer,
            SettingsField::Difficulty => SettingsField::Topic,
            SettingsField::Timer => SettingsField::Difficulty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Topic,
    Score,
}

#[derive(Debug)]
pub struct BoardState {
    pub scroll_offset: usize,
    pub sort_by: SortBy,
    /// Screen to go back to
    pub return_to: AppState,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            sort_by: SortBy::Topic,
            return_to: AppState::Settings,
        }
    }
}

/// Answer field with keypad editing rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerInput {
    text: String,
}

impl AnswerInput {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Returns false when the key is not accepted
    pub fn push(&mut self, c: char) -> bool {
        match c {
            '0'..='9' => {
                // a lone zero is replaced rather than extended
                match self.text.as_str() {
                    "0" => self.text.clear(),
                    "-0" => {
                        self.text.pop();
                    }
                    _ => {}
                }
                self.text.push(c);
            }
            '.' => {
                if self.text.contains('.') {
                    return false;
                }
                if self.text.is_empty() || self.text == "-" {
                    self.text.push('0');
                }
                self.text.push('.');
            }
            '-' => {
                if !self.text.is_empty() {
                    return false;
                }
                self.text.push('-');
            }
            _ => return false,
        }
        true
    }
}

/// Rings the terminal bell for the cues worth hearing
#[derive(Debug, Default)]
pub struct BellFeedback;

impl AudioFeedback for BellFeedback {
    fn play(&mut self, cue: Cue) {
        let rings = match cue {
            Cue::Correct => 0,
            Cue::CountdownBeep | Cue::Go | Cue::Wrong => 1,
            Cue::NewHighScore => 2,
        };
        let mut out = io::stdout();
        for _ in 0..rings {
            let _ = out.write_all(b"\x07");
        }
        let _ = out.flush();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

pub struct App {
    pub drill: Drill,
    pub config: Config,
    pub state: AppState,
    pub settings_field: SettingsField,
    pub input: AnswerInput,
    pub board: BoardState,
    pacer: SecondPacer,
    config_store: Option<Box<dyn ConfigStore>>,
}

impl App {
    pub fn new(mut drill: Drill, config: Config) -> Self {
        drill.set_pacing(config.pacing());
        Self {
            drill,
            config,
            state: AppState::Settings,
            settings_field: SettingsField::Topic,
            input: AnswerInput::default(),
            board: BoardState::default(),
            pacer: SecondPacer::new(Duration::ZERO),
            config_store: None,
        }
    }

    /// Persist the chosen settings every time a drill starts
    pub fn with_config_store<S: ConfigStore + 'static>(mut self, store: S) -> Self {
        self.config_store = Some(Box::new(store));
        self
    }

    /// Start a drill with the current settings
    pub fn start(&mut self, now: Duration) {
        if let Some(store) = &self.config_store {
            if let Err(e) = store.save(&self.config) {
                warn!(error = %e, "could not save config");
            }
        }
        self.drill.start_session(self.config.session());
        self.pacer.reset(now);
        self.input.clear();
        self.state = AppState::Drill;
    }

    /// Called on every host frame with the host clock reading
    pub fn on_frame(&mut self, now: Duration) {
        if !self.drill.is_running() {
            return;
        }
        for _ in 0..self.pacer.due(now) {
            self.drill.tick();
        }
        self.drill.update();
        if self.drill.phase() == Phase::Ended {
            self.state = AppState::Results;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Duration) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.quit();
        }

        match self.state {
            AppState::Settings => self.on_settings_key(key, now),
            AppState::Drill => self.on_drill_key(key),
            AppState::Results => self.on_results_key(key, now),
            AppState::HighScores => self.on_board_key(key),
        }
    }

    fn quit(&mut self) -> Action {
        // a running drill is settled so its high score is not lost
        if self.drill.stop().is_some() {
            info!("drill stopped on quit");
        }
        Action::Quit
    }

    fn open_board(&mut self) {
        self.board.return_to = self.state;
        self.board.scroll_offset = 0;
        self.state = AppState::HighScores;
    }

    fn on_settings_key(&mut self, key: KeyEvent, now: Duration) -> Action {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return self.quit(),
            KeyCode::Enter => self.start(now),
            KeyCode::Char('h') => self.open_board(),
            KeyCode::Up => self.settings_field = self.settings_field.prev(),
            KeyCode::Down | KeyCode::Tab => self.settings_field = self.settings_field.next(),
            KeyCode::Left => self.adjust_setting(false),
            KeyCode::Right => self.adjust_setting(true),
            _ => {}
        }
        Action::Continue
    }

    fn adjust_setting(&mut self, forward: bool) {
        match self.settings_field {
            SettingsField::Topic => {
                self.config.topic = cycle(&Topic::ALL, self.config.topic, forward);
            }
            SettingsField::Difficulty => {
                self.config.difficulty = cycle(&Difficulty::ALL, self.config.difficulty, forward);
            }
            SettingsField::Timer => {
                let secs = self.config.timer_secs;
                self.config.timer_secs = if forward {
                    clamp_timer(secs.saturating_add(TIMER_STEP_SECS))
                } else {
                    clamp_timer(secs.saturating_sub(TIMER_STEP_SECS))
                };
            }
        }
    }

    fn on_drill_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                if self.drill.stop().is_some() {
                    self.state = AppState::Results;
                }
            }
            KeyCode::Enter => {
                if !self.input.is_blank() && self.drill.submit(self.input.as_str()).is_some() {
                    self.input.clear();
                }
            }
            KeyCode::Tab => {
                if self.drill.skip() {
                    self.input.clear();
                }
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Char(c) => {
                if self.drill.is_active() {
                    self.input.push(c);
                }
            }
            _ => {}
        }
        Action::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent, now: Duration) -> Action {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return self.quit(),
            KeyCode::Char('r') => self.start(now),
            KeyCode::Char('n') => self.state = AppState::Settings,
            KeyCode::Char('h') => self.open_board(),
            _ => {}
        }
        Action::Continue
    }

    fn on_board_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.state = self.board.return_to;
            }
            KeyCode::Char('s') => {
                self.board.sort_by = match self.board.sort_by {
                    SortBy::Topic => SortBy::Score,
                    SortBy::Score => SortBy::Topic,
                };
                self.board.scroll_offset = 0;
            }
            KeyCode::Up => self.board.scroll_offset = self.board.scroll_offset.saturating_sub(1),
            // clamped when rendering
            KeyCode::Down => self.board.scroll_offset += 1,
            KeyCode::Home => self.board.scroll_offset = 0,
            _ => {}
        }
        Action::Continue
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let idx = all.iter().position(|t| *t == current).unwrap_or(0);
    let len = all.len();
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    all[next]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathdash::clock::ManualClock;
    use mathdash::high_score::InMemoryHighScores;
    use mathdash::source::ScriptedSource;
    use mathdash::Outcome;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)), Duration::ZERO);
        }
    }

    fn test_app(draws: Vec<u32>, config: Config) -> (App, ManualClock) {
        let clock = ManualClock::new();
        let drill = Drill::new(InMemoryHighScores::new())
            .with_source(ScriptedSource::new(draws))
            .with_clock(clock.clone());
        (App::new(drill, config), clock)
    }

    fn quick_config() -> Config {
        Config {
            countdown_secs: 0,
            answer_delay_ms: 0,
            ..Config::default()
        }
    }

    #[test]
    fn keypad_rules() {
        let mut input = AnswerInput::default();
        assert!(input.push('-'));
        assert!(!input.push('-'));
        assert!(input.push('.'));
        assert_eq!(input.as_str(), "-0.");
        assert!(!input.push('.'));
        assert!(input.push('5'));
        assert_eq!(input.as_str(), "-0.5");

        input.clear();
        input.push('0');
        input.push('7');
        assert_eq!(input.as_str(), "7");

        input.clear();
        input.push('.');
        assert_eq!(input.as_str(), "0.");
        input.backspace();
        input.backspace();
        assert!(input.is_blank());
        assert!(!input.push('x'));
    }

    #[test]
    fn minus_only_leads() {
        let mut input = AnswerInput::default();
        input.push('4');
        assert!(!input.push('-'));
        assert_eq!(input.as_str(), "4");
    }

    #[test]
    fn settings_cycle_and_clamp() {
        let (mut app, _) = test_app(vec![], quick_config());
        app.on_key(key(KeyCode::Left), Duration::ZERO);
        assert_eq!(app.config.topic, Topic::Remainder);
        app.on_key(key(KeyCode::Right), Duration::ZERO);
        assert_eq!(app.config.topic, Topic::Add);

        app.on_key(key(KeyCode::Down), Duration::ZERO);
        app.on_key(key(KeyCode::Right), Duration::ZERO);
        assert_eq!(app.config.difficulty, Difficulty::Medium);

        app.on_key(key(KeyCode::Down), Duration::ZERO);
        assert_eq!(app.settings_field, SettingsField::Timer);
        app.config.timer_secs = 298;
        app.on_key(key(KeyCode::Right), Duration::ZERO);
        assert_eq!(app.config.timer_secs, 300);
        app.config.timer_secs = 3;
        app.on_key(key(KeyCode::Left), Duration::ZERO);
        assert_eq!(app.config.timer_secs, 1);
    }

    #[test]
    fn answer_then_stop_shows_results() {
        let (mut app, clock) = test_app(vec![3, 4, 1, 1], quick_config());
        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        assert_eq!(app.state, AppState::Drill);
        assert_eq!(
            app.drill.current_problem().map(|p| p.display_text.as_str()),
            Some("3 + 4 = ?")
        );

        // blank answers are not submitted
        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        assert_eq!(app.drill.total_questions(), 0);

        clock.advance_secs_f64(2.0);
        type_str(&mut app, "7");
        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        assert_eq!(app.drill.score(), 1);
        assert!(app.input.is_blank());
        assert_eq!(
            app.drill.history().next().map(|h| h.outcome),
            Some(Outcome::Correct)
        );

        app.on_key(key(KeyCode::Tab), Duration::ZERO);
        assert_eq!(app.drill.total_questions(), 2);

        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert_eq!(app.state, AppState::Results);
        assert!(app.drill.summary().is_some());
    }

    #[test]
    fn frames_drive_the_timer_to_results() {
        let config = Config {
            timer_secs: 2,
            ..quick_config()
        };
        let (mut app, _) = test_app(vec![], config);
        app.start(Duration::ZERO);

        app.on_frame(Duration::from_millis(1500));
        assert_eq!(app.drill.time_left_secs(), 1);
        assert_eq!(app.state, AppState::Drill);

        app.on_frame(Duration::from_millis(2100));
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.drill.phase(), Phase::Ended);
    }

    #[test]
    fn countdown_ignores_typing() {
        let config = Config {
            countdown_secs: 3,
            answer_delay_ms: 0,
            ..Config::default()
        };
        let (mut app, _) = test_app(vec![], config);
        app.start(Duration::ZERO);
        type_str(&mut app, "12");
        assert!(app.input.is_blank());
        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert_eq!(app.state, AppState::Drill);

        app.on_frame(Duration::from_secs(3));
        assert!(app.drill.is_active());
        type_str(&mut app, "12");
        assert_eq!(app.input.as_str(), "12");
    }

    #[test]
    fn results_keys() {
        let (mut app, _) = test_app(vec![], quick_config());
        app.start(Duration::ZERO);
        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert_eq!(app.state, AppState::Results);

        app.on_key(key(KeyCode::Char('h')), Duration::ZERO);
        assert_eq!(app.state, AppState::HighScores);
        app.on_key(key(KeyCode::Char('s')), Duration::ZERO);
        assert_eq!(app.board.sort_by, SortBy::Score);
        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert_eq!(app.state, AppState::Results);

        app.on_key(key(KeyCode::Char('r')), Duration::ZERO);
        assert_eq!(app.state, AppState::Drill);
        assert!(app.drill.is_active());
        app.on_key(key(KeyCode::Esc), Duration::ZERO);

        app.on_key(key(KeyCode::Char('n')), Duration::ZERO);
        assert_eq!(app.state, AppState::Settings);
        assert_eq!(
            app.on_key(key(KeyCode::Esc), Duration::ZERO),
            Action::Quit
        );
    }

    #[test]
    fn ctrl_c_quits_and_settles_running_drill() {
        let (mut app, _) = test_app(vec![3, 4], quick_config());
        app.start(Duration::ZERO);
        type_str(&mut app, "7");
        app.on_key(key(KeyCode::Enter), Duration::ZERO);

        let action = app.on_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Duration::ZERO,
        );
        assert_eq!(action, Action::Quit);
        assert_eq!(app.drill.high_score(Topic::Add, Difficulty::Easy), 1);
    }
}
