use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui::{render_drill, render_settings, results::render_results, scores::render_high_scores};

/// A UI Screen boundary: knows how to draw one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_settings(app, f);
    }
}

pub struct DrillScreen;

impl Screen for DrillScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_drill(app, f);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_results(app, f);
    }
}

pub struct HighScoresScreen;

impl Screen for HighScoresScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_high_scores(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Settings => Box::new(SettingsScreen),
        AppState::Drill => Box::new(DrillScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::HighScores => Box::new(HighScoresScreen),
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    current_screen(app.state).render(app, f);
}
