use chrono::{DateTime, Local};
use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use time_humanize::{Accuracy, HumanTime, Tense};
use tracing::warn;

use mathdash::high_score::HighScoreRecord;
use mathdash::problem::{Difficulty, Topic};

use crate::app::{App, SortBy};

fn topic_rank(t: Topic) -> usize {
    Topic::ALL.iter().position(|x| *x == t).unwrap_or(usize::MAX)
}

fn difficulty_rank(d: Difficulty) -> usize {
    Difficulty::ALL
        .iter()
        .position(|x| *x == d)
        .unwrap_or(usize::MAX)
}

/// Board order: topic then difficulty, or best score first
pub fn sort_records(records: Vec<HighScoreRecord>, sort_by: SortBy) -> Vec<HighScoreRecord> {
    let by_key = |r: &HighScoreRecord| (topic_rank(r.key.topic), difficulty_rank(r.key.difficulty));
    match sort_by {
        SortBy::Topic => records.into_iter().sorted_by_key(by_key).collect(),
        SortBy::Score => records
            .into_iter()
            .sorted_by(|a, b| b.score.cmp(&a.score).then_with(|| by_key(a).cmp(&by_key(b))))
            .collect(),
    }
}

pub fn time_ago(at: DateTime<Local>, now: DateTime<Local>) -> String {
    let elapsed = (now - at).to_std().unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

pub fn render_high_scores(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(0),    // table
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let sort_text = match app.board.sort_by {
        SortBy::Topic => "Topic",
        SortBy::Score => "Score",
    };
    let title = Paragraph::new(format!("High Scores (Sort: {sort_text})"))
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let records = app.drill.high_scores().all().unwrap_or_else(|e| {
        warn!(error = %e, "could not list high scores");
        Vec::new()
    });

    if records.is_empty() {
        f.render_widget(
            Paragraph::new("No high scores yet")
                .style(Style::default().add_modifier(Modifier::DIM))
                .alignment(Alignment::Center),
            chunks[1],
        );
    } else {
        let records = sort_records(records, app.board.sort_by);
        // borders and header take three rows
        let visible = (chunks[1].height as usize).saturating_sub(3).max(1);
        let offset = app
            .board
            .scroll_offset
            .min(records.len().saturating_sub(visible));
        let now = Local::now();

        let rows = records.iter().skip(offset).take(visible).map(|r| {
            Row::new(vec![
                Cell::from(r.key.topic.to_string()),
                Cell::from(r.key.difficulty.to_string()),
                Cell::from(r.score.to_string()),
                Cell::from(r.achieved_at.map_or_else(|| "-".to_string(), |at| time_ago(at, now))),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(16),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["Topic", "Difficulty", "Best", "Set"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(table, chunks[1]);
    }

    f.render_widget(
        Paragraph::new("(s)ort (↑↓) scroll (b)ack")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::ui::tests::{render_to_string, test_app};
    use mathdash::high_score::HighScoreKey;

    fn record(topic: Topic, difficulty: Difficulty, score: u32) -> HighScoreRecord {
        HighScoreRecord {
            key: HighScoreKey::new(topic, difficulty),
            score,
            achieved_at: None,
        }
    }

    #[test]
    fn sorts_by_topic_order_then_difficulty() {
        let sorted = sort_records(
            vec![
                record(Topic::Percent, Difficulty::Easy, 9),
                record(Topic::Add, Difficulty::Hard, 3),
                record(Topic::Add, Difficulty::Easy, 5),
            ],
            SortBy::Topic,
        );
        let keys: Vec<String> = sorted.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["add_easy", "add_hard", "perc_easy"]);
    }

    #[test]
    fn sorts_by_score_descending() {
        let sorted = sort_records(
            vec![
                record(Topic::Add, Difficulty::Easy, 5),
                record(Topic::Percent, Difficulty::Easy, 9),
                record(Topic::Cube, Difficulty::Medium, 5),
            ],
            SortBy::Score,
        );
        let scores: Vec<u32> = sorted.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![9, 5, 5]);
        assert_eq!(sorted[1].key.topic, Topic::Add);
    }

    #[test]
    fn empty_board_says_so() {
        let mut app = test_app(vec![]);
        app.state = AppState::HighScores;
        assert!(render_to_string(&app).contains("No high scores yet"));
    }

    #[test]
    fn board_lists_a_finished_drill() {
        let mut app = test_app(vec![3, 4]);
        app.start(std::time::Duration::ZERO);
        app.drill.submit("7");
        app.drill.stop();
        app.state = AppState::HighScores;

        let out = render_to_string(&app);
        assert!(out.contains("Addition"));
        assert!(out.contains("Easy"));
        assert!(out.contains("ago") || out.contains("now"));
    }
}
