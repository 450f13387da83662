pub mod results;
pub mod scores;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use mathdash::answer::format_number;
use mathdash::{DrillView, HistoryEntry, Outcome, Phase};

use crate::app::{App, SettingsField};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const LOW_TIME_SECS: u32 = 10;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Cut `s` to at most `max` terminal columns, marking the cut with `…`
pub fn truncate_to_width(s: &str, max: usize) -> String {
    let total: usize = s.chars().filter_map(|c| c.width()).sum();
    if total <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// One-line verdict for the latest history entry
pub fn feedback_line(entry: &HistoryEntry) -> Span<'static> {
    let answer = format_number(entry.correct_answer);
    match entry.outcome {
        Outcome::Correct => Span::styled("Correct!", bold().fg(Color::Green)),
        Outcome::Wrong => Span::styled(
            format!("Correct answer: {answer}"),
            bold().fg(Color::Red),
        ),
        Outcome::Skipped => Span::styled(
            format!("Skipped - answer was: {answer}"),
            bold().fg(Color::Yellow),
        ),
    }
}

pub fn render_settings(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(5),    // fields
            Constraint::Length(1), // high score
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let title = Paragraph::new("mathdash")
        .block(Block::default().borders(Borders::ALL))
        .style(bold().fg(Color::Cyan))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let cfg = &app.config;
    let fields = [
        (SettingsField::Topic, "Topic", cfg.topic.to_string()),
        (SettingsField::Difficulty, "Difficulty", cfg.difficulty.to_string()),
        (SettingsField::Timer, "Timer", format!("{}s", cfg.timer_secs)),
    ];
    let lines: Vec<Line> = fields
        .into_iter()
        .map(|(field, label, value)| {
            let selected = field == app.settings_field;
            let value_style = if selected {
                bold().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(if selected { "> " } else { "  " }, value_style),
                Span::styled(format!("{label:<12}"), dim()),
                Span::styled(format!("‹ {value} ›"), value_style),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered_rows(chunks[1], 3),
    );

    let best = app.drill.high_score(cfg.topic, cfg.difficulty);
    f.render_widget(
        Paragraph::new(format!("High score: {best}"))
            .style(dim())
            .alignment(Alignment::Center),
        chunks[2],
    );

    f.render_widget(
        Paragraph::new("(↑↓) field (←→) change (enter) start (h)igh scores (esc) quit")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

pub fn render_drill(app: &App, f: &mut Frame) {
    let view = app.drill.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // topic / high score
            Constraint::Length(1), // time left
            Constraint::Min(3),    // question
            Constraint::Length(1), // answer field
            Constraint::Length(1), // feedback
            Constraint::Length(1), // padding
            Constraint::Length(1), // running stats
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(format!(
            "{} · {}   High score: {}",
            view.topic, view.difficulty, view.high_score
        ))
        .style(dim())
        .alignment(Alignment::Center),
        chunks[0],
    );

    let time_style = if view.time_left_secs <= LOW_TIME_SECS {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    f.render_widget(
        Paragraph::new(Span::styled(format!("{}s", view.time_left_secs), time_style))
            .alignment(Alignment::Center),
        chunks[1],
    );

    f.render_widget(
        Paragraph::new(Span::styled(
            truncate_to_width(&headline(&view), chunks[2].width as usize),
            bold().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center),
        centered_rows(chunks[2], 1),
    );

    let field = if view.phase == Phase::Active {
        format!("> {}_", app.input.as_str())
    } else {
        String::new()
    };
    f.render_widget(
        Paragraph::new(field).alignment(Alignment::Center),
        chunks[3],
    );

    if let Some(entry) = &view.last_entry {
        f.render_widget(
            Paragraph::new(feedback_line(entry)).alignment(Alignment::Center),
            chunks[4],
        );
    }

    f.render_widget(
        Paragraph::new(format!(
            "Score: {}/{}   Accuracy: {:.0}%   Avg: {:.1}s",
            view.score, view.total_questions, view.accuracy_percent, view.average_time_secs
        ))
        .alignment(Alignment::Center),
        chunks[6],
    );

    f.render_widget(
        Paragraph::new("(enter) submit (tab) skip (esc) stop")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center),
        chunks[7],
    );
}

/// Big text for the middle of the drill screen
fn headline(view: &DrillView) -> String {
    match view.phase {
        Phase::Countdown { remaining } => remaining.to_string(),
        Phase::Active => view.question_text.clone().unwrap_or_default(),
        Phase::Idle | Phase::Ended => String::new(),
    }
}

fn centered_rows(area: Rect, rows: u16) -> Rect {
    let rows = rows.min(area.height);
    Rect {
        y: area.y + (area.height - rows) / 2,
        height: rows,
        ..area
    }
}
