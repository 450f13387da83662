use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use mathdash::answer::format_number;
use mathdash::{EndReason, Outcome, SessionSummary};

use crate::app::App;
use crate::ui::truncate_to_width;

const QUESTION_COL_WIDTH: u16 = 24;

fn summary_lines(summary: &SessionSummary) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(format!(
            "Score: {}/{}   Accuracy: {:.0}%",
            summary.score, summary.total_questions, summary.accuracy_percent
        )),
        Line::from(format!(
            "{:.1} questions/min   Average: {:.2}s (±{:.2}s)   Time: {}s",
            summary.questions_per_minute,
            summary.average_time_secs,
            summary.answer_time_std_dev,
            summary.elapsed_secs
        )),
    ];
    if summary.is_new_high_score {
        lines.push(Line::from(Span::styled(
            format!(
                "NEW HIGH SCORE! {} (was {})",
                summary.score, summary.previous_high_score
            ),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("High score: {}", summary.previous_high_score),
            Style::default().add_modifier(Modifier::DIM),
        )));
    }
    lines
}

pub fn render_results(app: &App, f: &mut Frame) {
    let Some(summary) = app.drill.summary() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // banner
            Constraint::Length(3), // summary
            Constraint::Length(1), // padding
            Constraint::Min(3),    // history
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let banner_color = match summary.reason {
        EndReason::TimedOut => Color::Cyan,
        EndReason::Stopped => Color::Magenta,
    };
    let banner = Paragraph::new(summary.reason.to_string())
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} · {}",
            app.drill.config().topic,
            app.drill.config().difficulty
        )))
        .style(
            Style::default()
                .fg(banner_color)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(banner, chunks[0]);

    f.render_widget(
        Paragraph::new(summary_lines(summary)).alignment(Alignment::Center),
        chunks[1],
    );

    let question_width = QUESTION_COL_WIDTH.min(chunks[3].width / 2) as usize;
    let rows = app.drill.history().map(|entry| {
        let color = match entry.outcome {
            Outcome::Correct => Color::Green,
            Outcome::Wrong => Color::Red,
            Outcome::Skipped => Color::Yellow,
        };
        Row::new(vec![
            Cell::from(truncate_to_width(&entry.question_text, question_width)),
            Cell::from(entry.user_answer.to_string()),
            Cell::from(format_number(entry.correct_answer)),
            Cell::from(format!("{:.1}s", entry.elapsed_secs)),
        ])
        .style(Style::default().fg(color))
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(question_width as u16),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["Question", "Your answer", "Answer", "Time"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("History"));
    f.render_widget(table, chunks[3]);

    f.render_widget(
        Paragraph::new("(r)etry (n)ew settings (h)igh scores (esc) quit")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center),
        chunks[4],
    );
}
