use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use mathdash::clock::{Clock, ManualClock};
use mathdash::high_score::InMemoryHighScores;
use mathdash::runtime::{ChannelEventSource, FixedTicker, HostEvent, Runner, SecondPacer};
use mathdash::session::Pacing;
use mathdash::source::ScriptedSource;
use mathdash::{Difficulty, Drill, EndReason, Outcome, Phase, Topic};

fn key(c: char) -> HostEvent {
    HostEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn enter() -> HostEvent {
    HostEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
}

// Drives a drill through the runtime without a TTY: typed keys build an
// answer, Enter submits it, ticks advance the timer via the pacer.
#[test]
fn headless_answers_are_scored() {
    let clock = ManualClock::new();
    let mut drill = Drill::new(InMemoryHighScores::new())
        .with_source(ScriptedSource::new(vec![3, 4, 10, 5]))
        .with_clock(clock.clone());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    drill.start(Topic::Add, Difficulty::Easy, 30);
    for ev in [key('7'), enter(), key('1'), key('4'), enter()] {
        tx.send(ev).unwrap();
    }

    let mut typed = String::new();
    for _ in 0..20u32 {
        match runner.step() {
            HostEvent::Key(k) => match k.code {
                KeyCode::Char(c) => typed.push(c),
                KeyCode::Enter => {
                    clock.advance_secs_f64(1.5);
                    drill.submit(&typed);
                    typed.clear();
                }
                _ => {}
            },
            HostEvent::Tick | HostEvent::Resize => {}
        }
        if drill.total_questions() == 2 {
            break;
        }
    }

    let outcomes: Vec<Outcome> = drill.history().map(|h| h.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Wrong, Outcome::Correct]);
    assert_eq!(drill.score(), 1);
    assert!((drill.average_time_secs() - 1.5).abs() < 1e-9);
}

#[test]
fn headless_timer_runs_out() {
    let clock = ManualClock::new();
    let mut drill = Drill::new(InMemoryHighScores::new()).with_clock(clock.clone());
    let mut pacer = SecondPacer::new(clock.now());

    let (_tx, rx) = mpsc::channel::<HostEvent>();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    drill.start(Topic::Multiply, Difficulty::Medium, 3);
    for _ in 0..100u32 {
        if let HostEvent::Tick = runner.step() {
            clock.advance(Duration::from_millis(250));
            for _ in 0..pacer.due(clock.now()) {
                drill.tick();
            }
        }
        if drill.phase() == Phase::Ended {
            break;
        }
    }

    let summary = drill.summary().expect("timed out drill has a summary");
    assert_eq!(summary.reason, EndReason::TimedOut);
    assert_eq!(summary.elapsed_secs, 3);
    assert_eq!(summary.total_questions, 0);
    assert!(!summary.is_new_high_score);
}

#[test]
fn headless_countdown_then_delay() {
    let clock = ManualClock::new();
    let mut drill = Drill::new(InMemoryHighScores::new())
        .with_source(ScriptedSource::new(vec![6, 7]))
        .with_clock(clock.clone())
        .with_pacing(Pacing {
            countdown_secs: 3,
            answer_delay: Duration::from_millis(600),
        });

    drill.start(Topic::Multiply, Difficulty::Easy, 10);
    assert_eq!(drill.phase(), Phase::Countdown { remaining: 3 });
    for _ in 0..3 {
        drill.tick();
    }
    assert_eq!(drill.phase(), Phase::Active);
    assert_eq!(drill.time_left_secs(), 10);
    assert_eq!(
        drill.current_problem().map(|p| p.display_text.as_str()),
        Some("6 × 7 = ?")
    );

    assert_eq!(drill.submit("42"), Some(Outcome::Correct));
    assert!(drill.is_processing_answer());
    assert_eq!(drill.submit("42"), None);
    assert!(!drill.skip());

    clock.advance(Duration::from_millis(600));
    drill.update();
    assert!(!drill.is_processing_answer());
    assert_eq!(drill.total_questions(), 1);
}
