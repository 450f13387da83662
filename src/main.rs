pub mod app;
pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mathdash::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    feedback::Silent,
    high_score::{InMemoryHighScores, SqliteHighScores},
    problem::{Difficulty, Topic},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, HostEvent, Runner},
    source::RngSource,
    Drill,
};

use crate::app::{Action, App, BellFeedback};

const TICK_RATE_MS: u64 = 100;
const LOG_ENV: &str = "MATHDASH_LOG";

/// timed arithmetic drills in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed mental arithmetic drills in the terminal: ten topics, four difficulty tiers, per-topic high scores."
)]
pub struct Cli {
    /// topic to drill
    #[clap(short = 't', long, value_enum)]
    topic: Option<Topic>,

    /// difficulty tier
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of seconds per drill (1-300)
    #[clap(short = 's', long)]
    seconds: Option<u32>,

    /// countdown seconds before the first question, 0 to skip
    #[clap(long)]
    countdown: Option<u32>,

    /// seed the question generator for a repeatable drill
    #[clap(long)]
    seed: Option<u64>,

    /// keep high scores for this run only
    #[clap(long)]
    in_memory: bool,

    /// no terminal bell
    #[clap(long)]
    mute: bool,
}

impl Cli {
    /// Flags win over the saved config for this run
    fn apply(&self, mut config: Config) -> Config {
        if let Some(topic) = self.topic {
            config.topic = topic;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(secs) = self.seconds {
            config.timer_secs = secs;
        }
        if let Some(countdown) = self.countdown {
            config.countdown_secs = countdown;
        }
        if self.mute {
            config.sound = false;
        }
        config.normalized()
    }

    fn build_drill(&self, config: &Config) -> Drill {
        let drill = if self.in_memory {
            Drill::new(InMemoryHighScores::new())
        } else {
            match SqliteHighScores::open_default() {
                Ok(store) => Drill::new(store),
                Err(e) => {
                    warn!(error = %e, "high score database unavailable, scores kept in memory");
                    Drill::new(InMemoryHighScores::new())
                }
            }
        };
        let drill = match self.seed {
            Some(seed) => drill.with_source(RngSource::seeded(seed)),
            None => drill,
        };
        if config.sound {
            drill.with_feedback(BellFeedback)
        } else {
            drill.with_feedback(Silent)
        }
    }
}

/// Log to a file; the terminal belongs to the TUI
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    info!(?config, "starting");
    let drill = cli.build_drill(&config);
    let mut app = App::new(drill, config).with_config_store(config_store);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock::new();
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    run_loop(terminal, app, &runner, &clock)
}

fn run_loop<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
    clock: &dyn Clock,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::screen::draw(app, f))?;

        match runner.step() {
            HostEvent::Tick | HostEvent::Resize => {}
            HostEvent::Key(key) => {
                if app.on_key(key, clock.now()) == Action::Quit {
                    break;
                }
            }
        }
        app.on_frame(clock.now());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use mathdash::clock::ManualClock;
    use mathdash::runtime::ChannelEventSource;
    use mathdash::source::ScriptedSource;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    #[test]
    fn test_cli_defaults_leave_config_alone() {
        let cli = Cli::parse_from(["mathdash"]);
        assert_eq!(cli.apply(Config::default()), Config::default());
        assert!(!cli.in_memory);
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "mathdash",
            "--topic",
            "square-root",
            "-d",
            "expert",
            "-s",
            "999",
            "--countdown",
            "0",
            "--mute",
        ]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.topic, Topic::SquareRoot);
        assert_eq!(cfg.difficulty, Difficulty::Expert);
        assert_eq!(cfg.timer_secs, 300);
        assert_eq!(cfg.countdown_secs, 0);
        assert!(!cfg.sound);
    }

    #[test]
    fn test_cli_rejects_unknown_topic() {
        assert!(Cli::try_parse_from(["mathdash", "--topic", "logarithms"]).is_err());
    }

    #[test]
    fn test_run_loop_headless() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let clock = ManualClock::new();
        let drill = Drill::new(InMemoryHighScores::new()).with_source(ScriptedSource::new(vec![3, 4]));
        let config = Config {
            countdown_secs: 0,
            answer_delay_ms: 0,
            ..Config::default()
        };
        let mut app = App::new(drill, config);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        for code in [
            KeyCode::Enter,
            KeyCode::Char('7'),
            KeyCode::Enter,
            KeyCode::Esc,
            KeyCode::Esc,
        ] {
            tx.send(HostEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
                .unwrap();
        }

        run_loop(&mut terminal, &mut app, &runner, &clock).unwrap();

        let summary = app.drill.summary().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.total_questions, 1);
    }
}
