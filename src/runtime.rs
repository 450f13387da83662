use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the host loop
#[derive(Clone, Debug)]
pub enum HostEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Wait up to `timeout` for an event; `Err(Timeout)` if none arrives.
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<HostEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // key release events would double every keystroke on some terminals
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    Some(HostEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => Some(HostEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Event source fed from a channel, for tests and scripted runs
pub struct ChannelEventSource {
    rx: Receiver<HostEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<HostEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Frame interval between host ticks
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the host one event or tick at a time
pub struct Runner<E: EventSource> {
    event_source: E,
    ticker: FixedTicker,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, ticker: FixedTicker) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to one tick interval; yields `Tick` when nothing arrived
    pub fn step(&self) -> HostEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => HostEvent::Tick,
        }
    }
}

/// Turns irregular host frames into whole-second engine ticks.
///
/// Frames arrive at the ticker rate but can bunch up behind key events, so
/// seconds are counted from clock readings rather than frame counts.
#[derive(Debug, Clone, Copy)]
pub struct SecondPacer {
    last: Duration,
}

impl SecondPacer {
    pub fn new(now: Duration) -> Self {
        Self { last: now }
    }

    pub fn reset(&mut self, now: Duration) {
        self.last = now;
    }

    /// Whole seconds passed since the last call that reported any
    pub fn due(&mut self, now: Duration) -> u32 {
        let secs = now.saturating_sub(self.last).as_secs();
        self.last += Duration::from_secs(secs);
        secs as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        assert!(matches!(runner.step(), HostEvent::Tick));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(HostEvent::Resize).unwrap();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(10)),
        );

        assert!(matches!(runner.step(), HostEvent::Resize));
    }

    #[test]
    fn pacer_counts_whole_seconds_and_keeps_remainder() {
        let mut pacer = SecondPacer::new(Duration::ZERO);
        assert_eq!(pacer.due(Duration::from_millis(900)), 0);
        assert_eq!(pacer.due(Duration::from_millis(1100)), 1);
        // the 100ms past the first second still counts toward the next
        assert_eq!(pacer.due(Duration::from_millis(1950)), 0);
        assert_eq!(pacer.due(Duration::from_millis(2000)), 1);
        assert_eq!(pacer.due(Duration::from_millis(5500)), 3);
    }

    #[test]
    fn pacer_reset_discards_backlog() {
        let mut pacer = SecondPacer::new(Duration::ZERO);
        pacer.reset(Duration::from_secs(10));
        assert_eq!(pacer.due(Duration::from_millis(10_500)), 0);
        assert_eq!(pacer.due(Duration::from_secs(11)), 1);
    }
}
