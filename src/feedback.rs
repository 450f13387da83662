use std::sync::{Arc, Mutex};

/// Sound cues the drill asks its host to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    CountdownBeep,
    Go,
    Correct,
    Wrong,
    NewHighScore,
}

/// Audio capability supplied by the host. Playback must not block.
pub trait AudioFeedback {
    fn play(&mut self, cue: Cue);
}

/// Plays nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioFeedback for Silent {
    fn play(&mut self, _cue: Cue) {}
}

/// Remembers every cue; clones share the log
#[derive(Debug, Clone, Default)]
pub struct CueLog {
    cues: Arc<Mutex<Vec<Cue>>>,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl AudioFeedback for CueLog {
    fn play(&mut self, cue: Cue) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(cue);
        }
    }
}
