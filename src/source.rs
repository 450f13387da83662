use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// Where problem operands come from.
///
/// Production code draws from a real RNG; tests and replays inject a
/// [`ScriptedSource`] so a session's questions are known in advance.
pub trait NumberSource {
    /// Uniform draw from `low..=high`. Returns `low` when the range is empty.
    fn draw(&mut self, low: u32, high: u32) -> u32;
}

/// [`NumberSource`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> NumberSource for RngSource<R> {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Replays a fixed list of draws in order.
///
/// Each value is clamped into the requested range. Once the script runs dry
/// every draw returns the low end of its range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    draws: VecDeque<u32>,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = u32>>(draws: I) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }
}

impl NumberSource for ScriptedSource {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        match self.draws.pop_front() {
            Some(v) => v.clamp(low, high.max(low)),
            None => low,
        }
    }
}
