use crate::PERTURBATION_EPSILON;
use crate::Probability;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::cell::Cell;

/// deterministic infinitesimal tiebreaker.
///
/// each draw perturbs a value by a relative 1e-10 jitter taken from a
/// counter-indexed pseudo-random stream. the counter resets to 0 at
/// every top-level allocation entry, so identical inputs always see
/// identical perturbations. the jitter's only role is to break exact
/// ties before they reach an ordered map.
#[derive(Debug, Default)]
pub struct Perturbation {
    counter: Cell<u64>,
}

impl Perturbation {
    pub fn reset(&self) {
        self.counter.set(0);
    }

    /// value + value * 1e-10 * (u - 0.5), u the counter-indexed draw
    pub fn value(&self, value: f64) -> f64 {
        self.counter.set(self.counter.get() + 1);
        let draw = Self::indexed(self.counter.get());
        value + value * PERTURBATION_EPSILON * (draw - 0.5)
    }

    /// same, clamped back into [0, 1]
    pub fn probability(&self, probability: Probability) -> Probability {
        self.value(probability).clamp(0.0, 1.0)
    }

    /// i-th element of the scalar pseudo-random sequence
    fn indexed(i: u64) -> f64 {
        SmallRng::seed_from_u64(i).random::<f64>()
    }
}
