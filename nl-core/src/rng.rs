// Every random draw of a run (noise injection, environment resets, exploration) goes through this
// generator so that a single seed reproduces the whole experiment.

use rand::{SeedableRng, rngs::StdRng};
use std::cell::RefCell;

thread_local! {
    pub static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
}

pub fn set_seed(seed: u64) {
    RNG.with_borrow_mut(|rng| *rng = StdRng::seed_from_u64(seed));
}

/// Standard normal sample using the Box-Muller transform.
pub fn sample_standard_normal() -> f32 {
    use rand::Rng;
    RNG.with_borrow_mut(|rng| {
        let u1: f32 = rng.random_range(f32::EPSILON..1.0);
        let u2: f32 = rng.random();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
    })
}
