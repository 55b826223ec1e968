use serde::Serialize;

/// Incrementally updated mean of one agent's performance signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunningEstimator {
    pub mean: f64,
    pub count: usize,
}

impl RunningEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    // incremental mean, Welford without the variance term
    pub fn update(&mut self, x: f64) {
        self.mean += (x - self.mean) / (self.count + 1) as f64;
        self.count += 1;
    }
}
