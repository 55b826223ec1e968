use crate::error::ConfigError;
use serde::Serialize;
use std::collections::VecDeque;

/// One published moving average, tagged with the iteration of the sample that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSample {
    pub iteration: usize,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Score,
    Loss,
}

/// Raw window and published averages for one metric kind.
#[derive(Debug, Clone)]
struct MetricTrack {
    window: VecDeque<f32>,
    received: usize,
    published: Vec<MetricSample>,
}

impl MetricTrack {
    fn new(window_capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_capacity),
            received: 0,
            published: vec![],
        }
    }

    fn push(
        &mut self,
        value: f32,
        iteration: usize,
        window_capacity: usize,
        report_every: usize,
    ) -> Option<MetricSample> {
        if self.window.len() == window_capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.received += 1;
        if self.received % report_every != 0 {
            return None;
        }
        let mean = self.window.iter().sum::<f32>() / self.window.len() as f32;
        let sample = MetricSample {
            iteration,
            value: mean,
        };
        self.published.push(sample);
        Some(sample)
    }
}

/// Sliding window over the recent scores and losses of one slot, publishing a moving average every
/// `report_every` raw samples.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    window_capacity: usize,
    report_every: usize,
    scores: MetricTrack,
    losses: MetricTrack,
}

impl MetricsAggregator {
    pub fn new(window_capacity: usize, report_every: usize) -> Result<Self, ConfigError> {
        if window_capacity == 0 {
            return Err(ConfigError::WindowCapacity(window_capacity));
        }
        if report_every == 0 {
            return Err(ConfigError::ReportEvery(report_every));
        }
        Ok(Self {
            window_capacity,
            report_every,
            scores: MetricTrack::new(window_capacity),
            losses: MetricTrack::new(window_capacity),
        })
    }

    pub fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    pub fn report_every(&self) -> usize {
        self.report_every
    }

    /// Records a raw sample, returns the moving average if this sample completed a cadence.
    pub fn add(&mut self, kind: MetricKind, value: f32, iteration: usize) -> Option<MetricSample> {
        let (window_capacity, report_every) = (self.window_capacity, self.report_every);
        self.track_mut(kind)
            .push(value, iteration, window_capacity, report_every)
    }

    pub fn add_score(&mut self, value: f32, iteration: usize) -> Option<MetricSample> {
        self.add(MetricKind::Score, value, iteration)
    }

    pub fn add_loss(&mut self, value: f32, iteration: usize) -> Option<MetricSample> {
        self.add(MetricKind::Loss, value, iteration)
    }

    pub fn moving_averages(&self, kind: MetricKind) -> &[MetricSample] {
        &self.track(kind).published
    }

    pub fn moving_average_scores(&self) -> &[MetricSample] {
        self.moving_averages(MetricKind::Score)
    }

    pub fn moving_average_losses(&self) -> &[MetricSample] {
        self.moving_averages(MetricKind::Loss)
    }

    /// Number of raw samples received so far for `kind`.
    pub fn received(&self, kind: MetricKind) -> usize {
        self.track(kind).received
    }

    fn track(&self, kind: MetricKind) -> &MetricTrack {
        match kind {
            MetricKind::Score => &self.scores,
            MetricKind::Loss => &self.losses,
        }
    }

    fn track_mut(&mut self, kind: MetricKind) -> &mut MetricTrack {
        match kind {
            MetricKind::Score => &mut self.scores,
            MetricKind::Loss => &mut self.losses,
        }
    }
}
