use anyhow::Result;
use nl_core::{
    agents::Agent,
    env::Env,
    metrics::MetricSample,
    orchestrator::TrainingOrchestrator,
    swap::SwapPolicy,
};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct SlotReport {
    pub slot: usize,
    pub noise_std_dev: f32,
    pub agent: usize,
    pub estimator_mean: f64,
    pub estimator_count: usize,
    pub scores: Vec<MetricSample>,
    pub losses: Vec<MetricSample>,
}

/// Read only snapshot of a run, what plotting tools consume.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub episodes: usize,
    pub window_capacity: usize,
    pub report_every: usize,
    pub slots: Vec<SlotReport>,
}

impl TrainingReport {
    pub fn from_orchestrator<E, A, P>(orchestrator: &TrainingOrchestrator<E, A, P>) -> Self
    where
        E: Env,
        A: Agent<Observation = E::Observation, Action = E::Action>,
        P: SwapPolicy,
    {
        let slots: Vec<SlotReport> = orchestrator
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, noise_slot)| {
                let agent = orchestrator.occupancy()[slot];
                let estimator = &orchestrator.agent(agent).estimator;
                SlotReport {
                    slot,
                    noise_std_dev: noise_slot.env.noise_std_dev(),
                    agent,
                    estimator_mean: estimator.mean,
                    estimator_count: estimator.count,
                    scores: noise_slot.metrics.moving_average_scores().to_vec(),
                    losses: noise_slot.metrics.moving_average_losses().to_vec(),
                }
            })
            .collect();
        let (window_capacity, report_every) = orchestrator
            .slots()
            .first()
            .map(|slot| (slot.metrics.window_capacity(), slot.metrics.report_every()))
            .unwrap_or_default();
        Self {
            episodes: orchestrator.completed_episodes(),
            window_capacity,
            report_every,
            slots,
        }
    }

    /// One line per slot with the latest moving averages.
    pub fn log_summary(&self) {
        for slot in &self.slots {
            let latest_score = slot.scores.last().map(|s| s.value);
            let latest_loss = slot.losses.last().map(|s| s.value);
            info!(
                "Agent {}, Current Noise = {:.2}, slot {}: score {:?} loss {:?} estimate {:.2} ({} updates)",
                slot.agent,
                slot.noise_std_dev,
                slot.slot,
                latest_score,
                latest_loss,
                slot.estimator_mean,
                slot.estimator_count,
            );
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
