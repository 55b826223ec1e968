pub mod agents;
pub mod config;
pub mod env;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod orchestrator;
pub mod rng;
pub mod swap;

use anyhow::Result;

/// A training procedure that runs for a fixed number of episodes. `TrainingOrchestrator` is the
/// only implementor for now.
pub trait Algorithm {
    fn train(&mut self, training_episodes: usize) -> Result<()>;
}
