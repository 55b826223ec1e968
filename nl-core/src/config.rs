use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings the orchestrator itself needs. Everything here is checked by `validate` before a run
/// is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub agents_number: usize,
    /// Noise standard deviation added per slot, slot `i` gets `i * noise_env_step`.
    pub noise_env_step: f32,
    /// How many of the most recent raw samples a moving average covers.
    pub metrics_number_of_elements: usize,
    /// How many raw samples between two published moving averages.
    pub metrics_number_of_iterations: usize,
    /// Upper bound on the steps of a single episode. `None` runs until the environment says done.
    pub max_episode_steps: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            agents_number: 10,
            noise_env_step: 0.1,
            metrics_number_of_elements: 100,
            metrics_number_of_iterations: 50,
            max_episode_steps: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents_number == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.metrics_number_of_elements == 0 {
            return Err(ConfigError::WindowCapacity(self.metrics_number_of_elements));
        }
        if self.metrics_number_of_iterations == 0 {
            return Err(ConfigError::ReportEvery(self.metrics_number_of_iterations));
        }
        if !self.noise_env_step.is_finite() || self.noise_env_step < 0. {
            return Err(ConfigError::NoiseStep(self.noise_env_step));
        }
        if self.noise_env_step == 0. && self.agents_number > 1 {
            return Err(ConfigError::DuplicateNoiseLevels {
                agents_number: self.agents_number,
            });
        }
        if self.max_episode_steps == Some(0) {
            return Err(ConfigError::MaxEpisodeSteps);
        }
        Ok(())
    }

    /// Noise level of every slot, strictly increasing with the slot index.
    pub fn noise_levels(&self) -> Vec<f32> {
        (0..self.agents_number)
            .map(|slot| slot as f32 * self.noise_env_step)
            .collect()
    }
}
