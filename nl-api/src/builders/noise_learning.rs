use crate::{builders::swap_policy::SwapPolicyKind, config::NoiseLearningConfig};
use anyhow::Result;
use nl_agents::{AgentKind, NoiseLearningAgent};
use nl_core::{Algorithm, orchestrator::TrainingOrchestrator, rng::set_seed};
use nl_gym::{NoisyGymEnv, make_env};
use tracing::info;

pub type NoiseLearning = TrainingOrchestrator<NoisyGymEnv, NoiseLearningAgent, SwapPolicyKind>;

pub struct NoiseLearningBuilder {
    pub config: NoiseLearningConfig,
}

impl Default for NoiseLearningBuilder {
    fn default() -> Self {
        Self::new(NoiseLearningConfig::default())
    }
}

impl NoiseLearningBuilder {
    pub fn new(config: NoiseLearningConfig) -> Self {
        Self { config }
    }

    pub fn set_agent(&mut self, agent: AgentKind) {
        self.config.agent = agent;
    }

    pub fn set_agents_number(&mut self, agents_number: usize) {
        self.config.agents_number = agents_number;
    }

    pub fn set_max_episode_steps(&mut self, max_episode_steps: Option<usize>) {
        self.config.max_episode_steps = max_episode_steps;
    }

    pub fn enable_exchange(&mut self, swap_margin: f32) {
        self.config.enable_exchange = true;
        self.config.swap_margin = Some(swap_margin);
    }

    /// Validates the configuration, seeds the shared generator and creates every slot.
    pub fn build(&self) -> Result<NoiseLearning> {
        let config = &self.config;
        config.validate()?;
        if let Some(seed) = config.seed {
            set_seed(seed);
        }
        let swap_policy = SwapPolicyKind::from_config(config)?;
        info!(
            env = %config.env_name,
            agent = %config.agent,
            agents = config.agents_number,
            noise_step = config.noise_env_step,
            "building noise learning run"
        );
        TrainingOrchestrator::new(
            &config.orchestrator_config(),
            |noise| make_env(&config.env_name, noise),
            |description| config.agent.build(description, config.debug),
            swap_policy,
        )
    }

    /// Builds and trains for `training_episodes`. On failure the error is returned and the partial
    /// run is lost, use `build` and `train` directly to keep it.
    pub fn run(&self) -> Result<NoiseLearning> {
        let mut noise_learning = self.build()?;
        noise_learning.train(self.config.training_episodes)?;
        Ok(noise_learning)
    }
}
