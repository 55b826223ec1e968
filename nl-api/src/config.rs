use anyhow::{Context, Result};
use nl_agents::AgentKind;
use nl_core::{config::OrchestratorConfig, error::ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to run one experiment. Unset fields of a config file fall back to the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLearningConfig {
    pub env_name: String,
    pub agent: AgentKind,
    pub agents_number: usize,
    pub noise_env_step: f32,
    pub enable_exchange: bool,
    /// How much better the noisier neighbour has to be before agents are exchanged.
    pub swap_margin: Option<f32>,
    pub metrics_number_of_elements: usize,
    pub metrics_number_of_iterations: usize,
    pub max_episode_steps: Option<usize>,
    pub training_episodes: usize,
    pub seed: Option<u64>,
    pub debug: bool,
}

impl Default for NoiseLearningConfig {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            env_name: "CartPole-v1".into(),
            agent: AgentKind::Dqn,
            agents_number: orchestrator.agents_number,
            noise_env_step: orchestrator.noise_env_step,
            enable_exchange: false,
            swap_margin: None,
            metrics_number_of_elements: orchestrator.metrics_number_of_elements,
            metrics_number_of_iterations: orchestrator.metrics_number_of_iterations,
            max_episode_steps: orchestrator.max_episode_steps,
            training_episodes: 500,
            seed: None,
            debug: false,
        }
    }
}

impl NoiseLearningConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents)?;
        // surface a bad selector as a config error rather than a toml one
        if let Some(agent) = table.get("agent").and_then(toml::Value::as_str) {
            agent.parse::<AgentKind>()?;
        }
        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            agents_number: self.agents_number,
            noise_env_step: self.noise_env_step,
            metrics_number_of_elements: self.metrics_number_of_elements,
            metrics_number_of_iterations: self.metrics_number_of_iterations,
            max_episode_steps: self.max_episode_steps,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.orchestrator_config().validate()?;
        match (self.enable_exchange, self.swap_margin) {
            (true, None) => Err(ConfigError::MissingSwapMargin),
            (_, Some(margin)) if !margin.is_finite() || margin < 0. => {
                Err(ConfigError::SwapMargin(margin))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::NoiseLearningConfig;
    use anyhow::Result;
    use nl_agents::AgentKind;
    use nl_core::error::ConfigError;

    #[test]
    fn defaults_follow_the_command_line() {
        let config = NoiseLearningConfig::default();
        assert_eq!(config.agents_number, 10);
        assert_eq!(config.env_name, "CartPole-v1");
        assert_eq!(config.agent, AgentKind::Dqn);
        assert_eq!(config.metrics_number_of_elements, 100);
        assert_eq!(config.metrics_number_of_iterations, 50);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn partial_toml_keeps_defaults() -> Result<()> {
        let config = NoiseLearningConfig::from_toml_str(
            r#"
            agent = "A2C"
            agents_number = 3
            enable_exchange = true
            swap_margin = 5.0
            "#,
        )?;
        assert_eq!(config.agent, AgentKind::A2c);
        assert_eq!(config.agents_number, 3);
        assert_eq!(config.swap_margin, Some(5.0));
        assert_eq!(config.noise_env_step, 0.1);
        Ok(())
    }

    #[test]
    fn unknown_agent_in_toml_is_rejected() {
        let err = NoiseLearningConfig::from_toml_str(r#"agent = "PPO""#)
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownAgent("PPO".into()))
        );
    }

    #[test]
    fn agent_selector_in_toml_ignores_case() -> Result<()> {
        let config = NoiseLearningConfig::from_toml_str(r#"agent = "dqn""#)?;
        assert_eq!(config.agent, AgentKind::Dqn);
        let config = NoiseLearningConfig::from_toml_str(r#"agent = "a2C""#)?;
        assert_eq!(config.agent, AgentKind::A2c);
        Ok(())
    }

    #[test]
    fn agent_selector_is_written_uppercase() -> Result<()> {
        let config = NoiseLearningConfig {
            agent: AgentKind::A2c,
            ..Default::default()
        };
        let written = toml::to_string(&config)?;
        assert!(written.contains(r#"agent = "A2C""#), "{written}");
        assert_eq!(NoiseLearningConfig::from_toml_str(&written)?, config);
        Ok(())
    }

    #[test]
    fn exchange_needs_a_margin() {
        let config = NoiseLearningConfig {
            enable_exchange: true,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingSwapMargin));

        let config = NoiseLearningConfig {
            enable_exchange: true,
            swap_margin: Some(-1.),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SwapMargin(-1.)));
    }

    #[test]
    fn toml_validation_errors_surface() {
        let err = NoiseLearningConfig::from_toml_str("metrics_number_of_iterations = 0")
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ReportEvery(0))
        );
    }
}
