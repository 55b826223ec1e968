pub mod a2c;
pub mod dqn;

use a2c::{A2cAgent, A2cParams};
use anyhow::{Result, bail};
use dqn::{DqnAgent, DqnParams};
use nl_core::{
    agents::{Agent, Memory},
    env::{EnvironmentDescription, Space},
    error::ConfigError,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The learning algorithms an experiment can be run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum AgentKind {
    #[default]
    Dqn,
    A2c,
}

impl FromStr for AgentKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DQN" => Ok(Self::Dqn),
            "A2C" => Ok(Self::A2c),
            _ => Err(ConfigError::UnknownAgent(s.to_owned())),
        }
    }
}

impl TryFrom<String> for AgentKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dqn => write!(f, "DQN"),
            Self::A2c => write!(f, "A2C"),
        }
    }
}

impl AgentKind {
    /// Creates a fresh agent for an environment described by `description`. Only discrete action
    /// spaces are supported.
    pub fn build(
        &self,
        description: &EnvironmentDescription,
        debug: bool,
    ) -> Result<NoiseLearningAgent> {
        let Space::Discrete(action_size) = description.action_space else {
            bail!("{self} agents need a discrete action space");
        };
        let observation_size = description.observation_size();
        Ok(match self {
            Self::Dqn => NoiseLearningAgent::Dqn(DqnAgent::new(
                observation_size,
                action_size,
                DqnParams::default(),
                debug,
            )?),
            Self::A2c => NoiseLearningAgent::A2c(A2cAgent::new(
                observation_size,
                action_size,
                A2cParams::default(),
                debug,
            )?),
        })
    }
}

pub enum NoiseLearningAgent {
    Dqn(DqnAgent),
    A2c(A2cAgent),
}

impl NoiseLearningAgent {
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::Dqn(_) => AgentKind::Dqn,
            Self::A2c(_) => AgentKind::A2c,
        }
    }
}

impl Agent for NoiseLearningAgent {
    type Observation = Vec<f32>;
    type Action = usize;

    fn act(&mut self, observation: &Vec<f32>) -> Result<usize> {
        match self {
            Self::Dqn(agent) => agent.act(observation),
            Self::A2c(agent) => agent.act(observation),
        }
    }

    fn remember(&mut self, memory: Memory<Vec<f32>, usize>) {
        match self {
            Self::Dqn(agent) => agent.remember(memory),
            Self::A2c(agent) => agent.remember(memory),
        }
    }

    fn reflect(&mut self) -> Result<()> {
        match self {
            Self::Dqn(agent) => agent.reflect(),
            Self::A2c(agent) => agent.reflect(),
        }
    }

    fn last_loss(&self) -> f32 {
        match self {
            Self::Dqn(agent) => agent.last_loss(),
            Self::A2c(agent) => agent.last_loss(),
        }
    }
}
