pub mod cartpole;
#[cfg(feature = "python")]
pub mod gym;
pub mod noise;

use anyhow::Result;
use cartpole::CartPole;
use nl_core::env::{Env, EnvironmentDescription, SnapShot};
use noise::NoisyEnv;

/// Every environment this crate can build by name.
pub enum EnvKind {
    CartPole(CartPole),
    #[cfg(feature = "python")]
    Gym(gym::GymEnv),
}

impl EnvKind {
    /// Built in environments take precedence, other names go to gymnasium when the `python`
    /// feature is on.
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "CartPole-v1" => Ok(Self::CartPole(CartPole::new())),
            #[cfg(feature = "python")]
            other => Ok(Self::Gym(gym::GymEnv::new(other)?)),
            #[cfg(not(feature = "python"))]
            other => Err(nl_core::error::ConfigError::UnknownEnvironment(other.to_owned()).into()),
        }
    }
}

impl Env for EnvKind {
    type Observation = Vec<f32>;
    type Action = usize;

    fn reset(&mut self) -> Result<Vec<f32>> {
        match self {
            Self::CartPole(env) => env.reset(),
            #[cfg(feature = "python")]
            Self::Gym(env) => env.reset(),
        }
    }

    fn step(&mut self, action: &usize) -> Result<SnapShot<Vec<f32>>> {
        match self {
            Self::CartPole(env) => env.step(action),
            #[cfg(feature = "python")]
            Self::Gym(env) => env.step(action),
        }
    }

    fn env_description(&self) -> EnvironmentDescription {
        match self {
            Self::CartPole(env) => env.env_description(),
            #[cfg(feature = "python")]
            Self::Gym(env) => env.env_description(),
        }
    }

    fn noise_std_dev(&self) -> f32 {
        match self {
            Self::CartPole(env) => env.noise_std_dev(),
            #[cfg(feature = "python")]
            Self::Gym(env) => env.noise_std_dev(),
        }
    }
}

pub type NoisyGymEnv = NoisyEnv<EnvKind>;

/// Resolves `name` and wraps it so that observations carry noise with `noise_std_dev`.
pub fn make_env(name: &str, noise_std_dev: f32) -> Result<NoisyGymEnv> {
    Ok(NoisyEnv::new(EnvKind::by_name(name)?, noise_std_dev))
}
