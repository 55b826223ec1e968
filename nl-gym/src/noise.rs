use anyhow::Result;
use nl_core::{
    env::{Env, EnvironmentDescription, SnapShot},
    rng::sample_standard_normal,
};

/// Adds zero-mean Gaussian noise with a fixed standard deviation to every observation of the
/// wrapped environment.
#[derive(Debug, Clone)]
pub struct NoisyEnv<E> {
    env: E,
    noise_std_dev: f32,
}

impl<E> NoisyEnv<E> {
    pub fn new(env: E, noise_std_dev: f32) -> Self {
        Self { env, noise_std_dev }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    fn perturb(&self, mut observation: Vec<f32>) -> Vec<f32> {
        if self.noise_std_dev > 0. {
            for value in observation.iter_mut() {
                *value += self.noise_std_dev * sample_standard_normal();
            }
        }
        observation
    }
}

impl<E: Env<Observation = Vec<f32>>> Env for NoisyEnv<E> {
    type Observation = Vec<f32>;
    type Action = E::Action;

    fn reset(&mut self) -> Result<Vec<f32>> {
        let observation = self.env.reset()?;
        Ok(self.perturb(observation))
    }

    fn step(&mut self, action: &E::Action) -> Result<SnapShot<Vec<f32>>> {
        let mut snapshot = self.env.step(action)?;
        snapshot.state = self.perturb(std::mem::take(&mut snapshot.state));
        Ok(snapshot)
    }

    fn env_description(&self) -> EnvironmentDescription {
        self.env.env_description()
    }

    fn noise_std_dev(&self) -> f32 {
        self.noise_std_dev
    }
}
