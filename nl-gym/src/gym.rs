use anyhow::{Result, bail};
use nl_core::env::{Env, EnvironmentDescription, SnapShot, Space};
use pyo3::{
    PyObject, Python,
    types::{PyAnyMethods, PyDict},
};

/// A `gymnasium` environment driven through the embedded Python interpreter. Only discrete action
/// spaces are supported.
pub struct GymEnv {
    env: PyObject,
    action_space: Space,
    observation_space: Space,
}

impl GymEnv {
    pub fn new(name: &str) -> Result<GymEnv> {
        Python::with_gil(|py| {
            let gym = py.import("gymnasium")?;
            let env = gym.getattr("make")?.call1((name,))?;
            let gym_spaces = py.import("gymnasium.spaces")?;
            let action_space = env.getattr("action_space")?;
            if !action_space.is_instance(&gym_spaces.getattr("Discrete")?)? {
                bail!("{name} does not have a discrete action space");
            }
            let action_space = Space::Discrete(action_space.getattr("n")?.extract()?);
            let observation_dims: Vec<usize> =
                env.getattr("observation_space")?.getattr("shape")?.extract()?;
            Ok(GymEnv {
                env: env.into(),
                action_space,
                observation_space: Space::continous_from_dims(observation_dims),
            })
        })
    }
}

impl Env for GymEnv {
    type Observation = Vec<f32>;
    type Action = usize;

    fn reset(&mut self) -> Result<Vec<f32>> {
        let seed: u64 = nl_core::rng::RNG.with_borrow_mut(|rng| rand::Rng::random(rng));
        Python::with_gil(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("seed", seed)?;
            let state = self.env.call_method(py, "reset", (), Some(&kwargs))?;
            Ok(state.bind(py).get_item(0)?.extract()?)
        })
    }

    fn step(&mut self, action: &usize) -> Result<SnapShot<Vec<f32>>> {
        Python::with_gil(|py| {
            let step = self.env.call_method1(py, "step", (*action,))?;
            let step = step.bind(py);
            let state: Vec<f32> = step.get_item(0)?.extract()?;
            let reward: f32 = step.get_item(1)?.extract()?;
            let terminated: bool = step.get_item(2)?.extract()?;
            let truncated: bool = step.get_item(3)?.extract()?;
            Ok(SnapShot::new(state, reward, terminated, truncated))
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(self.observation_space.clone(), self.action_space.clone())
    }

    fn noise_std_dev(&self) -> f32 {
        0.
    }
}
