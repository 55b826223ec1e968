use anyhow::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    Discrete(usize),
    Continous {
        min: Option<Vec<f32>>,
        max: Option<Vec<f32>>,
        size: usize,
    },
}

impl Space {
    pub fn continous_from_dims(dims: Vec<usize>) -> Self {
        Self::Continous {
            min: None,
            max: None,
            size: dims.iter().product(),
        }
    }

    pub fn size(&self) -> usize {
        match &self {
            Self::Discrete(size) => *size,
            Self::Continous { size, .. } => *size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDescription {
    pub observation_space: Space,
    pub action_space: Space,
}

impl EnvironmentDescription {
    pub fn new(observation_space: Space, action_space: Space) -> Self {
        Self {
            observation_space,
            action_space,
        }
    }

    pub fn action_size(&self) -> usize {
        self.action_space.size()
    }

    pub fn observation_size(&self) -> usize {
        self.observation_space.size()
    }
}

/// Free form diagnostics an environment may attach to a step.
pub type StepInfo = BTreeMap<String, f64>;

/// What the environment reports after one step.
#[derive(Debug, Clone)]
pub struct SnapShot<O> {
    pub state: O,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

impl<O> SnapShot<O> {
    pub fn new(state: O, reward: f32, terminated: bool, truncated: bool) -> Self {
        Self {
            state,
            reward,
            terminated,
            truncated,
            info: StepInfo::new(),
        }
    }

    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

pub trait Env {
    type Observation: Clone;
    type Action;

    fn reset(&mut self) -> Result<Self::Observation>;
    fn step(&mut self, action: &Self::Action) -> Result<SnapShot<Self::Observation>>;
    fn env_description(&self) -> EnvironmentDescription;

    /// Standard deviation of the noise injected into this environment instance.
    fn noise_std_dev(&self) -> f32;
}

#[cfg(test)]
mod test {
    use super::{EnvironmentDescription, SnapShot, Space};

    #[test]
    fn space_sizes() {
        let description = EnvironmentDescription::new(
            Space::continous_from_dims(vec![2, 3]),
            Space::Discrete(4),
        );
        assert_eq!(description.observation_size(), 6);
        assert_eq!(description.action_size(), 4);
    }

    #[test]
    fn truncation_counts_as_done() {
        let snapshot = SnapShot::new((), 1., false, true);
        assert!(snapshot.done());
        assert!(!SnapShot::new((), 1., false, false).done());
    }
}
