use crate::config::NoiseLearningConfig;
use nl_core::{
    error::ConfigError,
    estimator::RunningEstimator,
    swap::{NeighborSwap, NeverSwap, SwapPolicy},
};

/// The swap policies selectable from configuration.
#[derive(Debug, Clone, Copy)]
pub enum SwapPolicyKind {
    Never(NeverSwap),
    Neighbor(NeighborSwap),
}

impl SwapPolicyKind {
    pub fn from_config(config: &NoiseLearningConfig) -> Result<Self, ConfigError> {
        if !config.enable_exchange {
            return Ok(Self::Never(NeverSwap));
        }
        let margin = config.swap_margin.ok_or(ConfigError::MissingSwapMargin)?;
        Ok(Self::Neighbor(NeighborSwap::new(margin as f64)))
    }
}

impl SwapPolicy for SwapPolicyKind {
    fn decide_swap(&mut self, estimators: &[&RunningEstimator]) -> Option<Vec<usize>> {
        match self {
            Self::Never(policy) => policy.decide_swap(estimators),
            Self::Neighbor(policy) => policy.decide_swap(estimators),
        }
    }
}
