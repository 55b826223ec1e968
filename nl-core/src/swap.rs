use crate::{error::SwapError, estimator::RunningEstimator};

/// Decides whether agents should change noise slots.
///
/// `estimators[slot]` is the estimator of the agent currently occupying `slot`. A returned plan
/// `p` moves the agent found in slot `p[slot]` into `slot`.
pub trait SwapPolicy {
    fn decide_swap(&mut self, estimators: &[&RunningEstimator]) -> Option<Vec<usize>>;
}

impl<P: SwapPolicy + ?Sized> SwapPolicy for Box<P> {
    fn decide_swap(&mut self, estimators: &[&RunningEstimator]) -> Option<Vec<usize>> {
        (**self).decide_swap(estimators)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSwap;

impl SwapPolicy for NeverSwap {
    fn decide_swap(&mut self, _estimators: &[&RunningEstimator]) -> Option<Vec<usize>> {
        None
    }
}

/// Exchanges neighbouring agents when the one facing more noise outperforms the one below it by
/// more than `margin`.
#[derive(Debug, Clone, Copy)]
pub struct NeighborSwap {
    pub margin: f64,
    pub min_observations: usize,
}

impl NeighborSwap {
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            min_observations: 1,
        }
    }

    pub fn with_min_observations(mut self, min_observations: usize) -> Self {
        self.min_observations = min_observations;
        self
    }
}

impl SwapPolicy for NeighborSwap {
    fn decide_swap(&mut self, estimators: &[&RunningEstimator]) -> Option<Vec<usize>> {
        let mut plan: Vec<usize> = (0..estimators.len()).collect();
        let mut swapped = false;
        let mut slot = 0;
        while slot + 1 < estimators.len() {
            let (lower, higher) = (estimators[slot], estimators[slot + 1]);
            let observed = lower.count >= self.min_observations
                && higher.count >= self.min_observations;
            if observed && higher.mean - lower.mean > self.margin {
                plan.swap(slot, slot + 1);
                swapped = true;
                slot += 2;
            } else {
                slot += 1;
            }
        }
        swapped.then_some(plan)
    }
}

/// Checks that `plan` is a permutation of `0..slots`.
pub fn validate_plan(plan: &[usize], slots: usize) -> Result<(), SwapError> {
    if plan.len() != slots {
        return Err(SwapError::WrongLength {
            expected: slots,
            got: plan.len(),
        });
    }
    let mut seen = vec![false; slots];
    for &source in plan {
        if source >= slots || seen[source] {
            return Err(SwapError::NotAPermutation(plan.to_vec()));
        }
        seen[source] = true;
    }
    Ok(())
}

pub fn is_identity(plan: &[usize]) -> bool {
    plan.iter().enumerate().all(|(slot, source)| slot == *source)
}
