use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{
    Module, VarBuilder, VarMap,
    ops::{log_softmax, softmax},
};
use nl_candle_lm::{
    optimizer::OptimizerWithMaxGrad,
    sequential::{Sequential, build_sequential},
};
use nl_core::{
    agents::{Agent, Memory},
    rng::RNG,
};
use rand::distr::{Distribution, weighted::WeightedIndex};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct A2cParams {
    pub gamma: f32,
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    pub hidden_layers: Vec<usize>,
    pub max_grad_norm: Option<f32>,
}

impl Default for A2cParams {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            actor_learning_rate: 1e-3,
            critic_learning_rate: 5e-3,
            hidden_layers: vec![24],
            max_grad_norm: Some(0.5),
        }
    }
}

/// One step advantage actor-critic. The actor and the critic have separate networks and
/// optimizers, `reflect` learns from the latest remembered transition only.
pub struct A2cAgent {
    actor: Sequential,
    critic: Sequential,
    actor_optimizer: OptimizerWithMaxGrad,
    critic_optimizer: OptimizerWithMaxGrad,
    transition: Option<Memory<Vec<f32>, usize>>,
    gamma: f32,
    observation_size: usize,
    device: Device,
    last_loss: f32,
    debug: bool,
}

impl A2cAgent {
    pub fn new(
        observation_size: usize,
        action_size: usize,
        params: A2cParams,
        debug: bool,
    ) -> Result<Self> {
        let device = Device::Cpu;

        let actor_varmap = VarMap::new();
        let actor_vb = VarBuilder::from_varmap(&actor_varmap, DType::F32, &device);
        let actor_layers = [&params.hidden_layers[..], &[action_size]].concat();
        let actor = build_sequential(observation_size, &actor_layers, &actor_vb, "actor")?;

        let critic_varmap = VarMap::new();
        let critic_vb = VarBuilder::from_varmap(&critic_varmap, DType::F32, &device);
        let critic_layers = [&params.hidden_layers[..], &[1]].concat();
        let critic = build_sequential(observation_size, &critic_layers, &critic_vb, "critic")?;

        Ok(Self {
            actor,
            critic,
            actor_optimizer: OptimizerWithMaxGrad::new(
                actor_varmap,
                params.actor_learning_rate,
                params.max_grad_norm,
            )?,
            critic_optimizer: OptimizerWithMaxGrad::new(
                critic_varmap,
                params.critic_learning_rate,
                params.max_grad_norm,
            )?,
            transition: None,
            gamma: params.gamma,
            observation_size,
            device,
            last_loss: 0.,
            debug,
        })
    }

    fn observation_tensor(&self, observation: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(
            observation,
            (1, self.observation_size),
            &self.device,
        )?)
    }

    fn value(&self, observation: &Tensor) -> Result<Tensor> {
        Ok(self.critic.forward(observation)?.squeeze(1)?)
    }
}

impl Agent for A2cAgent {
    type Observation = Vec<f32>;
    type Action = usize;

    fn act(&mut self, observation: &Vec<f32>) -> Result<usize> {
        let observation = self.observation_tensor(observation)?;
        let logits = self.actor.forward(&observation)?;
        let action_probs: Vec<f32> = softmax(&logits, 1)?.squeeze(0)?.to_vec1()?;
        let distribution = WeightedIndex::new(&action_probs)?;
        Ok(RNG.with_borrow_mut(|rng| distribution.sample(rng)))
    }

    fn remember(&mut self, memory: Memory<Vec<f32>, usize>) {
        self.transition = Some(memory);
    }

    fn reflect(&mut self) -> Result<()> {
        let Some(Memory {
            state,
            action,
            reward,
            next_state,
            ..
        }) = self.transition.take()
        else {
            return Ok(());
        };
        let state = self.observation_tensor(&state)?;
        let value = self.value(&state)?;
        let next_value = match next_state {
            Some(next_state) => self.value(&self.observation_tensor(&next_state)?)?.detach(),
            None => Tensor::zeros(1, DType::F32, &self.device)?,
        };
        let target = ((next_value * self.gamma as f64)? + reward as f64)?;
        let advantage = target.sub(&value)?;
        let critic_loss = advantage.sqr()?.mean_all()?;

        let log_probs = log_softmax(&self.actor.forward(&state)?, 1)?;
        let action = Tensor::new(&[[action as u32]], &self.device)?;
        let log_prob = log_probs.gather(&action, 1)?.squeeze(1)?;
        let actor_loss = log_prob.mul(&advantage.detach())?.neg()?.mean_all()?;

        self.actor_optimizer.backward_step(&actor_loss)?;
        self.critic_optimizer.backward_step(&critic_loss)?;
        let (actor_loss, critic_loss) = (
            actor_loss.to_scalar::<f32>()?,
            critic_loss.to_scalar::<f32>()?,
        );
        self.last_loss = actor_loss + critic_loss;
        if self.debug {
            debug!(actor_loss, critic_loss, "a2c update");
        }
        Ok(())
    }

    fn last_loss(&self) -> f32 {
        self.last_loss
    }
}
