use anyhow::{Result, ensure};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Module, VarBuilder, VarMap};
use nl_candle_lm::{
    optimizer::OptimizerWithMaxGrad,
    sequential::{Sequential, build_sequential},
};
use nl_core::{
    agents::{Agent, Memory},
    rng::RNG,
};
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DqnParams {
    pub gamma: f32,
    pub learning_rate: f64,
    pub memory_size: usize,
    pub batch_size: usize,
    pub exploration_max: f32,
    pub exploration_min: f32,
    pub exploration_decay: f32,
    pub hidden_layers: Vec<usize>,
    pub max_grad_norm: Option<f32>,
}

impl Default for DqnParams {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            learning_rate: 1e-3,
            memory_size: 100_000,
            batch_size: 20,
            exploration_max: 1.0,
            exploration_min: 0.01,
            exploration_decay: 0.995,
            hidden_layers: vec![24, 24],
            max_grad_norm: Some(10.),
        }
    }
}

/// Epsilon greedy deep Q learning with experience replay.
pub struct DqnAgent {
    q_net: Sequential,
    optimizer: OptimizerWithMaxGrad,
    memory: VecDeque<Memory<Vec<f32>, usize>>,
    params: DqnParams,
    exploration_rate: f32,
    observation_size: usize,
    action_size: usize,
    device: Device,
    last_loss: f32,
    debug: bool,
}

impl DqnAgent {
    pub fn new(
        observation_size: usize,
        action_size: usize,
        params: DqnParams,
        debug: bool,
    ) -> Result<Self> {
        ensure!(params.memory_size > 0, "replay memory needs room for at least one transition");
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let layers = [&params.hidden_layers[..], &[action_size]].concat();
        let q_net = build_sequential(observation_size, &layers, &vb, "q")?;
        let optimizer =
            OptimizerWithMaxGrad::new(varmap, params.learning_rate, params.max_grad_norm)?;
        Ok(Self {
            q_net,
            optimizer,
            memory: VecDeque::with_capacity(params.memory_size.min(4096)),
            exploration_rate: params.exploration_max,
            params,
            observation_size,
            action_size,
            device,
            last_loss: 0.,
            debug,
        })
    }

    pub fn exploration_rate(&self) -> f32 {
        self.exploration_rate
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    fn batch_tensor(&self, rows: Vec<f32>, batch: usize) -> Result<Tensor> {
        Ok(Tensor::from_vec(rows, (batch, self.observation_size), &self.device)?)
    }
}

impl Agent for DqnAgent {
    type Observation = Vec<f32>;
    type Action = usize;

    fn act(&mut self, observation: &Vec<f32>) -> Result<usize> {
        let explore = RNG.with_borrow_mut(|rng| rng.random::<f32>() < self.exploration_rate);
        if explore {
            return Ok(RNG.with_borrow_mut(|rng| rng.random_range(0..self.action_size)));
        }
        let observation = Tensor::from_slice(observation, (1, self.observation_size), &self.device)?;
        let action = self
            .q_net
            .forward(&observation)?
            .argmax(1)?
            .squeeze(0)?
            .to_scalar::<u32>()?;
        Ok(action as usize)
    }

    fn remember(&mut self, memory: Memory<Vec<f32>, usize>) {
        while self.memory.len() >= self.params.memory_size {
            self.memory.pop_front();
        }
        self.memory.push_back(memory);
    }

    fn reflect(&mut self) -> Result<()> {
        let batch_size = self.params.batch_size;
        if self.memory.len() < batch_size {
            return Ok(());
        }
        let indices = RNG.with_borrow_mut(|rng| {
            rand::seq::index::sample(rng, self.memory.len(), batch_size).into_vec()
        });
        let batch: Vec<&Memory<Vec<f32>, usize>> =
            indices.iter().map(|idx| &self.memory[*idx]).collect();

        let states: Vec<f32> = batch.iter().flat_map(|m| m.state.iter().copied()).collect();
        // terminal transitions bootstrap from zero, their successor row is a placeholder
        let next_states: Vec<f32> = batch
            .iter()
            .flat_map(|m| match &m.next_state {
                Some(state) => state.clone(),
                None => vec![0.; self.observation_size],
            })
            .collect();
        let not_done: Vec<f32> = batch
            .iter()
            .map(|m| if m.next_state.is_some() { 1. } else { 0. })
            .collect();
        let rewards: Vec<f32> = batch.iter().map(|m| m.reward).collect();
        let actions: Vec<u32> = batch.iter().map(|m| m.action as u32).collect();

        let states = self.batch_tensor(states, batch_size)?;
        let next_states = self.batch_tensor(next_states, batch_size)?;
        let not_done = Tensor::from_vec(not_done, batch_size, &self.device)?;
        let rewards = Tensor::from_vec(rewards, batch_size, &self.device)?;
        let actions = Tensor::from_vec(actions, (batch_size, 1), &self.device)?;

        let next_q = self.q_net.forward(&next_states)?.max(1)?.detach();
        let targets = rewards.add(&(next_q.mul(&not_done)? * self.params.gamma as f64)?)?;
        let q = self
            .q_net
            .forward(&states)?
            .gather(&actions, 1)?
            .squeeze(1)?;
        let loss = q.sub(&targets)?.sqr()?.mean_all()?;
        self.optimizer.backward_step(&loss)?;

        self.last_loss = loss.to_scalar::<f32>()?;
        self.exploration_rate =
            (self.exploration_rate * self.params.exploration_decay).max(self.params.exploration_min);
        if self.debug {
            debug!(
                loss = self.last_loss,
                exploration = self.exploration_rate,
                "dqn update"
            );
        }
        Ok(())
    }

    fn last_loss(&self) -> f32 {
        self.last_loss
    }
}
