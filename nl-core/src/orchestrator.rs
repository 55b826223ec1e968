use crate::{
    Algorithm,
    agents::{Agent, Memory},
    config::OrchestratorConfig,
    env::{Env, EnvironmentDescription},
    estimator::RunningEstimator,
    metrics::MetricsAggregator,
    swap::{NeverSwap, SwapPolicy, is_identity, validate_plan},
};
use anyhow::Result;
use tracing::{debug, info, warn};

/// A fixed noise level together with the environment and learning curve that belong to it.
#[derive(Debug)]
pub struct NoiseSlot<E> {
    pub noise_level: f32,
    pub env: E,
    pub metrics: MetricsAggregator,
}

/// An agent and the estimate of how well it performs. Both move together when slots change hands.
#[derive(Debug)]
pub struct AgentEntry<A> {
    pub agent: A,
    pub estimator: RunningEstimator,
}

/// Trains one agent per noise slot, one episode at a time, and lets a `SwapPolicy` reassign
/// agents between slots after every episode.
///
/// Agents are addressed through `occupancy`, so a swap only permutes indices. Noise levels,
/// environments and metrics never leave their slot.
pub struct TrainingOrchestrator<E, A, P = NeverSwap> {
    slots: Vec<NoiseSlot<E>>,
    agents: Vec<AgentEntry<A>>,
    occupancy: Vec<usize>,
    swap_policy: P,
    pending_swap: Option<Vec<usize>>,
    max_episode_steps: Option<usize>,
    completed_episodes: usize,
}

impl<E, A, P> TrainingOrchestrator<E, A, P>
where
    E: Env,
    A: Agent<Observation = E::Observation, Action = E::Action>,
    P: SwapPolicy,
{
    /// Builds `config.agents_number` slots. `make_env` receives the noise level of the slot it
    /// creates, `make_agent` the description of that environment.
    pub fn new(
        config: &OrchestratorConfig,
        mut make_env: impl FnMut(f32) -> Result<E>,
        mut make_agent: impl FnMut(&EnvironmentDescription) -> Result<A>,
        swap_policy: P,
    ) -> Result<Self> {
        config.validate()?;
        let mut slots = Vec::with_capacity(config.agents_number);
        let mut agents = Vec::with_capacity(config.agents_number);
        for noise_level in config.noise_levels() {
            let env = make_env(noise_level)?;
            let agent = make_agent(&env.env_description())?;
            let metrics = MetricsAggregator::new(
                config.metrics_number_of_elements,
                config.metrics_number_of_iterations,
            )?;
            slots.push(NoiseSlot {
                noise_level,
                env,
                metrics,
            });
            agents.push(AgentEntry {
                agent,
                estimator: RunningEstimator::new(),
            });
        }
        Ok(Self {
            occupancy: (0..slots.len()).collect(),
            slots,
            agents,
            swap_policy,
            pending_swap: None,
            max_episode_steps: config.max_episode_steps,
            completed_episodes: 0,
        })
    }

    /// Asks the swap policy for a plan and keeps it for `swap_agents`.
    pub fn should_swap_agents(&mut self) -> bool {
        let estimators: Vec<&RunningEstimator> = self
            .occupancy
            .iter()
            .map(|agent_idx| &self.agents[*agent_idx].estimator)
            .collect();
        self.pending_swap = self
            .swap_policy
            .decide_swap(&estimators)
            .filter(|plan| !is_identity(plan));
        self.pending_swap.is_some()
    }

    /// Applies the plan kept by `should_swap_agents`. Does nothing if there is none.
    pub fn swap_agents(&mut self) -> Result<()> {
        let Some(plan) = self.pending_swap.take() else {
            return Ok(());
        };
        validate_plan(&plan, self.slots.len())?;
        let occupancy: Vec<usize> = plan.iter().map(|source| self.occupancy[*source]).collect();
        info!(from = ?self.occupancy, to = ?occupancy, "swapping agents between noise slots");
        self.occupancy = occupancy;
        Ok(())
    }

    // Runs one episode in `slot`, returns the score (number of steps taken).
    fn run_episode(&mut self, slot: usize, iteration: usize) -> Result<usize> {
        let agent_idx = self.occupancy[slot];
        let NoiseSlot { env, metrics, .. } = &mut self.slots[slot];
        let AgentEntry { agent, estimator } = &mut self.agents[agent_idx];

        let mut state = env.reset()?;
        let mut score = 0;
        loop {
            score += 1;
            let action = agent.act(&state)?;
            let snapshot = env.step(&action)?;
            let done = snapshot.done();
            // terminal steps are penalised and carry no successor
            let (reward, next_state) = if done {
                (-snapshot.reward, None)
            } else {
                (snapshot.reward, Some(snapshot.state))
            };
            agent.remember(Memory {
                state,
                action,
                reward,
                done,
                next_state: next_state.clone(),
            });
            agent.reflect()?;
            metrics.add_loss(agent.last_loss(), iteration);

            let Some(next_state) = next_state else {
                break;
            };
            if self.max_episode_steps.is_some_and(|max| score >= max) {
                warn!(slot, score, "episode cut at the step limit");
                break;
            }
            state = next_state;
        }
        if let Some(sample) = metrics.add_score(score as f32, iteration) {
            estimator.update(sample.value as f64);
        }
        Ok(score)
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[NoiseSlot<E>] {
        &self.slots
    }

    pub fn noise_levels(&self) -> Vec<f32> {
        self.slots.iter().map(|slot| slot.noise_level).collect()
    }

    pub fn metrics(&self, slot: usize) -> &MetricsAggregator {
        &self.slots[slot].metrics
    }

    /// `occupancy()[slot]` is the index of the agent training in `slot`.
    pub fn occupancy(&self) -> &[usize] {
        &self.occupancy
    }

    pub fn agent(&self, agent_idx: usize) -> &AgentEntry<A> {
        &self.agents[agent_idx]
    }

    pub fn agent_in_slot(&self, slot: usize) -> &AgentEntry<A> {
        &self.agents[self.occupancy[slot]]
    }

    pub fn completed_episodes(&self) -> usize {
        self.completed_episodes
    }
}

impl<E, A, P> Algorithm for TrainingOrchestrator<E, A, P>
where
    E: Env,
    A: Agent<Observation = E::Observation, Action = E::Action>,
    P: SwapPolicy,
{
    /// Episode indices continue across calls, the first episode ever is 1.
    fn train(&mut self, training_episodes: usize) -> Result<()> {
        let first = self.completed_episodes + 1;
        let last = self.completed_episodes + training_episodes;
        for episode in first..=last {
            info!(
                "Episode {episode}. {:.2}% done",
                (episode + 1 - first) as f64 / training_episodes as f64 * 100.
            );
            for slot in 0..self.slots.len() {
                let score = self.run_episode(slot, episode)?;
                debug!(
                    slot,
                    agent = self.occupancy[slot],
                    noise = self.slots[slot].noise_level,
                    score,
                    "agent finished"
                );
            }
            self.completed_episodes = episode;
            if self.should_swap_agents() {
                self.swap_agents()?;
            }
        }
        Ok(())
    }
}
