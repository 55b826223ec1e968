use anyhow::{Result, anyhow};
use nl_core::{
    Algorithm,
    agents::{Agent, Memory},
    config::OrchestratorConfig,
    env::{Env, EnvironmentDescription, SnapShot, Space},
    error::{ConfigError, SwapError},
    estimator::RunningEstimator,
    orchestrator::TrainingOrchestrator,
    swap::{NeighborSwap, NeverSwap, SwapPolicy},
};
use std::{cell::RefCell, rc::Rc};

type Log = Rc<RefCell<Vec<String>>>;

/// Terminates after `episode_length` steps, `fail_at` makes a step fail instead.
struct CountdownEnv {
    noise: f32,
    episode_length: usize,
    terminal_reward: f32,
    fail_at: Option<usize>,
    steps: usize,
    log: Log,
}

impl Env for CountdownEnv {
    type Observation = usize;
    type Action = usize;

    fn reset(&mut self) -> Result<usize> {
        self.steps = 0;
        self.log.borrow_mut().push(format!("reset {}", self.noise));
        Ok(0)
    }

    fn step(&mut self, _action: &usize) -> Result<SnapShot<usize>> {
        self.steps += 1;
        self.log.borrow_mut().push(format!("step {}", self.noise));
        if self.fail_at == Some(self.steps) {
            return Err(anyhow!("environment blew up"));
        }
        let done = self.steps >= self.episode_length;
        let reward = if done { self.terminal_reward } else { 1. };
        Ok(SnapShot::new(self.steps, reward, done, false))
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(Space::Discrete(1), Space::Discrete(2))
    }

    fn noise_std_dev(&self) -> f32 {
        self.noise
    }
}

struct RecordingAgent {
    id: usize,
    memories: Vec<Memory<usize, usize>>,
    reflections: usize,
}

impl Agent for RecordingAgent {
    type Observation = usize;
    type Action = usize;

    fn act(&mut self, observation: &usize) -> Result<usize> {
        Ok(*observation % 2)
    }

    fn remember(&mut self, memory: Memory<usize, usize>) {
        self.memories.push(memory);
    }

    fn reflect(&mut self) -> Result<()> {
        self.reflections += 1;
        Ok(())
    }

    fn last_loss(&self) -> f32 {
        self.reflections as f32
    }
}

struct FixedPlan(Option<Vec<usize>>);

impl SwapPolicy for FixedPlan {
    fn decide_swap(&mut self, _estimators: &[&RunningEstimator]) -> Option<Vec<usize>> {
        self.0.take()
    }
}

fn config(agents_number: usize) -> OrchestratorConfig {
    OrchestratorConfig {
        agents_number,
        noise_env_step: 0.1,
        metrics_number_of_elements: 1,
        metrics_number_of_iterations: 1,
        max_episode_steps: None,
    }
}

fn slot_of(noise: f32) -> usize {
    (noise * 10.).round() as usize
}

fn build<P: SwapPolicy>(
    config: &OrchestratorConfig,
    episode_length: impl Fn(usize) -> usize,
    fail_at: impl Fn(usize) -> Option<usize>,
    policy: P,
    log: Log,
) -> Result<TrainingOrchestrator<CountdownEnv, RecordingAgent, P>> {
    let mut next_id = 0;
    TrainingOrchestrator::new(
        config,
        |noise| {
            Ok(CountdownEnv {
                noise,
                episode_length: episode_length(slot_of(noise)),
                terminal_reward: 2.5,
                fail_at: fail_at(slot_of(noise)),
                steps: 0,
                log: log.clone(),
            })
        },
        |_description| {
            next_id += 1;
            Ok(RecordingAgent {
                id: next_id - 1,
                memories: vec![],
                reflections: 0,
            })
        },
        policy,
    )
}

#[test]
fn one_episode_records_one_score_per_slot() -> Result<()> {
    let log = Log::default();
    let mut orchestrator = build(&config(3), |slot| slot + 3, |_| None, NeverSwap, log)?;
    assert_eq!(orchestrator.noise_levels().len(), 3);
    orchestrator.train(1)?;
    for slot in 0..3 {
        let scores = orchestrator.metrics(slot).moving_average_scores();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].iteration, 1);
        assert_eq!(scores[0].value, (slot + 3) as f32);
        let losses = orchestrator.metrics(slot).moving_average_losses();
        assert_eq!(losses.len(), slot + 3);
        assert!(losses.iter().all(|sample| sample.iteration == 1));
    }
    assert_eq!(orchestrator.completed_episodes(), 1);
    Ok(())
}

#[test]
fn noise_levels_are_strictly_increasing() -> Result<()> {
    let orchestrator = build(&config(4), |_| 1, |_| None, NeverSwap, Log::default())?;
    let levels = orchestrator.noise_levels();
    assert_eq!(levels[0], 0.);
    assert!(levels.windows(2).all(|w| w[0] < w[1]));
    for (slot, level) in levels.iter().enumerate() {
        assert_eq!(orchestrator.slots()[slot].env.noise_std_dev(), *level);
    }
    Ok(())
}

#[test]
fn terminal_reward_is_negated_and_successor_cleared() -> Result<()> {
    let mut orchestrator = build(&config(1), |_| 4, |_| None, NeverSwap, Log::default())?;
    orchestrator.train(1)?;
    let agent = &orchestrator.agent_in_slot(0).agent;
    assert_eq!(agent.memories.len(), 4);
    assert_eq!(agent.reflections, 4);
    let (last, earlier) = agent.memories.split_last().unwrap();
    assert_eq!(last.reward, -2.5);
    assert!(last.done);
    assert_eq!(last.next_state, None);
    for (idx, memory) in earlier.iter().enumerate() {
        assert_eq!(memory.reward, 1.);
        assert!(!memory.done);
        assert_eq!(memory.state, idx);
        assert_eq!(memory.next_state, Some(idx + 1));
    }
    Ok(())
}

#[test]
fn slots_run_one_after_another() -> Result<()> {
    let log = Log::default();
    let mut orchestrator = build(&config(2), |_| 2, |_| None, NeverSwap, log.clone())?;
    orchestrator.train(2)?;
    let expected: Vec<String> = ["0", "0.1", "0", "0.1"]
        .iter()
        .flat_map(|noise| {
            vec![
                format!("reset {noise}"),
                format!("step {noise}"),
                format!("step {noise}"),
            ]
        })
        .collect();
    assert_eq!(*log.borrow(), expected);
    Ok(())
}

#[test]
fn iterations_continue_across_train_calls() -> Result<()> {
    let mut orchestrator = build(&config(1), |_| 1, |_| None, NeverSwap, Log::default())?;
    orchestrator.train(2)?;
    orchestrator.train(1)?;
    let iterations: Vec<usize> = orchestrator
        .metrics(0)
        .moving_average_scores()
        .iter()
        .map(|sample| sample.iteration)
        .collect();
    assert_eq!(iterations, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn published_scores_feed_the_estimator() -> Result<()> {
    let mut config = config(2);
    config.metrics_number_of_elements = 2;
    config.metrics_number_of_iterations = 2;
    let mut orchestrator = build(&config, |slot| 2 * slot + 1, |_| None, NeverSwap, Log::default())?;
    orchestrator.train(5)?;
    for slot in 0..2 {
        let estimator = &orchestrator.agent_in_slot(slot).estimator;
        assert_eq!(estimator.count, 2);
        assert!((estimator.mean - (2 * slot + 1) as f64).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn swap_permutes_agents_but_not_noise() -> Result<()> {
    let policy = FixedPlan(Some(vec![2, 0, 1]));
    let mut orchestrator = build(&config(3), |slot| slot + 1, |_| None, policy, Log::default())?;
    let levels = orchestrator.noise_levels();
    orchestrator.train(1)?;
    assert_eq!(orchestrator.occupancy(), &[2, 0, 1]);
    assert_eq!(orchestrator.noise_levels(), levels);
    for slot in 0..3 {
        assert_eq!(orchestrator.slots()[slot].env.noise_std_dev(), levels[slot]);
    }
    assert_eq!(orchestrator.agent_in_slot(0).agent.id, 2);
    // the agent that trained in slot 2 took 3 steps and keeps its history after moving
    assert_eq!(orchestrator.agent_in_slot(0).agent.memories.len(), 3);

    orchestrator.train(1)?;
    assert_eq!(orchestrator.agent(2).agent.memories.len(), 4);
    Ok(())
}

#[test]
fn invalid_plan_is_rejected_without_moving_agents() -> Result<()> {
    let policy = FixedPlan(Some(vec![0, 0, 1]));
    let mut orchestrator = build(&config(3), |_| 1, |_| None, policy, Log::default())?;
    let err = orchestrator.train(1).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SwapError>(),
        Some(&SwapError::NotAPermutation(vec![0, 0, 1]))
    );
    assert_eq!(orchestrator.occupancy(), &[0, 1, 2]);
    Ok(())
}

#[test]
fn declining_policy_is_a_no_op() -> Result<()> {
    let mut orchestrator = build(&config(2), |_| 1, |_| None, NeverSwap, Log::default())?;
    orchestrator.train(3)?;
    assert!(!orchestrator.should_swap_agents());
    orchestrator.swap_agents()?;
    assert_eq!(orchestrator.occupancy(), &[0, 1]);
    Ok(())
}

#[test]
fn neighbor_swap_promotes_stronger_agent() -> Result<()> {
    let mut orchestrator = build(
        &config(2),
        |slot| if slot == 0 { 2 } else { 10 },
        |_| None,
        NeighborSwap::new(1.),
        Log::default(),
    )?;
    orchestrator.train(1)?;
    assert_eq!(orchestrator.occupancy(), &[1, 0]);
    assert!((orchestrator.agent_in_slot(0).estimator.mean - 10.).abs() < 1e-9);
    Ok(())
}

#[test]
fn collaborator_failure_aborts_and_keeps_metrics() -> Result<()> {
    let fail_at = |slot| if slot == 1 { Some(2) } else { None };
    let mut orchestrator = build(&config(2), |_| 3, fail_at, NeverSwap, Log::default())?;
    let err = orchestrator.train(5).unwrap_err();
    assert_eq!(err.to_string(), "environment blew up");
    assert_eq!(orchestrator.metrics(0).moving_average_scores().len(), 1);
    assert_eq!(orchestrator.metrics(1).moving_average_losses().len(), 1);
    assert!(orchestrator.metrics(1).moving_average_scores().is_empty());
    assert_eq!(orchestrator.completed_episodes(), 0);
    Ok(())
}

#[test]
fn step_limit_cuts_endless_episodes() -> Result<()> {
    let mut config = config(1);
    config.max_episode_steps = Some(5);
    let mut orchestrator = build(&config, |_| usize::MAX, |_| None, NeverSwap, Log::default())?;
    orchestrator.train(1)?;
    assert_eq!(orchestrator.metrics(0).moving_average_scores()[0].value, 5.);
    let last = orchestrator.agent_in_slot(0).agent.memories.last().unwrap();
    assert_eq!(last.reward, 1.);
    assert!(!last.done);
    Ok(())
}

#[test]
fn configuration_errors_fail_fast() {
    let mut built = 0;
    let result = TrainingOrchestrator::<CountdownEnv, RecordingAgent, _>::new(
        &config(0),
        |_| {
            built += 1;
            Err(anyhow!("should not be called"))
        },
        |_| Err(anyhow!("should not be called")),
        NeverSwap,
    );
    let err = result.err().unwrap();
    assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::NoAgents));
    assert_eq!(built, 0);
}
