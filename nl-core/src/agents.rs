use anyhow::Result;

/// One transition handed to an agent. `next_state` is `None` once the episode ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Memory<O, A> {
    pub state: O,
    pub action: A,
    pub reward: f32,
    pub done: bool,
    pub next_state: Option<O>,
}

pub trait Agent {
    type Observation;
    type Action;

    /// Picks the action to take in `observation`.
    fn act(&mut self, observation: &Self::Observation) -> Result<Self::Action>;

    /// Stores a transition for later learning.
    fn remember(&mut self, memory: Memory<Self::Observation, Self::Action>);

    /// Runs one learning update, refreshing `last_loss`.
    fn reflect(&mut self) -> Result<()>;

    /// Loss of the most recent learning update.
    fn last_loss(&self) -> f32;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    type Observation = A::Observation;
    type Action = A::Action;

    fn act(&mut self, observation: &Self::Observation) -> Result<Self::Action> {
        (**self).act(observation)
    }

    fn remember(&mut self, memory: Memory<Self::Observation, Self::Action>) {
        (**self).remember(memory)
    }

    fn reflect(&mut self) -> Result<()> {
        (**self).reflect()
    }

    fn last_loss(&self) -> f32 {
        (**self).last_loss()
    }
}
