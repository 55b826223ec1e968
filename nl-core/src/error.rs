use thiserror::Error;

/// Rejected experiment settings. Raised before any environment or agent is created.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("number of agents must be at least 1")]
    NoAgents,

    #[error("metrics window capacity must be positive, got {0}")]
    WindowCapacity(usize),

    #[error("metrics report cadence must be positive, got {0}")]
    ReportEvery(usize),

    #[error("noise step must be a finite non-negative number, got {0}")]
    NoiseStep(f32),

    #[error("noise step of 0 gives {agents_number} slots the same noise level")]
    DuplicateNoiseLevels { agents_number: usize },

    #[error("maximum episode steps must be positive when set")]
    MaxEpisodeSteps,

    #[error("unknown agent type `{0}`, expected one of: DQN, A2C")]
    UnknownAgent(String),

    #[error("unknown environment `{0}`")]
    UnknownEnvironment(String),

    #[error("agent exchange is enabled but no swap margin was given")]
    MissingSwapMargin,

    #[error("swap margin must be a finite non-negative number, got {0}")]
    SwapMargin(f32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwapError {
    #[error("swap plan has {got} entries but there are {expected} slots")]
    WrongLength { expected: usize, got: usize },

    #[error("swap plan is not a permutation of the slots: {0:?}")]
    NotAPermutation(Vec<usize>),
}
