use anyhow::Result;
use clap::Parser;
use nl_agents::AgentKind;
use nl_api::{
    builders::noise_learning::NoiseLearningBuilder, config::NoiseLearningConfig,
    utils::report::TrainingReport,
};
use nl_core::Algorithm;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Trains one agent per noise level and reports how learning degrades with noise.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML file with the experiment configuration, flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    agents_number: Option<usize>,

    #[arg(long)]
    env_name: Option<String>,

    /// DQN or A2C
    #[arg(long)]
    agent: Option<AgentKind>,

    #[arg(long)]
    noise_env_step: Option<f32>,

    #[arg(long)]
    enable_exchange: Option<bool>,

    #[arg(long)]
    swap_margin: Option<f32>,

    #[arg(long)]
    metrics_number_of_elements: Option<usize>,

    #[arg(long)]
    metrics_number_of_iterations: Option<usize>,

    #[arg(long)]
    max_episode_steps: Option<usize>,

    #[arg(long)]
    training_episodes: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    debug: bool,

    /// Where to write the JSON training report
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(NoiseLearningConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => NoiseLearningConfig::from_toml_file(path)?,
            None => NoiseLearningConfig::default(),
        };
        macro_rules! override_field {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    config.$field = value;
                })*
            };
        }
        override_field!(
            agents_number,
            env_name,
            agent,
            noise_env_step,
            enable_exchange,
            metrics_number_of_elements,
            metrics_number_of_iterations,
            training_episodes
        );
        if self.swap_margin.is_some() {
            config.swap_margin = self.swap_margin;
        }
        if self.max_episode_steps.is_some() {
            config.max_episode_steps = self.max_episode_steps;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.debug |= self.debug;
        Ok((config, self.report))
    }
}

fn default_log_level(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(debug)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let (config, report_path) = Args::parse().into_config()?;
    init_logging(config.debug);
    info!(?config, "called with");

    let mut noise_learning = NoiseLearningBuilder::new(config.clone()).build()?;
    let result = noise_learning.train(config.training_episodes);

    // metrics gathered before a failure are still reported
    let report = TrainingReport::from_orchestrator(&noise_learning);
    report.log_summary();
    if let Some(path) = report_path {
        report.write_json(&path)?;
        info!(path = %path.display(), "report written");
    }
    if let Err(err) = &result {
        error!("training aborted: {err:#}");
    }
    result
}
