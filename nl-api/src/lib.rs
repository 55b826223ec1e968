// builders + configuration + reporting on top of the core orchestrator
pub mod builders;
pub mod config;
pub mod utils;
