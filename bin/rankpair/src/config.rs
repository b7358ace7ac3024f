//! Runtime settings for the rankpair binary.
//!
//! Built once at startup from defaults plus `RANKPAIR_*` environment
//! variables (a `.env` file is honored) and passed down explicitly.
//! Nothing here is a process-wide cache.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Directory holding the four JSON table files.
    pub data_dir: PathBuf,
    /// Elo K-factor.
    pub k_factor: f64,
    /// Candidate prefix size for informative-pair sampling.
    pub candidate_window: usize,
    /// Identity of the judge driving this REPL session.
    pub judge_id: String,
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("data_dir", "./data")?
            .set_default("k_factor", 32.0)?
            .set_default("candidate_window", 3_i64)?
            .set_default("judge_id", "local")?
            .add_source(config::Environment::with_prefix("RANKPAIR"))
            .build()?
            .try_deserialize()
    }
}
