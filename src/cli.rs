//! Command-line surface, parsed with `clap`'s derive API.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::cosine::NanPolicy;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    CosineSimilarity,
    RandomWalker,
}

/// Cross-level alignment engine: scores per-entity agreement across
/// independently measured experiment levels.
#[derive(Debug, Parser)]
#[command(name = "xlevel-align", version, about)]
pub struct Cli {
    /// Per-entity intensity table (dataLevel, dataReplicate, vertex, intensity).
    #[arg(long)]
    pub data_input: PathBuf,

    /// Optional cross-level entity similarity table.
    #[arg(long)]
    pub vertex_input: Option<PathBuf>,

    /// Suffix separator for default cross-level entity-name matching.
    #[arg(long)]
    pub entity_diff: Option<String>,

    /// Alignment method.
    #[arg(long, value_enum, default_value_t = Method::CosineSimilarity)]
    pub method: Method,

    /// Restart probability for the random-walk aligner, in (0, 1).
    #[arg(long, default_value_t = 0.05)]
    pub walker_restart: f64,

    /// Bootstrap/permutation resample count (cosine method) or walk step
    /// budget (random-walk method). Must be >= 1.
    #[arg(long, default_value_t = 10_000)]
    pub steps: u64,

    /// What a zero-norm cosine resolves to during bootstrap resampling.
    #[arg(long, value_enum, default_value_t = NanPolicy::Zero)]
    pub nan_policy: NanPolicy,

    /// Global RNG seed for deterministic per-job seed derivation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Increase logging verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.walker_restart > 0.0 && self.walker_restart < 1.0) {
            return Err(AppError::Configuration(format!(
                "--walker-restart must be in (0, 1), got {}",
                self.walker_restart
            )));
        }
        if self.steps < 1 {
            return Err(AppError::Configuration(
                "--steps must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
