pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
mod mode;
mod passes;
mod progress;
pub mod target;

pub use cli::{Cli, EngineConfig};
pub use error::{Result, ZdError};

/// runs the wipe/verify engine to completion for an already-validated
/// configuration. The only entry point the CLI front-end needs.
pub fn run(config: EngineConfig) -> Result<()> {
    mode::run(
        &config.target,
        config.mode,
        config.fill,
        config.max_bad_blocks,
        config.max_retries,
    )
}
