use clap::Parser;
use std::process;
use std::time::{Duration, Instant};
use zd::Cli;

/// `Process took H hour(s), M minute(s) and S second(s)`, threaded through
/// the exit path via an explicit `Instant` rather than a process-global
/// start time (spec §9).
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("Process took {hours} hour(s), {minutes} minute(s) and {seconds} second(s)")
}

fn main() {
    env_logger::init();

    // CLI/config validation is pure and runs before any I/O; its failures
    // get the single `Error: …` line but no elapsed-time summary, per
    // SPEC_FULL.md §6's "after a successful (or warned-success) run" scope.
    let config = match Cli::parse().into_engine_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let start = Instant::now();
    let exit_code = match zd::run(config) {
        Ok(()) => {
            println!("\n{}", format_elapsed(start.elapsed()));
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            println!("\n{}", format_elapsed(start.elapsed()));
            1
        }
    };

    process::exit(exit_code);
}
