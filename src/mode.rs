use crate::config::{FillConfig, Mode};
use crate::error::{Result, ZdError};
use crate::ledger::Ledger;
use crate::passes::{self, PassReport};
use crate::target::Target;
use log::{info, warn};
use std::path::Path;

/// sequences the pass drivers named by `mode`, performing the pre-pass
/// setup (§4.5) and the flush/reopen durability barrier (§5) between any
/// writing pass and the one that follows it
pub fn run(path: &Path, mode: Mode, mut config: FillConfig, max: usize, retry: usize) -> Result<()> {
    let mut ledger = Ledger::new(max, retry);
    let mut target = Target::open(path, config.block_size() as u64, mode.writes())?;

    match mode {
        Mode::Selective => {
            step(&mut target, "Pass 1 of 2, wiping", &mut ledger, |t, l| {
                passes::wipe_selective(t, &config, l)
            })?;
            barrier(&mut target, &mut ledger, false)?;
            step(&mut target, "Pass 2 of 2, verifying", &mut ledger, |t, l| {
                passes::verify(t, &config, l)
            })?;
        }
        Mode::All => {
            step(&mut target, "Pass 1 of 2, wiping", &mut ledger, |t, l| {
                passes::wipe_all(t, &config, l)
            })?;
            barrier(&mut target, &mut ledger, false)?;
            step(&mut target, "Pass 2 of 2, verifying", &mut ledger, |t, l| {
                passes::verify(t, &config, l)
            })?;
        }
        Mode::TwoPass => {
            config.fill_random();
            step(&mut target, "Pass 1 of 3, wiping", &mut ledger, |t, l| {
                passes::wipe_random(t, &config, l)
            })?;
            barrier(&mut target, &mut ledger, true)?;
            config.reset_to_fill();
            step(&mut target, "Pass 2 of 3, wiping", &mut ledger, |t, l| {
                passes::wipe_all(t, &config, l)
            })?;
            barrier(&mut target, &mut ledger, false)?;
            step(&mut target, "Pass 3 of 3, verifying", &mut ledger, |t, l| {
                passes::verify(t, &config, l)
            })?;
        }
        Mode::VerifyOnly => {
            step(&mut target, "Pass 1 of 1, verifying", &mut ledger, |t, l| {
                passes::verify(t, &config, l)
            })?;
        }
    }

    finalize(&ledger)
}

/// runs one pass, prints its banner line, and reacts to its outcome: a
/// non-empty-but-below-threshold ledger is a warning (printed, pass
/// continues); any fatal error prints the ledger accumulated so far and
/// propagates, leaving the single `Error: …` line to the top-level caller
/// (spec §7's "a single `Error: …` line" is owned by `main`, not here).
fn step(
    target: &mut Target,
    banner: &str,
    ledger: &mut Ledger,
    pass: impl FnOnce(&mut Target, &mut Ledger) -> Result<PassReport>,
) -> Result<()> {
    println!("{banner} {}", target.path().display());
    info!("{banner}");
    match pass(target, ledger) {
        Ok(_) => {
            if !ledger.is_empty() {
                warn!("finished pass but found bad blocks");
                println!("Warning: finished pass but found bad blocks");
                print!("{ledger}");
            }
            Ok(())
        }
        Err(ZdError::LedgerExceeded) => {
            println!();
            print!("{ledger}");
            Err(ZdError::LedgerExceeded)
        }
        Err(e) => {
            if !ledger.is_empty() {
                println!();
                print!("{ledger}");
            }
            Err(e)
        }
    }
}

/// completes buffered writes, issues the durability barrier, and resets the
/// target pointer to 0 ahead of the next pass; clears the ledger so the next
/// pass reports its own fault set (spec §4.4)
fn barrier(target: &mut Target, ledger: &mut Ledger, writable: bool) -> Result<()> {
    println!("Running sync, this might take a moment...");
    target.sync_and_reopen(writable)?;
    ledger.clear();
    Ok(())
}

/// prints the terminal report and returns the process-level outcome: clean
/// success, or a non-zero-exit warned success with the final ledger printed
fn finalize(ledger: &Ledger) -> Result<()> {
    if ledger.is_empty() {
        println!("Verification was successful, all done");
        Ok(())
    } else {
        println!("Warning: all done but found bad blocks");
        print!("{ledger}");
        Err(ZdError::Report(format!(
            "{} bad block(s) found",
            ledger.len()
        )))
    }
}
