use crate::config::FillConfig;
use crate::error::Result;
use crate::ledger::{FaultKind, Ledger};
use crate::progress::Progress;
use crate::target::Target;
use log::{debug, warn};

/// what a pass driver observed: how many write calls it issued, for the
/// `wipe_selective`/`wipe_all` write-count invariants in spec §8
#[derive(Debug, Default, Clone, Copy)]
pub struct PassReport {
    pub writes: u64,
}

/// reads `buf.len()` bytes at the current pointer. On success, advances the
/// pointer and returns `Ok(true)`. On failure, seeks back to `start` and
/// retries up to `ledger.retry()` times; if a retry succeeds the pointer is
/// advanced and `Ok(true)` is returned, otherwise the fault is recorded, the
/// pointer is skipped past the block, and `Ok(false)` is returned.
fn recover_read(target: &mut Target, ledger: &mut Ledger, buf: &mut [u8]) -> Result<bool> {
    let start = target.pointer();
    if target.read_exact(buf).is_ok() {
        target.advance(buf.len() as u64);
        return Ok(true);
    }
    warn!("read error at offset {start}, retrying");
    for _ in 0..ledger.retry() {
        target.seek_to(start)?;
        if target.read_exact(buf).is_ok() {
            target.advance(buf.len() as u64);
            return Ok(true);
        }
    }
    ledger.record(start, FaultKind::Read)?;
    target.seek_to(start + buf.len() as u64)?;
    Ok(false)
}

/// same recovery shape as `recover_read`, for writes
fn recover_write(target: &mut Target, ledger: &mut Ledger, buf: &[u8]) -> Result<bool> {
    let start = target.pointer();
    if target.write_exact(buf).is_ok() {
        target.advance(buf.len() as u64);
        return Ok(true);
    }
    warn!("write error at offset {start}, retrying");
    for _ in 0..ledger.retry() {
        target.seek_to(start)?;
        if target.write_exact(buf).is_ok() {
            target.advance(buf.len() as u64);
            return Ok(true);
        }
    }
    ledger.record(start, FaultKind::Write)?;
    target.seek_to(start + buf.len() as u64)?;
    Ok(false)
}

/// unconditional single-pass overwrite: every full block, then the tail,
/// written from `config`'s buffer with no reads
pub fn wipe_all(target: &mut Target, config: &FillConfig, ledger: &mut Ledger) -> Result<PassReport> {
    debug!("wipe_all: {} block(s), {} tail byte(s)", target.blocks(), target.tail());
    let mut report = PassReport::default();
    let mut progress = Progress::start(target.pointer(), target.size());
    for _ in 0..target.blocks() {
        recover_write(target, ledger, config.buffer())?;
        report.writes += 1;
        progress.maybe_print(target.pointer(), target.size());
    }
    if target.tail() > 0 {
        recover_write(target, ledger, &config.buffer()[..target.tail() as usize])?;
        report.writes += 1;
    }
    progress.finish(target.size());
    Ok(report)
}

/// like `wipe_all`, but the caller has pre-filled `config`'s buffer with
/// random bytes once; the same buffer is reused for every block (spec §9)
pub fn wipe_random(target: &mut Target, config: &FillConfig, ledger: &mut Ledger) -> Result<PassReport> {
    debug!("wipe_random: {} block(s), {} tail byte(s)", target.blocks(), target.tail());
    wipe_all(target, config, ledger)
}

/// read-before-write: skip blocks whose contents already match the fill
/// value, overwrite the rest
pub fn wipe_selective(
    target: &mut Target,
    config: &FillConfig,
    ledger: &mut Ledger,
) -> Result<PassReport> {
    debug!(
        "wipe_selective: {} block(s), {} tail byte(s)",
        target.blocks(),
        target.tail()
    );
    let mut report = PassReport::default();
    let mut progress = Progress::start(target.pointer(), target.size());
    let mut scratch = vec![0u8; config.block_size()];

    for _ in 0..target.blocks() {
        let start = target.pointer();
        if recover_read(target, ledger, &mut scratch)? {
            if !config.block_is_fill(&scratch) {
                target.seek_to(start)?;
                recover_write(target, ledger, config.buffer())?;
                report.writes += 1;
            }
        }
        progress.maybe_print(target.pointer(), target.size());
    }

    if target.tail() > 0 {
        let tail = target.tail() as usize;
        let start = target.pointer();
        let mut tail_buf = vec![0u8; tail];
        if recover_read(target, ledger, &mut tail_buf)? {
            if !config.tail_is_fill(&tail_buf) {
                target.seek_to(start)?;
                recover_write(target, ledger, &config.buffer()[..tail])?;
                report.writes += 1;
            }
        }
    }
    progress.finish(target.size());
    Ok(report)
}

/// reads the entire target from offset 0 and records an `Unwiped` fault for
/// every block that doesn't match the fill; never writes, never retries
/// content mismatches (only read faults are retried)
pub fn verify(target: &mut Target, config: &FillConfig, ledger: &mut Ledger) -> Result<PassReport> {
    debug!("verify: {} block(s), {} tail byte(s)", target.blocks(), target.tail());
    let mut progress = Progress::start(target.pointer(), target.size());
    let mut scratch = vec![0u8; config.block_size()];

    for _ in 0..target.blocks() {
        let start = target.pointer();
        if recover_read(target, ledger, &mut scratch)? && !config.block_is_fill(&scratch) {
            ledger.record(start, FaultKind::Unwiped)?;
        }
        progress.maybe_print(target.pointer(), target.size());
    }

    if target.tail() > 0 {
        let tail = target.tail() as usize;
        let start = target.pointer();
        let mut tail_buf = vec![0u8; tail];
        if recover_read(target, ledger, &mut tail_buf)? && !config.tail_is_fill(&tail_buf) {
            ledger.record(start, FaultKind::Unwiped)?;
        }
    }
    progress.finish(target.size());
    Ok(PassReport::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn file_with(bytes: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn wipe_all_writes_every_block_plus_tail() {
        let f = file_with(&vec![0x55u8; 10000]);
        let mut target = crate::target::Target::open(f.path(), 4096, true).unwrap();
        let config = FillConfig::new(4096, 0).unwrap();
        let mut ledger = Ledger::new(200, 200);
        let report = wipe_all(&mut target, &config, &mut ledger).unwrap();
        assert_eq!(report.writes, 3);
        assert_eq!(target.pointer(), 10000);
        assert!(ledger.is_empty());
    }

    #[test]
    fn wipe_selective_on_clean_target_issues_zero_writes() {
        let f = file_with(&vec![0x00u8; 8192]);
        let mut target = crate::target::Target::open(f.path(), 4096, true).unwrap();
        let config = FillConfig::new(4096, 0).unwrap();
        let mut ledger = Ledger::new(200, 200);
        let report = wipe_selective(&mut target, &config, &mut ledger).unwrap();
        assert_eq!(report.writes, 0);
    }

    #[test]
    fn wipe_selective_on_dirty_target_overwrites_every_block() {
        let f = file_with(&vec![0x55u8; 8192]);
        let mut target = crate::target::Target::open(f.path(), 4096, true).unwrap();
        let config = FillConfig::new(4096, 0).unwrap();
        let mut ledger = Ledger::new(200, 200);
        let report = wipe_selective(&mut target, &config, &mut ledger).unwrap();
        assert_eq!(report.writes, 2);

        target.seek_to(0).unwrap();
        let mut buf = vec![0u8; 8192];
        target.read_exact(&mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn verify_reports_unwiped_block() {
        let mut bytes = vec![0u8; 4096];
        bytes[2000] = 0x01;
        let f = file_with(&bytes);
        let mut target = crate::target::Target::open(f.path(), 4096, true).unwrap();
        let config = FillConfig::new(4096, 0).unwrap();
        let mut ledger = Ledger::new(200, 200);
        verify(&mut target, &config, &mut ledger).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0], (0, FaultKind::Unwiped));
    }

    #[test]
    fn verify_clean_target_has_empty_ledger() {
        let f = file_with(&vec![0u8; 8192]);
        let mut target = crate::target::Target::open(f.path(), 4096, true).unwrap();
        let config = FillConfig::new(4096, 0).unwrap();
        let mut ledger = Ledger::new(200, 200);
        verify(&mut target, &config, &mut ledger).unwrap();
        assert!(ledger.is_empty());
    }
}
