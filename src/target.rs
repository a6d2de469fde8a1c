use crate::error::{Result, ZdError};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// the open target: its descriptor, byte length, and derived block geometry
pub struct Target {
    path: PathBuf,
    file: File,
    size: u64,
    pointer: u64,
    blocks: u64,
    tail: u64,
}

impl Target {
    /// opens `path`, discovers its size, and reopens with the access rights
    /// `writable` requires. Size discovery always happens read-only first,
    /// per spec §4.5, regardless of the access the caller ultimately needs.
    pub fn open(path: &Path, block_size: u64, writable: bool) -> Result<Self> {
        let size = {
            let probe = OpenOptions::new().read(true).open(path).map_err(|e| {
                ZdError::Config(format!("could not open {}: {e}", path.display()))
            })?;
            discover_size(&probe, path, writable)?
        };
        if size == 0 {
            return Err(ZdError::Config("size of target seems to be 0".into()));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| ZdError::Config(format!("could not open {}: {e}", path.display())))?;

        let blocks = size / block_size;
        let tail = size % block_size;
        debug!(
            "opened {} ({size} bytes, {blocks} full block(s), {tail} tail byte(s))",
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
            pointer: 0,
            blocks,
            tail,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn pointer(&self) -> u64 {
        self.pointer
    }

    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    pub fn tail(&self) -> u64 {
        self.tail
    }

    /// positions the descriptor at the absolute offset `abs`; updates the
    /// authoritative in-memory pointer only once the kernel confirms the move
    pub fn seek_to(&mut self, abs: u64) -> Result<()> {
        let pos = self.file.seek(SeekFrom::Start(abs))?;
        if pos != abs {
            return Err(ZdError::Config(format!(
                "could not point to position {abs} in {}",
                self.path.display()
            )));
        }
        self.pointer = abs;
        Ok(())
    }

    /// moves by a signed offset relative to the current pointer
    pub fn seek_relative(&mut self, delta: i64) -> Result<()> {
        let abs = if delta >= 0 {
            self.pointer + delta as u64
        } else {
            self.pointer - delta.unsigned_abs()
        };
        self.seek_to(abs)
    }

    /// equivalent to `seek_to(0)`
    pub fn rewind(&mut self) -> Result<()> {
        self.seek_to(0)
    }

    /// reads exactly `buf.len()` bytes at the current pointer. Does not itself
    /// advance the pointer; the caller advances it once it decides the read
    /// "completed" (immediately on success, or after an in-place retry).
    pub fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.file.read_exact(buf)
    }

    /// writes exactly `buf.len()` bytes at the current pointer. Same
    /// advancement rule as `read_exact`.
    pub fn write_exact(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file.write_all(buf)
    }

    /// advances the in-memory pointer after a step completes successfully
    pub fn advance(&mut self, len: u64) {
        self.pointer += len;
    }

    /// flushes buffered writes, issues the system-wide durability barrier,
    /// and closes and reopens the descriptor so the following pass cannot
    /// observe stale, pre-flush data from a kernel read cache
    pub fn sync_and_reopen(&mut self, writable: bool) -> Result<()> {
        self.file.sync_all()?;
        debug!("durability barrier: flushed, closing and reopening {}", self.path.display());
        self.file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&self.path)
            .map_err(|e| ZdError::Config(format!("could not reopen {}: {e}", self.path.display())))?;
        self.pointer = 0;
        Ok(())
    }
}

#[cfg(unix)]
fn discover_size(file: &File, _path: &Path, _writable: bool) -> Result<u64> {
    let mut probe = file.try_clone()?;
    let size = probe.seek(SeekFrom::End(0))?;
    Ok(size)
}

#[cfg(windows)]
fn discover_size(file: &File, path: &Path, writable: bool) -> Result<u64> {
    use std::os::windows::io::AsRawHandle;
    use winapi::shared::minwindef::DWORD;
    use winapi::um::ioapiset::DeviceIoControl;
    use winapi::um::winioctl::{
        DISK_GEOMETRY_EX, IOCTL_DISK_DELETE_DRIVE_LAYOUT, IOCTL_DISK_GET_DRIVE_GEOMETRY_EX,
    };

    // regular files: seek-to-end works directly, same as POSIX
    if let Ok(mut probe) = file.try_clone() {
        if let Ok(size) = probe.seek(SeekFrom::End(0)) {
            if size > 0 {
                return Ok(size);
            }
        }
    }

    // block devices report a zero-length seek; fall back to the geometry IOCTL
    let handle = file.as_raw_handle();
    let mut geometry: DISK_GEOMETRY_EX = unsafe { std::mem::zeroed() };
    let mut bytes_returned: DWORD = 0;
    let ok = unsafe {
        DeviceIoControl(
            handle as *mut _,
            IOCTL_DISK_GET_DRIVE_GEOMETRY_EX,
            std::ptr::null_mut(),
            0,
            &mut geometry as *mut _ as *mut _,
            std::mem::size_of::<DISK_GEOMETRY_EX>() as DWORD,
            &mut bytes_returned,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(ZdError::Config(format!(
            "could not determine size of {}",
            path.display()
        )));
    }
    let size = unsafe { *geometry.DiskSize.QuadPart() } as u64;

    if writable {
        let mut invalidated: DWORD = 0;
        let ok = unsafe {
            DeviceIoControl(
                handle as *mut _,
                IOCTL_DISK_DELETE_DRIVE_LAYOUT,
                std::ptr::null_mut(),
                0,
                std::ptr::null_mut(),
                0,
                &mut invalidated,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(ZdError::Config(format!(
                "could not invalidate drive layout of {}",
                path.display()
            )));
        }
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn file_of_size(bytes: usize) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&vec![0x55u8; bytes]).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn open_derives_blocks_and_tail() {
        let f = file_of_size(10000);
        let target = Target::open(f.path(), 4096, true).unwrap();
        assert_eq!(target.size(), 10000);
        assert_eq!(target.blocks(), 2);
        assert_eq!(target.tail(), 1808);
    }

    #[test]
    fn open_exact_multiple_has_no_tail() {
        let f = file_of_size(4096);
        let target = Target::open(f.path(), 4096, true).unwrap();
        assert_eq!(target.blocks(), 1);
        assert_eq!(target.tail(), 0);
    }

    #[test]
    fn open_empty_file_is_fatal() {
        let f = NamedTempFile::new().unwrap();
        assert!(Target::open(f.path(), 4096, true).is_err());
    }

    #[test]
    fn seek_to_updates_pointer() {
        let f = file_of_size(8192);
        let mut target = Target::open(f.path(), 4096, true).unwrap();
        target.seek_to(4096).unwrap();
        assert_eq!(target.pointer(), 4096);
    }

    #[test]
    fn seek_relative_moves_forward_and_back() {
        let f = file_of_size(8192);
        let mut target = Target::open(f.path(), 4096, true).unwrap();
        target.seek_to(4096).unwrap();
        target.seek_relative(-4096).unwrap();
        assert_eq!(target.pointer(), 0);
    }

    #[test]
    fn read_exact_reads_configured_bytes() {
        let f = file_of_size(4096);
        let mut target = Target::open(f.path(), 4096, true).unwrap();
        let mut buf = vec![0u8; 4096];
        target.read_exact(&mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x55));
    }
}
