use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use rand::RngCore;

/// writes a file at `path` filled with `size` bytes of random data
pub fn create_random_file(path: &Path, size: usize) -> io::Result<()> {
    let mut file = File::create(path)?;
    let mut buffer = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut buffer);
    file.write_all(&buffer)?;
    file.sync_all()
}

/// writes a file at `path` of `size` bytes, every byte equal to `value`
pub fn create_filled_file(path: &Path, size: usize, value: u8) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(&vec![value; size])?;
    file.sync_all()
}

/// writes `bytes` verbatim to a fresh file at `path`
pub fn write_bytes(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// reads the whole file back into memory
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;
    Ok(buf)
}
