use crate::error::{Result, ZdError};
use rand::RngCore;

/// minimum and maximum permitted block sizes, per spec
pub const MIN_BLOCK_SIZE: usize = 512;
pub const MAX_BLOCK_SIZE: usize = 32768;
pub const DEFAULT_BLOCK_SIZE: usize = 4096;
pub const DEFAULT_MAX_BAD_BLOCKS: usize = 200;
pub const DEFAULT_RETRIES: usize = 200;

/// the ordered sequence of passes a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// read-before-write: skip blocks that already hold the fill value
    Selective,
    /// unconditional single-pass overwrite
    All,
    /// random pass followed by an unconditional fill pass
    TwoPass,
    /// no writes; check that the target already holds the fill value
    VerifyOnly,
}

impl Mode {
    /// whether this mode issues any writes at all
    pub fn writes(self) -> bool {
        !matches!(self, Mode::VerifyOnly)
    }
}

/// block size, fill byte, and the reusable buffer passes write from
#[derive(Debug, Clone)]
pub struct FillConfig {
    block_size: usize,
    value: u8,
    value64: u64,
    buffer: Vec<u8>,
}

impl FillConfig {
    /// validates `block_size` and `value`, then builds a buffer prefilled with `value`
    pub fn new(block_size: usize, value: u8) -> Result<Self> {
        if block_size < MIN_BLOCK_SIZE || block_size > MAX_BLOCK_SIZE || block_size % 512 != 0 {
            return Err(ZdError::Config(
                "block size has to be n * 512, >=512 and <=32768".into(),
            ));
        }
        let value64 = u64::from_ne_bytes([value; 8]);
        Ok(Self {
            block_size,
            value,
            value64,
            buffer: vec![value; block_size],
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn value64(&self) -> u64 {
        self.value64
    }

    /// the reusable block-sized write buffer, currently holding either the fill
    /// byte (default) or random bytes (after `fill_random`)
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// resets the buffer to the configured fill byte, in every position
    pub fn reset_to_fill(&mut self) {
        self.buffer.fill(self.value);
    }

    /// fills the buffer once with random bytes; the same buffer is reused for
    /// every block of the random pass, by design (see spec §9)
    pub fn fill_random(&mut self) {
        rand::thread_rng().fill_bytes(&mut self.buffer);
    }

    /// true if every 64-bit word of `block` equals `value64`
    pub fn block_is_fill(&self, block: &[u8]) -> bool {
        block
            .chunks_exact(8)
            .all(|chunk| u64::from_ne_bytes(chunk.try_into().unwrap()) == self.value64)
    }

    /// true if every byte of `tail` equals `value`
    pub fn tail_is_fill(&self, tail: &[u8]) -> bool {
        tail.iter().all(|&b| b == self.value)
    }
}
