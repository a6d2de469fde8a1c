use crate::config::{FillConfig, Mode, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_BAD_BLOCKS, DEFAULT_RETRIES};
use crate::error::{Result, ZdError};
use clap::Parser;
use std::path::PathBuf;

const BANNER: &str = "\
              000
              000
              000
00000000  0000000
   0000  0000 000
  0000   000  000
 0000    0000 000
00000000  0000000
";

const DISCLAIMER: &str = "\
Bad blocks will be listed as offset/[rwu]:
    r: error occured while reading
    w: error occured while writing
    u: block is not wiped (unwiped)

Example:
zd /dev/sdc

Disclaimer:
The author is not responsible for any loss of data.
Obviously, this tool is dangerous as it is designed to erase data.
";

/// `zd [OPTIONS] TARGET` — overwrite and verify a block device, partition, or file
#[derive(Parser, Debug)]
#[command(
    name = "zd",
    version,
    before_help = BANNER,
    after_help = DISCLAIMER,
    about = "Wipe block device, partition, file etc."
)]
pub struct Cli {
    /// block device, partition, or file to wipe
    pub target: PathBuf,

    /// overwrite all bytes, do not check if already wiped
    #[arg(short = 'a')]
    pub all: bool,

    /// two pass wipe (1st pass writes random bytes)
    #[arg(short = 'x')]
    pub two_pass: bool,

    /// verify, do not wipe
    #[arg(short = 'v')]
    pub verify_only: bool,

    /// block size for read and write, in bytes (512..=32768, multiple of 512)
    #[arg(short = 'b', value_name = "BLOCK_SIZE")]
    pub block_size: Option<u32>,

    /// write this byte, given in hex, instead of 0
    #[arg(short = 'f', value_name = "VALUE")]
    pub fill_value: Option<String>,

    /// abort after this many bad blocks
    #[arg(short = 'm', value_name = "MAX_BAD_BLOCKS")]
    pub max_bad_blocks: Option<usize>,

    /// maximum retries after a read or write error
    #[arg(short = 'r', value_name = "MAX_RETRIES")]
    pub max_retries: Option<usize>,
}

/// the engine-facing configuration a validated `Cli` converts into
pub struct EngineConfig {
    pub target: PathBuf,
    pub mode: Mode,
    pub fill: FillConfig,
    pub max_bad_blocks: usize,
    pub max_retries: usize,
}

impl Cli {
    /// validates mode exclusivity and option ranges, then builds the
    /// engine's configuration types. Pure and filesystem-independent, so it
    /// is unit-testable without spawning a process (spec §4.6).
    pub fn into_engine_config(self) -> Result<EngineConfig> {
        let exclusive_count = [self.all, self.two_pass, self.verify_only]
            .iter()
            .filter(|&&b| b)
            .count();
        if exclusive_count > 1 {
            return Err(ZdError::Config("too many arguments".into()));
        }
        let mode = if self.verify_only {
            Mode::VerifyOnly
        } else if self.all {
            Mode::All
        } else if self.two_pass {
            Mode::TwoPass
        } else {
            Mode::Selective
        };

        let block_size = self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE as u32) as usize;

        let value = match self.fill_value {
            None => 0,
            Some(raw) => u8::from_str_radix(raw.trim_start_matches("0x"), 16)
                .map_err(|_| ZdError::Config("value has to be inbetween 0 and 0xff".into()))?,
        };

        let fill = FillConfig::new(block_size, value)?;

        Ok(EngineConfig {
            target: self.target,
            mode,
            fill,
            max_bad_blocks: self.max_bad_blocks.unwrap_or(DEFAULT_MAX_BAD_BLOCKS),
            max_retries: self.max_retries.unwrap_or(DEFAULT_RETRIES),
        })
    }
}
