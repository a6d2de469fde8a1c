use thiserror::Error;

/// errors produced while parsing options, opening the target, or running a pass
#[derive(Error, Debug)]
pub enum ZdError {
    /// wraps standard I/O errors with automatic conversion
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// a CLI argument or derived configuration value is invalid
    #[error("{0}")]
    Config(String),

    /// the bad-block ledger hit its abort threshold during a pass
    #[error("tolerance exceeded")]
    LedgerExceeded,

    /// the run finished but the final ledger was non-empty
    #[error("{0}")]
    Report(String),
}

/// type alias for Result with our custom ZdError
pub type Result<T> = std::result::Result<T, ZdError>;
