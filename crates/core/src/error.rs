use thiserror::Error;

/// Errors raised by the core.  All of them are local to the call site;
/// nothing here is fatal to a process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("smoothing window {window} out of range for series of length {len}")]
    InvalidWindow { window: usize, len: usize },

    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    #[error("unsupported metric '{0}'")]
    UnsupportedMetric(String),
}

pub type Result<T> = std::result::Result<T, Error>;
