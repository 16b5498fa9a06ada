//! Configuration error types.

use std::io;

/// Errors raised while loading, saving, or parsing `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadError(#[source] io::Error),

    #[error("failed to write config: {0}")]
    WriteError(#[source] io::Error),

    /// The file exists but is not valid RON for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}
