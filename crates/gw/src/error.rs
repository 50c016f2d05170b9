//! CLI error type.

/// Top-level CLI failure.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Configuration loading failure.
    #[error(transparent)]
    Config(#[from] gw_config::ConfigError),
    /// Server failure.
    #[error("{0}")]
    Server(String),
}
