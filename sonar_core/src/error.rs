use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SonarError {
    #[error("network not ready after {waited_ms} ms")]
    NetworkUnavailable { waited_ms: u64 },
    #[error("interrupted before the control loop started")]
    Interrupted,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing ranger")]
    MissingRanger,
    #[error("missing indicator")]
    MissingIndicator,
    #[error("missing notifier")]
    MissingNotifier,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
