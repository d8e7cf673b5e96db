use thiserror::Error;

#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A command-line value that cannot be used as given.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CadenceError {
    /// Short, stable error code for log lines and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            CadenceError::Config(_) => "CONFIG_ERROR",
            CadenceError::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }
}

pub type Result<T> = std::result::Result<T, CadenceError>;
