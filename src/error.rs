use std::process::ExitCode;

/// Errors that cause tabtoss to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("missing credential: {var} is not set (export it or put it in .env)")]
    MissingCredential { var: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("telegram {method} failed: {message}")]
    Transport { method: String, message: String },

    #[error("{message}")]
    WithCode { code: u8, message: String },
}

impl ExitError {
    pub fn new(code: u8, message: String) -> Self {
        ExitError::WithCode { code, message }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::MissingCredential { .. } => ExitCode::from(3),
            ExitError::Storage(_) => ExitCode::from(4),
            ExitError::Transport { .. } => ExitCode::from(5),
            ExitError::WithCode { code, .. } => ExitCode::from(*code),
        }
    }
}
