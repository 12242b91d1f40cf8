use thiserror::Error;

/// Errors raised by the pure alignment / detection core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The input breaks the retrieval contract (unordered, duplicated or
    /// non-finite observations, or a monthly sequence with holes).
    #[error("malformed input in series {series}: {detail}")]
    MalformedInput { series: String, detail: String },

    /// Detector parameters that cannot produce well-formed cycles.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    pub fn malformed(series: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            series: series.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let code = match err {
            CoreError::MalformedInput { .. } => 4,
            CoreError::InvalidConfig(_) => 2,
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
