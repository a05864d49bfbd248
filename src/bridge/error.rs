use std::fmt;

use crate::ai::AiError;
use crate::app::AppError;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Clone)]
pub enum BridgeError {
    /// The model asked for a function that is not declared.
    UnsupportedFunction { name: String },
    /// The model's arguments do not match the declared parameter schema.
    InvalidArguments { name: String, reason: String },
    Ai(AiError),
    App(AppError),
    Config { message: String },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::UnsupportedFunction { name } => {
                write!(f, "Model requested unsupported function '{name}'")
            }
            BridgeError::InvalidArguments { name, reason } => {
                write!(f, "Invalid arguments for function '{name}': {reason}")
            }
            BridgeError::Ai(err) => write!(f, "{err}"),
            BridgeError::App(err) => write!(f, "{err}"),
            BridgeError::Config { message } => write!(f, "Invalid chat bridge configuration: {message}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Ai(err) => Some(err),
            BridgeError::App(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AiError> for BridgeError {
    fn from(err: AiError) -> Self {
        BridgeError::Ai(err)
    }
}

impl From<AppError> for BridgeError {
    fn from(err: AppError) -> Self {
        BridgeError::App(err)
    }
}
