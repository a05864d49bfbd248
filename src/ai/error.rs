use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::ai::constants::AI_TYPE;

/// Error codes surfaced by the AI client.
///
/// The string form follows the `AI/<code>` convention of the Firebase SDKs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiErrorCode {
    Error,
    InvalidArgument,
    Internal,
    NoApiKey,
    NoProjectId,
    NoAppId,
    NoModel,
    FetchError,
    ParseFailed,
    ResponseError,
    InvalidContent,
}

impl AiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiErrorCode::Error => "error",
            AiErrorCode::InvalidArgument => "invalid-argument",
            AiErrorCode::Internal => "internal",
            AiErrorCode::NoApiKey => "no-api-key",
            AiErrorCode::NoProjectId => "no-project-id",
            AiErrorCode::NoAppId => "no-app-id",
            AiErrorCode::NoModel => "no-model",
            AiErrorCode::FetchError => "fetch-error",
            AiErrorCode::ParseFailed => "parse-failed",
            AiErrorCode::ResponseError => "response-error",
            AiErrorCode::InvalidContent => "invalid-content",
        }
    }
}

/// Extra data attached to HTTP and response errors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomErrorData {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub response: Option<Value>,
}

impl CustomErrorData {
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }
}

#[derive(Clone, Debug)]
pub struct AiError {
    code: AiErrorCode,
    message: String,
    custom_data: Option<CustomErrorData>,
}

impl AiError {
    pub fn new(
        code: AiErrorCode,
        message: impl Into<String>,
        custom_data: Option<CustomErrorData>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            custom_data,
        }
    }

    pub fn code(&self) -> AiErrorCode {
        self.code
    }

    /// Returns the namespaced code, e.g. `AI/fetch-error`.
    pub fn code_str(&self) -> String {
        format!("{AI_TYPE}/{}", self.code.as_str())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn custom_data(&self) -> Option<&CustomErrorData> {
        self.custom_data.as_ref()
    }
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", AI_TYPE, self.message, self.code_str())
    }
}

impl std::error::Error for AiError {}

pub type AiResult<T> = Result<T, AiError>;

pub fn invalid_argument(message: impl Into<String>) -> AiError {
    AiError::new(AiErrorCode::InvalidArgument, message, None)
}

pub fn internal_error(message: impl Into<String>) -> AiError {
    AiError::new(AiErrorCode::Internal, message, None)
}

pub fn invalid_content(message: impl Into<String>) -> AiError {
    AiError::new(AiErrorCode::InvalidContent, message, None)
}
