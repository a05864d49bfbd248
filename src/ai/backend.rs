use std::fmt;

use crate::ai::constants::DEFAULT_LOCATION;

/// Which Firebase AI endpoint family requests are routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendType {
    VertexAi,
    GoogleAi,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::VertexAi => write!(f, "VERTEX_AI"),
            BackendType::GoogleAi => write!(f, "GOOGLE_AI"),
        }
    }
}

/// Backend configuration: the Gemini Developer API, or Vertex AI pinned to a region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    GoogleAi,
    VertexAi { location: String },
}

impl Backend {
    pub fn google_ai() -> Self {
        Self::GoogleAi
    }

    /// Vertex AI in `location`; a blank location falls back to `us-central1`.
    pub fn vertex_ai<S: Into<String>>(location: S) -> Self {
        let location = location.into();
        let location = if location.trim().is_empty() {
            DEFAULT_LOCATION.to_string()
        } else {
            location
        };
        Self::VertexAi { location }
    }

    pub fn backend_type(&self) -> BackendType {
        match self {
            Backend::GoogleAi => BackendType::GoogleAi,
            Backend::VertexAi { .. } => BackendType::VertexAi,
        }
    }

    /// Region for Vertex AI, `None` for the Google AI backend.
    pub fn location(&self) -> Option<&str> {
        match self {
            Backend::VertexAi { location } => Some(location),
            Backend::GoogleAi => None,
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::google_ai()
    }
}
