use crate::ai::backend::Backend;

/// Options for [`get_ai`](crate::ai::get_ai).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AiOptions {
    /// Backend to use for inference. Defaults to the Google AI backend when omitted.
    pub backend: Option<Backend>,
}

impl AiOptions {
    pub fn backend_or_default(&self) -> Backend {
        self.backend.clone().unwrap_or_default()
    }
}
