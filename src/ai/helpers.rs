use crate::ai::backend::Backend;
use crate::ai::constants::AI_TYPE;

/// Encodes a backend into the identifier used to key cached AI services.
///
/// Distinct Vertex AI regions produce distinct identifiers, so each region gets
/// its own service instance per app.
pub fn encode_instance_identifier(backend: &Backend) -> String {
    match backend {
        Backend::GoogleAi => format!("{AI_TYPE}/googleai"),
        Backend::VertexAi { location } => format!("{AI_TYPE}/vertexai/{location}"),
    }
}
