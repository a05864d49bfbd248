//! Wire types of the `generateContent` REST surface.
pub mod content;
pub mod requests;
pub mod responses;
pub mod schema;

pub use content::{Content, FunctionCall, FunctionResponse, Part, PartData, Role};
pub use requests::{GenerateContentRequest, GenerationConfig};
pub use responses::{
    Candidate, FinishReason, GenerateContentResponse, PromptFeedback, UsageMetadata,
};
pub use schema::{FunctionDeclaration, Schema, SchemaType, SchemaViolation, Tool};
