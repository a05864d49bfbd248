//! # Firebase AI
//!
//! Client for the Gemini `generateContent` endpoint exposed through Firebase
//! AI Logic, with either the Google AI or the Vertex AI backend.
//!
//! - [`get_ai`] / [`get_vertex_ai`] resolve a cached [`AiService`] per app and backend.
//! - [`get_generative_model`] binds a model name plus tools and a system instruction.
//! - [`GenerativeModel::start_chat`] opens a [`ChatSession`] that keeps the
//!   conversation history and serializes concurrent sends.
//!
//! Requests go through an [`AiHttpTransport`]; [`ReqwestTransport`] is installed
//! by default and can be swapped with [`AiService::set_transport`].
//!
//! ## Example
//!
//! ```no_run
//! use firebase_ai_chat_bridge::ai::{get_generative_model, get_vertex_ai, ModelParams, StartChatParams};
//! use firebase_ai_chat_bridge::app::{initialize_app, FirebaseOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let app = initialize_app(
//!     FirebaseOptions {
//!         api_key: Some("api-key".into()),
//!         project_id: Some("my-project".into()),
//!         app_id: Some("1:123:web:abc".into()),
//!         ..Default::default()
//!     },
//!     None,
//! )
//! .await?;
//! let ai = get_vertex_ai(Some(app), "us-central1").await?;
//! let model = get_generative_model(ai, ModelParams::new("gemini-1.5-flash"), None)?;
//! let chat = model.start_chat(StartChatParams::default())?;
//! let response = chat.send_message("Hello!").await?;
//! println!("{}", response.text()?);
//! # Ok(())
//! # }
//! ```
mod api;
mod backend;
mod constants;
mod error;
mod helpers;
mod logger;
mod methods;
mod models;
mod public_types;
mod requests;
pub mod types;

#[doc(inline)]
pub use api::{
    get_ai, get_generative_model, get_vertex_ai, AiHttpTransport, AiService, ReqwestTransport,
};

pub(crate) use api::drop_services_for_app;

#[doc(inline)]
pub use backend::{Backend, BackendType};

#[doc(inline)]
pub use error::{
    internal_error, invalid_argument, invalid_content, AiError, AiErrorCode, AiResult,
    CustomErrorData,
};

#[doc(inline)]
pub use methods::chat_session::{validate_chat_history, ChatMessage, ChatSession, StartChatParams};

#[doc(inline)]
pub use models::generative_model::{GenerativeModel, ModelParams};

#[doc(inline)]
pub use public_types::AiOptions;

#[doc(inline)]
pub use requests::{HttpMethod, PreparedRequest, RequestOptions};

#[doc(inline)]
pub use types::{
    Candidate, Content, FinishReason, FunctionCall, FunctionDeclaration, FunctionResponse,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part, PartData,
    PromptFeedback, Role, Schema, SchemaType, SchemaViolation, Tool, UsageMetadata,
};
