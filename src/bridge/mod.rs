//! # Chat bridge
//!
//! Ties a prompt source and an output surface to a Gemini chat that may call
//! the mocked `findPostsByCategory` blog search.
//!
//! A submission writes a placeholder, sends the prompt on a fresh chat session
//! seeded with [`seed_history`], runs the first function call the model asks
//! for and sends its result back, then writes the model's final text.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use firebase_ai_chat_bridge::app::{initialize_app, FirebaseOptions};
//! use firebase_ai_chat_bridge::bridge::{BridgeSettings, ChatBridge, InputField, MemoryOutput};
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
//! let output = Arc::new(MemoryOutput::new());
//! let bridge = ChatBridge::connect(app, BridgeSettings::default(), output.clone()).await?;
//!
//! let field = InputField::new("Quero posts sobre NodeJS");
//! bridge.on_key("Enter", &field).await?;
//! println!("{}", output.text());
//! # Ok(())
//! # }
//! ```
mod chat_bridge;
mod config;
mod error;
mod logger;
mod seed;
mod surface;
mod tools;

#[doc(inline)]
pub use chat_bridge::{ChatBridge, ExchangeState, Outcome};

#[doc(inline)]
pub use config::{
    BridgeConfig, BridgeSettings, ConcurrencyPolicy, DEFAULT_ERROR_TEXT, DEFAULT_MODEL,
    DEFAULT_PLACEHOLDER,
};

#[doc(inline)]
pub use error::{BridgeError, BridgeResult};

#[doc(inline)]
pub use seed::seed_history;

#[doc(inline)]
pub use surface::{InputField, MemoryOutput, OutputSurface, PromptSource, WriterOutput};

#[doc(inline)]
pub use tools::{
    find_posts_by_category, find_posts_declaration, tool_declarations, BlogPost,
    FindPostsByCategoryArgs, PostSearchResult, ToolCall, FIND_POSTS_BY_CATEGORY,
};
