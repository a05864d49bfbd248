//! Firebase app bootstrap: options, named app instances and the app registry.
//!
//! ```
//! # use firebase_ai_chat_bridge::app::{initialize_app, FirebaseAppSettings, FirebaseOptions};
//! # async fn example() {
//! let app = initialize_app(
//!     FirebaseOptions {
//!         api_key: Some("api-key".into()),
//!         project_id: Some("project".into()),
//!         app_id: Some("1:123:web:abc".into()),
//!         ..Default::default()
//!     },
//!     Some(FirebaseAppSettings::default()),
//! )
//! .await
//! .unwrap();
//! assert_eq!(app.name(), "[DEFAULT]");
//! # }
//! ```
mod api;
mod constants;
mod errors;
mod logger;
mod registry;
mod types;

#[doc(inline)]
pub use api::{delete_app, get_app, get_apps, initialize_app, on_log, set_log_level, SDK_VERSION};

#[doc(inline)]
pub use constants::DEFAULT_ENTRY_NAME;

#[doc(inline)]
pub use errors::{AppError, AppResult};

#[doc(inline)]
pub use logger::{LogCallback, LogLevel, LogOptions, Logger, LOGGER};

#[doc(inline)]
pub use types::{FirebaseApp, FirebaseAppConfig, FirebaseAppSettings, FirebaseOptions};
