/// Service identifier used for error codes and instance identifiers.
pub const AI_TYPE: &str = "AI";

/// Default region for Vertex AI requests.
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Default domain for Firebase AI REST API requests.
pub const DEFAULT_DOMAIN: &str = "firebasevertexai.googleapis.com";

/// API version segment of every request path.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Request timeout applied when [`RequestOptions::timeout`](crate::ai::RequestOptions) is unset.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 180_000;

/// Language tag used in the `x-goog-api-client` header.
pub const LANGUAGE_TAG: &str = "gl-rs";

/// Current crate version propagated to telemetry headers.
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");
