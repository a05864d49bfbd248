//! Test utilities shared across crate-level unit tests.

pub mod ai;
pub mod http;

pub use ai::ScriptedTransport;
pub use http::start_mock_server;
