//! # firebase-ai-chat-bridge
//!
//! A prompt-to-Gemini chat loop with function calling, on top of a small
//! Firebase AI REST client.
//!
//! - [`app`]: Firebase options and named app instances.
//! - [`ai`]: AI service lookup, generative models, chat sessions and the
//!   `generateContent` wire types.
//! - [`bridge`]: the chat bridge itself, its mocked blog search tool and the
//!   input/output surfaces it is wired to.
//! - [`logger`]: named loggers with a global level and an optional user callback.
//!
//! The `chat-bridge` binary reads prompts from stdin, one per line, and prints
//! the placeholder and final answers to stdout.

pub mod ai;
pub mod app;
pub mod bridge;
pub mod logger;

#[cfg(test)]
pub mod test_support;
