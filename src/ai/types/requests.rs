use serde::{Deserialize, Serialize};

use crate::ai::types::content::{Content, Part, Role};
use crate::ai::types::schema::Tool;

/// Sampling parameters forwarded verbatim to the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// Body of a `generateContent` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl From<&str> for GenerateContentRequest {
    fn from(prompt: &str) -> Self {
        Content::user_text(prompt).into()
    }
}

impl From<String> for GenerateContentRequest {
    fn from(prompt: String) -> Self {
        Content::user_text(prompt).into()
    }
}

impl From<Vec<Part>> for GenerateContentRequest {
    fn from(parts: Vec<Part>) -> Self {
        Content::new(Role::User, parts).into()
    }
}

impl From<Content> for GenerateContentRequest {
    fn from(content: Content) -> Self {
        vec![content].into()
    }
}

impl From<Vec<Content>> for GenerateContentRequest {
    fn from(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Default::default()
        }
    }
}
