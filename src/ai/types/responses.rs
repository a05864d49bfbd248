use serde::{Deserialize, Serialize};

use crate::ai::error::{AiError, AiErrorCode, AiResult, CustomErrorData};
use crate::ai::types::content::{Content, FunctionCall, Part};

/// Why a candidate stopped generating.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Blocklist,
    ProhibitedContent,
    Spii,
    MalformedFunctionCall,
    #[serde(other)]
    Other,
}

impl FinishReason {
    /// Reasons for which the candidate's content must not be surfaced.
    fn is_bad(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

/// Parsed `generateContent` response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    pub fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Text of the first candidate.
    ///
    /// Fails when the prompt was blocked or the first candidate stopped for a
    /// safety-related reason. A response without candidates (and without block
    /// feedback) yields an empty string.
    pub fn text(&self) -> AiResult<String> {
        let Some(candidate) = self.first_candidate() else {
            if let Some(reason) = self
                .prompt_feedback
                .as_ref()
                .and_then(|feedback| feedback.block_reason.as_deref())
            {
                return Err(self.response_error(format!("Text not available. Prompt blocked: {reason}")));
            }
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_ref().filter(|reason| reason.is_bad()) {
            let detail = candidate.finish_message.as_deref().unwrap_or_default();
            return Err(self.response_error(format!(
                "Response was blocked due to {reason:?}. {detail}"
            )));
        }

        Ok(candidate
            .content
            .as_ref()
            .map(Content::text)
            .unwrap_or_default())
    }

    /// Function-call directives of the first candidate, `None` when there are none.
    pub fn function_calls(&self) -> Option<Vec<FunctionCall>> {
        let calls: Vec<FunctionCall> = self
            .first_candidate()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(Part::as_function_call)
            .cloned()
            .collect();
        if calls.is_empty() {
            None
        } else {
            Some(calls)
        }
    }

    fn response_error(&self, message: String) -> AiError {
        let data = serde_json::to_value(self)
            .ok()
            .map(|value| CustomErrorData::default().with_response(value));
        AiError::new(AiErrorCode::ResponseError, message.trim_end(), data)
    }
}
