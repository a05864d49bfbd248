use async_lock::Mutex;

use crate::ai::error::{invalid_argument, invalid_content, AiResult};
use crate::ai::logger::LOGGER;
use crate::ai::models::generative_model::GenerativeModel;
use crate::ai::requests::RequestOptions;
use crate::ai::types::{Content, GenerateContentRequest, GenerateContentResponse, Part, Role};

/// Parameters for [`GenerativeModel::start_chat`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StartChatParams {
    /// Turns the conversation starts from.
    pub history: Vec<Content>,
    pub request_options: Option<RequestOptions>,
}

impl StartChatParams {
    pub fn with_history(history: Vec<Content>) -> Self {
        Self {
            history,
            request_options: None,
        }
    }
}

/// Body of a single [`ChatSession::send_message`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage(Vec<Part>);

impl From<&str> for ChatMessage {
    fn from(text: &str) -> Self {
        ChatMessage(vec![Part::text(text)])
    }
}

impl From<String> for ChatMessage {
    fn from(text: String) -> Self {
        ChatMessage(vec![Part::text(text)])
    }
}

impl From<Part> for ChatMessage {
    fn from(part: Part) -> Self {
        ChatMessage(vec![part])
    }
}

impl From<Vec<Part>> for ChatMessage {
    fn from(parts: Vec<Part>) -> Self {
        ChatMessage(parts)
    }
}

impl ChatMessage {
    /// Turns the message into a `user` turn, or a `function` turn when it only
    /// carries function responses.
    fn into_content(self) -> AiResult<Content> {
        let parts = self.0;
        if parts.is_empty() {
            return Err(invalid_argument("Chat message must contain at least one part"));
        }
        let responses = parts.iter().filter(|part| part.is_function_response()).count();
        if responses == 0 {
            Ok(Content::new(Role::User, parts))
        } else if responses == parts.len() {
            Ok(Content::new(Role::Function, parts))
        } else {
            Err(invalid_content(
                "Within a single message, functionResponse parts cannot be mixed with other part types",
            ))
        }
    }
}

/// A conversation with a model; keeps the history of exchanged turns.
///
/// Messages sent concurrently on the same session are processed one at a time
/// in the order their locks are acquired.
#[derive(Debug)]
pub struct ChatSession {
    model: GenerativeModel,
    request_options: Option<RequestOptions>,
    history: Mutex<Vec<Content>>,
}

impl ChatSession {
    pub(crate) fn new(model: GenerativeModel, params: StartChatParams) -> AiResult<Self> {
        validate_chat_history(&params.history)?;
        Ok(Self {
            model,
            request_options: params.request_options,
            history: Mutex::new(params.history),
        })
    }

    /// Snapshot of the turns exchanged so far (seed history included).
    pub async fn history(&self) -> Vec<Content> {
        self.history.lock().await.clone()
    }

    /// Sends the next turn and records both it and the model's reply.
    ///
    /// When the response has no candidate content (for example a blocked
    /// prompt) the history is left untouched and the response is still returned.
    pub async fn send_message(
        &self,
        message: impl Into<ChatMessage>,
    ) -> AiResult<GenerateContentResponse> {
        let new_content = message.into().into_content()?;

        let mut history = self.history.lock().await;
        let mut contents = history.clone();
        contents.push(new_content.clone());
        let request = self
            .model
            .with_model_defaults(GenerateContentRequest::from(contents));

        let response = self
            .model
            .send(&request, self.request_options.clone())
            .await?;

        match response
            .first_candidate()
            .and_then(|candidate| candidate.content.as_ref())
            .filter(|content| !content.parts.is_empty())
        {
            Some(reply) => {
                history.push(new_content);
                history.push(Content::new(Role::Model, reply.parts.clone()));
            }
            None => {
                let blocked = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|feedback| feedback.block_reason.clone());
                LOGGER.warn(format!(
                    "send_message() was unsuccessful ({}); history left unchanged",
                    blocked.as_deref().unwrap_or("no candidate content")
                ));
            }
        }

        Ok(response)
    }
}

fn allowed_parts(role: Role) -> &'static [&'static str] {
    match role {
        Role::User => &["text", "other"],
        Role::Model => &["text", "functionCall"],
        Role::Function => &["functionResponse"],
        Role::System => &["text"],
    }
}

fn allowed_previous(role: Role) -> &'static [Role] {
    match role {
        Role::User => &[Role::Model, Role::Function],
        Role::Model => &[Role::User, Role::Function],
        Role::Function => &[Role::Model],
        Role::System => &[],
    }
}

/// Checks that `history` is a conversation the backend will accept.
pub fn validate_chat_history(history: &[Content]) -> AiResult<()> {
    let mut previous: Option<Role> = None;
    for content in history {
        let role = content.role;
        if role == Role::System {
            return Err(invalid_content(
                "System instructions belong in the model parameters, not the chat history",
            ));
        }
        match previous {
            None if role != Role::User => {
                return Err(invalid_content(format!(
                    "First content should be with role 'user', got {}",
                    role.as_str()
                )))
            }
            Some(prev) if !allowed_previous(role).contains(&prev) => {
                return Err(invalid_content(format!(
                    "Content with role '{}' can't follow '{}'",
                    role.as_str(),
                    prev.as_str()
                )))
            }
            _ => {}
        }
        if content.parts.is_empty() {
            return Err(invalid_content("Each content should have at least one part"));
        }
        if let Some(part) = content
            .parts
            .iter()
            .find(|part| !allowed_parts(role).contains(&part.kind()))
        {
            return Err(invalid_content(format!(
                "Content with role '{}' can't contain '{}' part",
                role.as_str(),
                part.kind()
            )));
        }
        previous = Some(role);
    }
    Ok(())
}
