use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Function,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
            Role::Function => "function",
            Role::System => "system",
        }
    }
}

fn default_role() -> Role {
    Role::Model
}

/// One turn of a conversation: a role plus its ordered parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    pub fn system_text(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Part::text(text)])
    }

    /// Concatenated text of all text parts, thought summaries excluded.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| !part.is_thought())
            .filter_map(Part::as_text)
            .collect()
    }
}

/// A directive from the model asking the caller to run a declared function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// The caller's answer to a [`FunctionCall`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

impl FunctionResponse {
    pub fn new(name: impl Into<String>, response: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            response,
        }
    }
}

/// A single piece of a [`Content`].
///
/// On the wire a part is an object carrying one of `text`, `functionCall` or
/// `functionResponse`, next to optional metadata such as `thought` and
/// `thoughtSignature`. Fields this crate does not model (inline data, file
/// data, ...) are kept in [`Part::extra`] and written back unchanged, so a
/// model turn replayed from history reaches the backend as it was received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPart", into = "RawPart")]
pub struct Part {
    pub data: PartData,
    /// Marks a thought summary rather than answer text.
    pub thought: bool,
    /// Opaque signature the backend expects back with the part it came on.
    pub thought_signature: Option<String>,
    pub extra: Map<String, Value>,
}

/// Payload of a [`Part`].
#[derive(Clone, Debug, PartialEq)]
pub enum PartData {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    /// A part kind this crate does not model; its fields live in [`Part::extra`].
    Other,
}

impl Part {
    pub fn new(data: PartData) -> Self {
        Self {
            data,
            thought: false,
            thought_signature: None,
            extra: Map::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PartData::Text(text.into()))
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self::new(PartData::FunctionCall(call))
    }

    pub fn function_response(response: FunctionResponse) -> Self {
        Self::new(PartData::FunctionResponse(response))
    }

    /// Text of a text part, including thought summaries.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            PartData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match &self.data {
            PartData::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_function_response(&self) -> bool {
        matches!(self.data, PartData::FunctionResponse(_))
    }

    pub fn is_thought(&self) -> bool {
        self.thought
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self.data {
            PartData::Text(_) => "text",
            PartData::FunctionCall(_) => "functionCall",
            PartData::FunctionResponse(_) => "functionResponse",
            PartData::Other => "other",
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing_if = "is_false")]
    thought: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl From<RawPart> for Part {
    fn from(raw: RawPart) -> Self {
        let RawPart {
            text,
            function_call,
            function_response,
            thought,
            thought_signature,
            mut other,
        } = raw;

        // functionCall > functionResponse > text; a payload that loses keeps its field.
        let mut data = PartData::Other;
        if let Some(call) = function_call {
            data = PartData::FunctionCall(call);
        }
        if let Some(response) = function_response {
            if matches!(data, PartData::Other) {
                data = PartData::FunctionResponse(response);
            } else if let Ok(value) = serde_json::to_value(response) {
                other.insert("functionResponse".to_string(), value);
            }
        }
        if let Some(text) = text {
            if matches!(data, PartData::Other) {
                data = PartData::Text(text);
            } else {
                other.insert("text".to_string(), Value::String(text));
            }
        }

        Part {
            data,
            thought,
            thought_signature,
            extra: other,
        }
    }
}

impl From<Part> for RawPart {
    fn from(part: Part) -> Self {
        let mut raw = RawPart {
            text: None,
            function_call: None,
            function_response: None,
            thought: part.thought,
            thought_signature: part.thought_signature,
            other: part.extra,
        };
        match part.data {
            PartData::Text(text) => raw.text = Some(text),
            PartData::FunctionCall(call) => raw.function_call = Some(call),
            PartData::FunctionResponse(response) => raw.function_response = Some(response),
            PartData::Other => {}
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parts_use_gemini_wire_shape() {
        let content = Content::new(
            Role::Function,
            vec![Part::function_response(FunctionResponse::new(
                "findPostsByCategory",
                json!({"posts": []}),
            ))],
        );
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({
                "role": "function",
                "parts": [
                    {"functionResponse": {"name": "findPostsByCategory", "response": {"posts": []}}}
                ]
            })
        );
    }

    #[test]
    fn parses_model_turn_with_function_call_and_extra_fields() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "Procurando"},
                {"functionCall": {"name": "findPostsByCategory", "args": {"category": ["nodejs"]}},
                 "thoughtSignature": "abc"},
                {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
            ]
        }))
        .unwrap();

        assert_eq!(content.role, Role::Model);
        assert_eq!(content.text(), "Procurando");
        let call = content.parts[1].as_function_call().unwrap();
        assert_eq!(call.name, "findPostsByCategory");
        assert_eq!(call.args, json!({"category": ["nodejs"]}));
        assert_eq!(content.parts[1].thought_signature.as_deref(), Some("abc"));
        assert_eq!(content.parts[2].kind(), "other");
        assert!(content.parts[2].extra.contains_key("inlineData"));
    }

    #[test]
    fn part_metadata_survives_reserialization() {
        let wire = json!({
            "role": "model",
            "parts": [
                {"functionCall": {"name": "findPostsByCategory", "args": {"category": ["nodejs"]}},
                 "thoughtSignature": "abc"},
                {"text": "resumo", "thought": true, "thoughtSignature": "def"},
                {"text": "Oi", "videoMetadata": {"startOffset": "1s"}},
                {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
            ]
        });
        let content: Content = serde_json::from_value(wire.clone()).unwrap();

        assert_eq!(serde_json::to_value(&content).unwrap(), wire);
    }

    #[test]
    fn thought_parts_are_left_out_of_text() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "pensando no pedido", "thought": true},
                {"text": "resposta"}
            ]
        }))
        .unwrap();

        assert!(content.parts[0].is_thought());
        assert_eq!(content.parts[0].as_text(), Some("pensando no pedido"));
        assert!(!content.parts[1].is_thought());
        assert_eq!(content.text(), "resposta");
    }

    #[test]
    fn plain_parts_serialize_without_metadata() {
        assert_eq!(
            serde_json::to_value(Part::text("oi")).unwrap(),
            json!({"text": "oi"})
        );
    }

    #[test]
    fn missing_role_defaults_to_model() {
        let content: Content = serde_json::from_value(json!({"parts": [{"text": "oi"}]})).unwrap();
        assert_eq!(content.role, Role::Model);
    }
}
