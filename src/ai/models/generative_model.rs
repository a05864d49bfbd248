use std::sync::Arc;

use crate::ai::api::AiService;
use crate::ai::backend::BackendType;
use crate::ai::error::{AiError, AiErrorCode, AiResult};
use crate::ai::methods::chat_session::{ChatSession, StartChatParams};
use crate::ai::requests::RequestOptions;
use crate::ai::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Tool};

/// Model name plus the request defaults attached to every call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub tools: Option<Vec<Tool>>,
    pub system_instruction: Option<Content>,
    pub generation_config: Option<GenerationConfig>,
}

impl ModelParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_system_instruction(mut self, instruction: Content) -> Self {
        self.system_instruction = Some(instruction);
        self
    }
}

/// A Gemini model bound to an [`AiService`].
#[derive(Clone, Debug)]
pub struct GenerativeModel {
    service: Arc<AiService>,
    model: String,
    tools: Option<Vec<Tool>>,
    system_instruction: Option<Content>,
    generation_config: Option<GenerationConfig>,
    default_request_options: Option<RequestOptions>,
}

impl GenerativeModel {
    /// Creates a model, normalizing the name for the service's backend.
    pub fn new(
        service: Arc<AiService>,
        params: ModelParams,
        request_options: Option<RequestOptions>,
    ) -> AiResult<Self> {
        if params.model.trim().is_empty() {
            return Err(AiError::new(
                AiErrorCode::NoModel,
                "Must provide a model name. Example: get_generative_model(ai, ModelParams::new(\"my-model-name\"), None)",
                None,
            ));
        }
        let model = normalize_model_name(params.model, service.backend_type());
        Ok(Self {
            service,
            model,
            tools: params.tools,
            system_instruction: params.system_instruction,
            generation_config: params.generation_config,
            default_request_options: request_options,
        })
    }

    /// Fully qualified model resource name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> Option<&[Tool]> {
        self.tools.as_deref()
    }

    pub fn service(&self) -> &Arc<AiService> {
        &self.service
    }

    /// One-shot generation; accepts a prompt string, a list of parts or a full request.
    ///
    /// Tools, system instruction and generation config from the model
    /// parameters fill in whatever the request leaves unset.
    pub async fn generate_content(
        &self,
        request: impl Into<GenerateContentRequest>,
    ) -> AiResult<GenerateContentResponse> {
        let request = self.with_model_defaults(request.into());
        self.send(&request, None).await
    }

    /// Starts a chat session seeded with `params.history`.
    pub fn start_chat(&self, params: StartChatParams) -> AiResult<ChatSession> {
        ChatSession::new(self.clone(), params)
    }

    pub(crate) fn with_model_defaults(
        &self,
        mut request: GenerateContentRequest,
    ) -> GenerateContentRequest {
        if request.tools.is_none() {
            request.tools = self.tools.clone();
        }
        if request.system_instruction.is_none() {
            request.system_instruction = self.system_instruction.clone();
        }
        if request.generation_config.is_none() {
            request.generation_config = self.generation_config.clone();
        }
        request
    }

    pub(crate) async fn send(
        &self,
        request: &GenerateContentRequest,
        request_options: Option<RequestOptions>,
    ) -> AiResult<GenerateContentResponse> {
        let options = request_options.or_else(|| self.default_request_options.clone());
        self.service
            .generate_content(&self.model, request, options)
            .await
    }
}

fn normalize_model_name(model: String, backend_type: BackendType) -> String {
    match backend_type {
        BackendType::GoogleAi => {
            if model.starts_with("models/") {
                model
            } else {
                format!("models/{model}")
            }
        }
        BackendType::VertexAi => {
            if model.starts_with("models/") {
                format!("publishers/google/{model}")
            } else if model.contains('/') {
                model
            } else {
                format!("publishers/google/models/{model}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::api::{get_ai, get_vertex_ai};
    use crate::ai::types::{FunctionDeclaration, Schema};
    use crate::app::{initialize_app, FirebaseAppSettings, FirebaseOptions};
    use crate::test_support::ai::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    fn unique_settings() -> FirebaseAppSettings {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        FirebaseAppSettings {
            name: Some(format!("gen-model-{}", COUNTER.fetch_add(1, Ordering::SeqCst))),
            ..Default::default()
        }
    }

    fn options() -> FirebaseOptions {
        FirebaseOptions {
            api_key: Some("api".into()),
            project_id: Some("project".into()),
            app_id: Some("app".into()),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_names_per_backend() {
        assert_eq!(
            normalize_model_name("gemini-pro".into(), BackendType::GoogleAi),
            "models/gemini-pro"
        );
        assert_eq!(
            normalize_model_name("models/gemini-pro".into(), BackendType::GoogleAi),
            "models/gemini-pro"
        );
        assert_eq!(
            normalize_model_name("gemini-pro".into(), BackendType::VertexAi),
            "publishers/google/models/gemini-pro"
        );
        assert_eq!(
            normalize_model_name("models/gemini-pro".into(), BackendType::VertexAi),
            "publishers/google/models/gemini-pro"
        );
        assert_eq!(
            normalize_model_name("publishers/acme/models/x".into(), BackendType::VertexAi),
            "publishers/acme/models/x"
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_model_name_is_rejected() {
        let app = initialize_app(options(), Some(unique_settings())).await.unwrap();
        let ai = get_ai(Some(app), None).await.unwrap();
        let err = GenerativeModel::new(ai, ModelParams::new("  "), None).unwrap_err();
        assert_eq!(err.code(), AiErrorCode::NoModel);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn generate_content_attaches_tools_and_default_options() {
        let app = initialize_app(options(), Some(unique_settings())).await.unwrap();
        let ai = get_vertex_ai(Some(app), "us-central1").await.unwrap();
        let transport = ScriptedTransport::new();
        transport.push_text("A cat is a small carnivorous mammal.");
        ai.set_transport(Arc::new(transport.clone()));

        let tool = Tool {
            function_declarations: vec![FunctionDeclaration {
                name: "lookup".into(),
                description: "Looks things up".into(),
                parameters: Some(Schema::object([("term", Schema::string())])),
            }],
        };
        let model = GenerativeModel::new(
            ai,
            ModelParams::new("gemini-1.5-flash")
                .with_tools(vec![tool])
                .with_system_instruction(Content::system_text("be brief")),
            Some(RequestOptions {
                timeout: Some(Duration::from_secs(5)),
                base_url: Some("https://example.com".into()),
            }),
        )
        .unwrap();
        assert_eq!(model.model(), "publishers/google/models/gemini-1.5-flash");

        let response = model.generate_content("what is a cat?").await.unwrap();
        assert_eq!(response.text().unwrap(), "A cat is a small carnivorous mammal.");

        let requests = transport.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.as_str(),
            "https://example.com/v1beta/projects/project/locations/us-central1/publishers/google/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(requests[0].timeout, Duration::from_secs(5));
        let body = &requests[0].body;
        assert_eq!(body["contents"][0]["parts"][0]["text"], "what is a cat?");
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "lookup");
        assert_eq!(body["systemInstruction"], json!({"role": "system", "parts": [{"text": "be brief"}]}));
    }
}
