use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ai::{
    get_ai, get_generative_model, validate_chat_history, AiOptions, Content, GenerativeModel,
    ModelParams, Part, StartChatParams,
};
use crate::app::FirebaseApp;
use crate::bridge::config::{BridgeSettings, ConcurrencyPolicy};
use crate::bridge::error::BridgeResult;
use crate::bridge::logger::LOGGER;
use crate::bridge::seed::seed_history;
use crate::bridge::surface::{OutputSurface, PromptSource};
use crate::bridge::tools::{tool_declarations, ToolCall};

/// How a submission ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Empty prompt or a key other than Enter; nothing was sent.
    Ignored,
    /// The final text was written to the output surface.
    Rendered(String),
    /// A newer submission started before this one finished; its result was dropped.
    Superseded,
}

/// Progress of a single submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    AwaitingFirstResponse,
    ExecutingTool,
    AwaitingFollowupResponse,
    Done,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExchangeState::Idle => "idle",
            ExchangeState::AwaitingFirstResponse => "awaiting first response",
            ExchangeState::ExecutingTool => "executing tool",
            ExchangeState::AwaitingFollowupResponse => "awaiting follow-up response",
            ExchangeState::Done => "done",
        };
        f.write_str(label)
    }
}

/// Connects a prompt source and an output surface to a Gemini chat with the
/// `findPostsByCategory` tool.
///
/// Every submission runs its own chat session seeded with the same history.
/// Submissions may overlap; [`ConcurrencyPolicy`] decides which of them may
/// write to the output surface.
pub struct ChatBridge {
    model: GenerativeModel,
    output: Arc<dyn OutputSurface>,
    settings: BridgeSettings,
    seed: Vec<Content>,
    generation: AtomicU64,
}

impl fmt::Debug for ChatBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatBridge")
            .field("model", &self.model.model())
            .field("policy", &self.settings.policy)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl ChatBridge {
    /// Resolves the AI service of `app` for the configured backend and builds
    /// a bridge around a model that declares the blog search tool.
    pub async fn connect(
        app: FirebaseApp,
        settings: BridgeSettings,
        output: Arc<dyn OutputSurface>,
    ) -> BridgeResult<Self> {
        let ai = get_ai(
            Some(app),
            Some(AiOptions {
                backend: Some(settings.backend.clone()),
            }),
        )
        .await?;
        let model = get_generative_model(
            ai,
            ModelParams::new(settings.model.clone()).with_tools(tool_declarations()),
            settings.request_options.clone(),
        )?;
        Ok(Self::new(model, settings, output))
    }

    pub fn new(
        model: GenerativeModel,
        settings: BridgeSettings,
        output: Arc<dyn OutputSurface>,
    ) -> Self {
        Self {
            model,
            output,
            settings,
            seed: seed_history(),
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the seed history every chat session starts from.
    pub fn with_seed_history(mut self, seed: Vec<Content>) -> BridgeResult<Self> {
        validate_chat_history(&seed)?;
        self.seed = seed;
        Ok(self)
    }

    pub fn model(&self) -> &GenerativeModel {
        &self.model
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Key handler of the input field: submits the field's prompt on Enter.
    pub async fn on_key<S>(&self, key: &str, source: &S) -> BridgeResult<Outcome>
    where
        S: PromptSource + ?Sized,
    {
        if key != "Enter" {
            return Ok(Outcome::Ignored);
        }
        self.submit(&source.prompt()).await
    }

    /// Runs one prompt through the model, executing the tool call when the
    /// model asks for one, and writes the final text to the output surface.
    ///
    /// When a submission that may still write fails, the configured error text
    /// replaces the placeholder and the error is returned.
    pub async fn submit(&self, prompt: &str) -> BridgeResult<Outcome> {
        if prompt.trim().is_empty() {
            LOGGER.debug("Ignoring empty prompt");
            return Ok(Outcome::Ignored);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.output.set_text(&self.settings.placeholder);

        match self.exchange(generation, prompt).await {
            Ok(Some(text)) => Ok(Outcome::Rendered(text)),
            Ok(None) => Ok(Outcome::Superseded),
            Err(err) => {
                LOGGER.warn(format!("Submission #{generation} failed: {err}"));
                if let Some(error_text) = &self.settings.error_text {
                    if self.may_write(generation) {
                        self.output.set_text(error_text);
                    }
                }
                Err(err)
            }
        }
    }

    /// Returns `None` when the submission was superseded.
    async fn exchange(&self, generation: u64, prompt: &str) -> BridgeResult<Option<String>> {
        let mut state = ExchangeState::Idle;
        let chat = self
            .model
            .start_chat(StartChatParams::with_history(self.seed.clone()))?;

        self.advance(generation, &mut state, ExchangeState::AwaitingFirstResponse);
        let mut response = chat.send_message(prompt).await?;
        if !self.may_write(generation) {
            return Ok(self.superseded(generation, state));
        }

        if let Some(call) = response.function_calls().and_then(|calls| calls.into_iter().next()) {
            self.advance(generation, &mut state, ExchangeState::ExecutingTool);
            let function_response = ToolCall::from_function_call(&call)?.execute()?;

            self.advance(generation, &mut state, ExchangeState::AwaitingFollowupResponse);
            response = chat
                .send_message(Part::function_response(function_response))
                .await?;
            if !self.may_write(generation) {
                return Ok(self.superseded(generation, state));
            }
        }

        let text = response.text()?;
        self.advance(generation, &mut state, ExchangeState::Done);
        self.output.set_text(&text);
        Ok(Some(text))
    }

    fn may_write(&self, generation: u64) -> bool {
        match self.settings.policy {
            ConcurrencyPolicy::LastCompletionWins => true,
            ConcurrencyPolicy::LatestSubmissionWins => {
                self.generation.load(Ordering::SeqCst) == generation
            }
        }
    }

    fn advance(&self, generation: u64, state: &mut ExchangeState, next: ExchangeState) {
        LOGGER.debug(format!("Submission #{generation}: {state} -> {next}"));
        *state = next;
    }

    fn superseded(&self, generation: u64, state: ExchangeState) -> Option<String> {
        LOGGER.debug(format!(
            "Submission #{generation} superseded while {state}; discarding response"
        ));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiErrorCode, Role};
    use crate::app::{initialize_app, FirebaseAppSettings, FirebaseOptions};
    use crate::bridge::error::BridgeError;
    use crate::bridge::surface::{InputField, MemoryOutput};
    use crate::bridge::tools::{find_posts_by_category, FindPostsByCategoryArgs};
    use crate::test_support::ai::{function_call_response, text_response, ScriptedTransport};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn unique_settings() -> FirebaseAppSettings {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        FirebaseAppSettings {
            name: Some(format!("bridge-{}", COUNTER.fetch_add(1, Ordering::SeqCst))),
            ..Default::default()
        }
    }

    async fn bridge_with(
        transport: &ScriptedTransport,
        policy: ConcurrencyPolicy,
    ) -> (ChatBridge, Arc<MemoryOutput>) {
        let app = initialize_app(
            FirebaseOptions {
                api_key: Some("api".into()),
                project_id: Some("project".into()),
                app_id: Some("app".into()),
                ..Default::default()
            },
            Some(unique_settings()),
        )
        .await
        .unwrap();
        let output = Arc::new(MemoryOutput::new());
        let settings = BridgeSettings {
            policy,
            ..Default::default()
        };
        let bridge = ChatBridge::connect(app, settings, output.clone())
            .await
            .unwrap();
        bridge
            .model()
            .service()
            .set_transport(Arc::new(transport.clone()));
        (bridge, output)
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        while !condition() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_prompt_sends_nothing_and_leaves_output() {
        let transport = ScriptedTransport::new();
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        assert_eq!(bridge.submit("").await.unwrap(), Outcome::Ignored);
        assert_eq!(bridge.submit("   \n").await.unwrap(), Outcome::Ignored);
        assert_eq!(transport.request_count(), 0);
        assert!(output.writes().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn only_enter_submits_the_field() {
        let transport = ScriptedTransport::new();
        transport.push_text("Olá!");
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;
        let field = InputField::new("oi");

        assert_eq!(bridge.on_key("a", &field).await.unwrap(), Outcome::Ignored);
        assert_eq!(transport.request_count(), 0);

        let outcome = bridge.on_key("Enter", &field).await.unwrap();
        assert_eq!(outcome, Outcome::Rendered("Olá!".into()));
        assert_eq!(output.text(), "Olá!");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn plain_answer_renders_after_single_call() {
        let transport = ScriptedTransport::new();
        transport.push_text("Um gato é um mamífero.");
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let outcome = bridge.submit("o que é um gato?").await.unwrap();
        assert_eq!(outcome, Outcome::Rendered("Um gato é um mamífero.".into()));
        assert_eq!(output.writes(), vec!["Buscando...", "Um gato é um mamífero."]);

        let requests = transport.take_requests();
        assert_eq!(requests.len(), 1);
        let body = &requests[0].body;
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "o que é um gato?");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "findPostsByCategory"
        );
        assert!(requests[0]
            .url
            .as_str()
            .ends_with("/locations/us-central1/publishers/google/models/gemini-1.5-flash-preview-0514:generateContent"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn function_call_result_is_sent_back_as_function_turn() {
        let transport = ScriptedTransport::new();
        transport.push_function_call("findPostsByCategory", json!({"category": ["nodejs"]}));
        transport.push_text("Encontrei 3 posts sobre <a href=\"https://codesilva.github.io\">nodejs</a>.");
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let outcome = bridge.submit("posts sobre nodejs").await.unwrap();
        let Outcome::Rendered(text) = outcome else {
            panic!("expected a rendered outcome");
        };
        assert!(text.starts_with("Encontrei 3 posts"));
        assert_eq!(output.text(), text);

        let requests = transport.take_requests();
        assert_eq!(requests.len(), 2);
        let contents = requests[1].body["contents"].as_array().unwrap().clone();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[3]["parts"][0]["functionCall"]["name"], "findPostsByCategory");

        let function_turn = &contents[4];
        assert_eq!(function_turn["role"], Role::Function.as_str());
        let function_response = &function_turn["parts"][0]["functionResponse"];
        assert_eq!(function_response["name"], "findPostsByCategory");
        let expected = find_posts_by_category(&FindPostsByCategoryArgs {
            category: vec!["nodejs".into()],
        });
        assert_eq!(function_response["response"], serde_json::to_value(expected).unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn replayed_function_call_turn_keeps_thought_signature() {
        let transport = ScriptedTransport::new();
        transport.push_response(Ok(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{
                    "functionCall": {"name": "findPostsByCategory", "args": {"category": ["nodejs"]}},
                    "thoughtSignature": "abc"
                }]},
                "finishReason": "STOP"
            }]
        })));
        transport.push_response(Ok(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "procurando posts de nodejs", "thought": true},
                    {"text": "Aqui estão os posts."}
                ]},
                "finishReason": "STOP"
            }]
        })));
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let outcome = bridge.submit("posts sobre nodejs").await.unwrap();
        assert_eq!(outcome, Outcome::Rendered("Aqui estão os posts.".into()));
        assert_eq!(output.text(), "Aqui estão os posts.");

        let requests = transport.take_requests();
        assert_eq!(requests.len(), 2);
        let replayed = &requests[1].body["contents"][3]["parts"][0];
        assert_eq!(replayed["functionCall"]["name"], "findPostsByCategory");
        assert_eq!(replayed["thoughtSignature"], "abc");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn java_search_returns_empty_posts_to_model() {
        let transport = ScriptedTransport::new();
        transport.push_function_call("findPostsByCategory", json!({"category": ["java"]}));
        transport.push_text("Nenhum post encontrado.");
        let (bridge, _output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        bridge.submit("posts sobre java").await.unwrap();
        let requests = transport.take_requests();
        assert_eq!(
            requests[1].body["contents"][4]["parts"][0]["functionResponse"]["response"],
            json!({"posts": []})
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unknown_function_surfaces_error_without_second_call() {
        let transport = ScriptedTransport::new();
        transport.push_function_call("deleteAllPosts", json!({}));
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let err = bridge.submit("apague tudo").await.unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedFunction { ref name } if name == "deleteAllPosts"));
        assert_eq!(transport.request_count(), 1);
        assert_eq!(output.text(), "Não foi possível obter uma resposta.");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_arguments_surface_error() {
        let transport = ScriptedTransport::new();
        transport.push_function_call("findPostsByCategory", json!({"category": "nodejs"}));
        let (bridge, _output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let err = bridge.submit("posts sobre nodejs").await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArguments { .. }));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn model_failure_replaces_placeholder_with_error_text() {
        let transport = ScriptedTransport::new();
        transport.push_response(Ok(json!({"promptFeedback": {"blockReason": "SAFETY"}})));
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let err = bridge.submit("algo proibido").await.unwrap_err();
        match err {
            BridgeError::Ai(err) => assert_eq!(err.code(), AiErrorCode::ResponseError),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(output.writes(), vec!["Buscando...", "Não foi possível obter uma resposta."]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn latest_submission_wins_discards_late_older_response() {
        let transport = ScriptedTransport::new();
        let release_first = transport.push_gated(Ok(text_response("resposta A")));
        let release_second = transport.push_gated(Ok(text_response("resposta B")));
        let (bridge, output) =
            bridge_with(&transport, ConcurrencyPolicy::LatestSubmissionWins).await;

        let (first, second, ()) = tokio::join!(
            bridge.submit("A"),
            async {
                wait_for(|| transport.request_count() == 1).await;
                bridge.submit("B").await
            },
            async {
                wait_for(|| transport.request_count() == 2).await;
                release_second.send(()).unwrap();
                wait_for(|| output.text() == "resposta B").await;
                release_first.send(()).unwrap();
            }
        );

        assert_eq!(first.unwrap(), Outcome::Superseded);
        assert_eq!(second.unwrap(), Outcome::Rendered("resposta B".into()));
        assert_eq!(output.text(), "resposta B");
        assert!(!output.writes().contains(&"resposta A".to_string()));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn last_completion_wins_shows_last_resolved_response() {
        let transport = ScriptedTransport::new();
        let release_first = transport.push_gated(Ok(text_response("resposta A")));
        let release_second = transport.push_gated(Ok(text_response("resposta B")));
        let (bridge, output) = bridge_with(&transport, ConcurrencyPolicy::LastCompletionWins).await;

        let (first, second, ()) = tokio::join!(
            bridge.submit("A"),
            async {
                wait_for(|| transport.request_count() == 1).await;
                bridge.submit("B").await
            },
            async {
                wait_for(|| transport.request_count() == 2).await;
                release_second.send(()).unwrap();
                wait_for(|| output.text() == "resposta B").await;
                release_first.send(()).unwrap();
            }
        );

        assert_eq!(first.unwrap(), Outcome::Rendered("resposta A".into()));
        assert_eq!(second.unwrap(), Outcome::Rendered("resposta B".into()));
        assert_eq!(output.text(), "resposta A");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn superseded_submission_skips_tool_execution() {
        let transport = ScriptedTransport::new();
        let release_first = transport.push_gated(Ok(function_call_response(
            "findPostsByCategory",
            json!({"category": ["nodejs"]}),
        )));
        transport.push_text("resposta B");
        let (bridge, output) =
            bridge_with(&transport, ConcurrencyPolicy::LatestSubmissionWins).await;

        let (first, second, ()) = tokio::join!(
            bridge.submit("A"),
            async {
                wait_for(|| transport.request_count() == 1).await;
                bridge.submit("B").await
            },
            async {
                wait_for(|| output.text() == "resposta B").await;
                release_first.send(()).unwrap();
            }
        );

        assert_eq!(first.unwrap(), Outcome::Superseded);
        assert_eq!(second.unwrap(), Outcome::Rendered("resposta B".into()));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn custom_seed_history_is_validated() {
        let transport = ScriptedTransport::new();
        let (bridge, _output) = bridge_with(&transport, ConcurrencyPolicy::default()).await;

        let err = bridge
            .with_seed_history(vec![Content::model_text("oi")])
            .unwrap_err();
        assert!(matches!(err, BridgeError::Ai(ref err) if err.code() == AiErrorCode::InvalidContent));
    }
}
