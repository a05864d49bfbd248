use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::ai::backend::{Backend, BackendType};
use crate::ai::error::{internal_error, AiError, AiErrorCode, AiResult, CustomErrorData};
use crate::ai::helpers::encode_instance_identifier;
use crate::ai::logger::LOGGER;
use crate::ai::models::generative_model::{GenerativeModel, ModelParams};
use crate::ai::public_types::AiOptions;
use crate::ai::requests::{ApiSettings, PreparedRequest, RequestFactory, RequestOptions};
use crate::ai::types::{GenerateContentRequest, GenerateContentResponse};
use crate::app::{self, FirebaseApp, FirebaseOptions};

/// Executes prepared requests and returns the decoded JSON body.
///
/// The default implementation is [`ReqwestTransport`]; tests and embedders can
/// install their own through [`AiService::set_transport`].
#[async_trait]
pub trait AiHttpTransport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> AiResult<Value>;
}

/// [`AiHttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AiHttpTransport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> AiResult<Value> {
        let builder = request
            .into_reqwest(&self.client)
            .map_err(|err| internal_error(format!("failed to encode AI request: {err}")))?;

        let response = builder.send().await.map_err(|err| {
            AiError::new(
                AiErrorCode::FetchError,
                format!("failed to send AI request: {err}"),
                None,
            )
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| {
            AiError::new(
                AiErrorCode::FetchError,
                format!("failed to read AI response body: {err}"),
                None,
            )
        })?;

        let parsed = serde_json::from_slice::<Value>(&bytes);

        if !status.is_success() {
            let mut data = CustomErrorData::default().with_status(status.as_u16());
            if let Some(reason) = status.canonical_reason() {
                data = data.with_status_text(reason);
            }

            return Err(match parsed {
                Ok(json) => {
                    let message = extract_error_message(&json)
                        .unwrap_or_else(|| format!("AI endpoint returned HTTP {status}"));
                    AiError::new(AiErrorCode::FetchError, message, Some(data.with_response(json)))
                }
                Err(_) => {
                    let raw = String::from_utf8_lossy(&bytes).to_string();
                    AiError::new(
                        AiErrorCode::FetchError,
                        format!("AI endpoint returned HTTP {status}"),
                        Some(data.with_response(json!({ "raw": raw }))),
                    )
                }
            });
        }

        parsed.map_err(|err| {
            AiError::new(
                AiErrorCode::ParseFailed,
                format!("failed to parse AI response JSON: {err}"),
                None,
            )
        })
    }
}

fn extract_error_message(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(|error| error.get("message"))
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Entry point to Firebase AI for one app and one backend.
#[derive(Clone)]
pub struct AiService {
    inner: Arc<AiInner>,
}

struct AiInner {
    app: FirebaseApp,
    backend: Backend,
    transport: Mutex<Arc<dyn AiHttpTransport>>,
}

impl fmt::Debug for AiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiService")
            .field("app", &self.inner.app.name())
            .field("backend", &self.inner.backend)
            .finish()
    }
}

impl AiService {
    fn new(app: FirebaseApp, backend: Backend) -> Self {
        Self {
            inner: Arc::new(AiInner {
                app,
                backend,
                transport: Mutex::new(Arc::new(ReqwestTransport::default())),
            }),
        }
    }

    pub fn app(&self) -> &FirebaseApp {
        &self.inner.app
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    pub fn backend_type(&self) -> BackendType {
        self.inner.backend.backend_type()
    }

    /// Vertex AI region, when using that backend.
    pub fn location(&self) -> Option<&str> {
        self.inner.backend.location()
    }

    /// Replaces the HTTP transport used by every model created from this service.
    pub fn set_transport(&self, transport: Arc<dyn AiHttpTransport>) {
        *self
            .inner
            .transport
            .lock()
            .unwrap_or_else(|poison| poison.into_inner()) = transport;
    }

    fn transport(&self) -> Arc<dyn AiHttpTransport> {
        self.inner
            .transport
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub(crate) fn api_settings(&self) -> AiResult<ApiSettings> {
        let FirebaseOptions {
            api_key,
            project_id,
            app_id,
            ..
        } = self.inner.app.options();

        let api_key = api_key.ok_or_else(|| {
            AiError::new(
                AiErrorCode::NoApiKey,
                "Firebase options must include `api_key` to use Firebase AI endpoints",
                None,
            )
        })?;
        let project = project_id.ok_or_else(|| {
            AiError::new(
                AiErrorCode::NoProjectId,
                "Firebase options must include `project_id` to use Firebase AI endpoints",
                None,
            )
        })?;
        let app_id = app_id.ok_or_else(|| {
            AiError::new(
                AiErrorCode::NoAppId,
                "Firebase options must include `app_id` to use Firebase AI endpoints",
                None,
            )
        })?;

        Ok(ApiSettings {
            api_key,
            project,
            app_id,
            backend: self.inner.backend.clone(),
            automatic_data_collection_enabled: self.inner.app.automatic_data_collection_enabled(),
        })
    }

    /// Builds the REST request for a `generateContent` call without executing it.
    pub fn prepare_generate_content_request(
        &self,
        model: &str,
        body: Value,
        request_options: Option<RequestOptions>,
    ) -> AiResult<PreparedRequest> {
        RequestFactory::new(self.api_settings()?).generate_content_request(
            model,
            body,
            request_options,
        )
    }

    /// Sends `request` to `model` and decodes the response.
    pub(crate) async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        request_options: Option<RequestOptions>,
    ) -> AiResult<GenerateContentResponse> {
        self.inner.app.check_destroyed().map_err(app_error)?;
        let body = serde_json::to_value(request)
            .map_err(|err| internal_error(format!("failed to encode AI request body: {err}")))?;
        let prepared = self.prepare_generate_content_request(model, body, request_options)?;
        LOGGER.debug(format!(
            "generateContent -> {} ({} turns)",
            prepared.url,
            request.contents.len()
        ));

        let raw = self.transport().send(prepared).await?;
        serde_json::from_value::<GenerateContentResponse>(raw.clone()).map_err(|err| {
            AiError::new(
                AiErrorCode::ParseFailed,
                format!("unexpected generateContent response shape: {err}"),
                Some(CustomErrorData::default().with_response(raw)),
            )
        })
    }
}

fn app_error(err: app::AppError) -> AiError {
    AiError::new(AiErrorCode::Error, err.to_string(), None)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    app_name: String,
    identifier: String,
}

static AI_SERVICES: LazyLock<Mutex<HashMap<CacheKey, Arc<AiService>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Forgets every cached service built for `app`.
pub(crate) fn drop_services_for_app(app: &FirebaseApp) {
    let mut services = AI_SERVICES
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    let before = services.len();
    services.retain(|_, service| !service.app().ptr_eq(app));
    let dropped = before - services.len();
    if dropped > 0 {
        LOGGER.debug(format!(
            "Dropped {dropped} AI service(s) for app '{}'",
            app.name()
        ));
    }
}

/// Returns the AI service for `app` (or the default app) and the requested backend.
///
/// Services are cached per app name and backend identifier, so asking twice
/// for the same combination yields the same instance.
///
/// # Examples
///
/// ```
/// # use firebase_ai_chat_bridge::ai::{get_ai, AiOptions, Backend};
/// # use firebase_ai_chat_bridge::app::{initialize_app, FirebaseAppSettings, FirebaseOptions};
/// # async fn example() {
/// let options = FirebaseOptions {
///     project_id: Some("project".into()),
///     api_key: Some("test".into()),
///     ..Default::default()
/// };
/// let app = initialize_app(options, Some(FirebaseAppSettings::default())).await.unwrap();
/// let ai = get_ai(
///     Some(app),
///     Some(AiOptions {
///         backend: Some(Backend::vertex_ai("us-central1")),
///     }),
/// )
/// .await
/// .unwrap();
/// # }
/// ```
pub async fn get_ai(
    app: Option<FirebaseApp>,
    options: Option<AiOptions>,
) -> AiResult<Arc<AiService>> {
    let app = match app {
        Some(app) => app,
        None => app::get_app(None).await.map_err(app_error)?,
    };
    app.check_destroyed().map_err(app_error)?;

    let backend = options.unwrap_or_default().backend_or_default();
    let key = CacheKey {
        app_name: app.name().to_string(),
        identifier: encode_instance_identifier(&backend),
    };

    let mut services = AI_SERVICES
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    if let Some(service) = services.get(&key) {
        if service.app().ptr_eq(&app) {
            return Ok(service.clone());
        }
    }

    LOGGER.debug(format!(
        "Creating AI service {} for app '{}'",
        key.identifier, key.app_name
    ));
    let service = Arc::new(AiService::new(app, backend));
    services.insert(key, service.clone());
    Ok(service)
}

/// Shorthand for [`get_ai`] with the Vertex AI backend in `location`.
pub async fn get_vertex_ai(
    app: Option<FirebaseApp>,
    location: impl Into<String>,
) -> AiResult<Arc<AiService>> {
    get_ai(
        app,
        Some(AiOptions {
            backend: Some(Backend::vertex_ai(location)),
        }),
    )
    .await
}

/// Creates a [`GenerativeModel`] bound to `ai`.
pub fn get_generative_model(
    ai: Arc<AiService>,
    params: ModelParams,
    request_options: Option<RequestOptions>,
) -> AiResult<GenerativeModel> {
    GenerativeModel::new(ai, params, request_options)
}
