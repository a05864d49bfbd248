use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::ai::backend::Backend;
use crate::ai::constants::{
    DEFAULT_API_VERSION, DEFAULT_DOMAIN, DEFAULT_FETCH_TIMEOUT_MS, LANGUAGE_TAG, PACKAGE_VERSION,
};
use crate::ai::error::{invalid_argument, AiResult};

const GENERATE_CONTENT_OPERATION: &str = "generateContent";

/// App-derived settings needed to address and authorize REST requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ApiSettings {
    pub api_key: String,
    pub project: String,
    pub app_id: String,
    pub backend: Backend,
    pub automatic_data_collection_enabled: bool,
}

/// Per-request overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Request timeout. Defaults to 180 seconds when omitted.
    pub timeout: Option<Duration>,
    /// Base URL replacing the default Firebase AI endpoint (emulators, proxies, tests).
    pub base_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

/// Fully addressed HTTP request, ready for an [`AiHttpTransport`](crate::ai::AiHttpTransport).
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub timeout: Duration,
}

impl PreparedRequest {
    /// Returns the value of a header (case-insensitive lookup).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn into_reqwest(self, client: &reqwest::Client) -> AiResult<reqwest::RequestBuilder> {
        use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| invalid_argument(format!("Invalid header name '{name}': {err}")))?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                invalid_argument(format!("Invalid header value for '{name}': {err}"))
            })?;
            headers.insert(header_name, header_value);
        }

        let builder = match self.method {
            HttpMethod::Post => client.post(self.url),
        }
        .headers(headers)
        .timeout(self.timeout)
        .body(self.body.to_string());
        Ok(builder)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RequestFactory {
    settings: ApiSettings,
}

impl RequestFactory {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }

    /// Builds a `generateContent` request for `model` (already normalized).
    pub fn generate_content_request(
        &self,
        model: &str,
        body: Value,
        request_options: Option<RequestOptions>,
    ) -> AiResult<PreparedRequest> {
        let options = request_options.unwrap_or_default();
        let mut url = compose_base_url(&options)?;
        let trimmed_model = model.trim_start_matches('/');
        let model_path = match &self.settings.backend {
            Backend::GoogleAi => format!("projects/{}/{trimmed_model}", self.settings.project),
            Backend::VertexAi { location } => format!(
                "projects/{}/locations/{location}/{trimmed_model}",
                self.settings.project
            ),
        };
        url.set_path(&format!(
            "/{DEFAULT_API_VERSION}/{model_path}:{GENERATE_CONTENT_OPERATION}"
        ));
        url.set_query(None);

        let timeout = options
            .timeout
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS));

        Ok(PreparedRequest {
            method: HttpMethod::Post,
            url,
            headers: self.build_headers(),
            body,
            timeout,
        })
    }

    fn build_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(4);
        headers.push(("Content-Type".into(), "application/json".into()));
        headers.push((
            "x-goog-api-client".into(),
            format!("{LANGUAGE_TAG}/{PACKAGE_VERSION} fire/{PACKAGE_VERSION}"),
        ));
        headers.push(("x-goog-api-key".into(), self.settings.api_key.clone()));
        if self.settings.automatic_data_collection_enabled && !self.settings.app_id.is_empty() {
            headers.push(("X-Firebase-AppId".into(), self.settings.app_id.clone()));
        }
        headers
    }
}

fn compose_base_url(options: &RequestOptions) -> AiResult<Url> {
    let base = options.base_url.as_deref().unwrap_or(DEFAULT_DOMAIN);
    let url = if base.starts_with("http://") || base.starts_with("https://") {
        base.to_string()
    } else {
        format!("https://{base}")
    };
    Url::parse(&url).map_err(|err| invalid_argument(format!("Invalid base URL '{url}': {err}")))
}
