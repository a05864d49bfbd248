use std::fmt;
use std::str::FromStr;

use crate::ai::{Backend, RequestOptions};
use crate::app::FirebaseOptions;
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::logger::LogLevel;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-preview-0514";
pub const DEFAULT_PLACEHOLDER: &str = "Buscando...";
pub const DEFAULT_ERROR_TEXT: &str = "Não foi possível obter uma resposta.";

/// How overlapping submissions share the output surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// Only the most recent submission may write; older ones are discarded.
    #[default]
    LatestSubmissionWins,
    /// Every submission writes when it completes, so the last to resolve is shown.
    LastCompletionWins,
}

impl ConcurrencyPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConcurrencyPolicy::LatestSubmissionWins => "latest-submission",
            ConcurrencyPolicy::LastCompletionWins => "last-completion",
        }
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcurrencyPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest-submission" | "latest" => Ok(ConcurrencyPolicy::LatestSubmissionWins),
            "last-completion" | "last" => Ok(ConcurrencyPolicy::LastCompletionWins),
            other => Err(BridgeError::Config {
                message: format!("unknown concurrency policy '{other}'"),
            }),
        }
    }
}

/// Behavior of a [`ChatBridge`](crate::bridge::ChatBridge).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeSettings {
    pub model: String,
    pub backend: Backend,
    /// Shown while a submission is in flight.
    pub placeholder: String,
    /// Shown when a current submission fails; `None` leaves the placeholder.
    pub error_text: Option<String>,
    pub policy: ConcurrencyPolicy,
    pub request_options: Option<RequestOptions>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            backend: Backend::vertex_ai(""),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            error_text: Some(DEFAULT_ERROR_TEXT.to_string()),
            policy: ConcurrencyPolicy::default(),
            request_options: None,
        }
    }
}

/// Everything the `chat-bridge` binary reads from its environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    pub firebase: FirebaseOptions,
    pub settings: BridgeSettings,
    pub log_level: Option<LogLevel>,
}

impl BridgeConfig {
    pub fn from_env() -> BridgeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    ///
    /// `FIREBASE_CONFIG` holds the camelCase Firebase config object; the
    /// `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID` and `FIREBASE_APP_ID`
    /// variables override its fields. `CHAT_BRIDGE_*` variables tune the bridge.
    pub fn from_lookup<F>(lookup: F) -> BridgeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut firebase = match var("FIREBASE_CONFIG") {
            Some(raw) => FirebaseOptions::from_json_str(&raw)?,
            None => FirebaseOptions::default(),
        };
        if let Some(api_key) = var("FIREBASE_API_KEY") {
            firebase.api_key = Some(api_key);
        }
        if let Some(project_id) = var("FIREBASE_PROJECT_ID") {
            firebase.project_id = Some(project_id);
        }
        if let Some(app_id) = var("FIREBASE_APP_ID") {
            firebase.app_id = Some(app_id);
        }
        if !firebase.is_defined() {
            return Err(BridgeError::Config {
                message: "set FIREBASE_CONFIG or FIREBASE_API_KEY / FIREBASE_PROJECT_ID / FIREBASE_APP_ID"
                    .to_string(),
            });
        }

        let mut settings = BridgeSettings::default();
        if let Some(model) = var("CHAT_BRIDGE_MODEL") {
            settings.model = model;
        }
        let location = var("CHAT_BRIDGE_LOCATION").unwrap_or_default();
        settings.backend = match var("CHAT_BRIDGE_BACKEND").as_deref() {
            None | Some("vertexai") | Some("vertex") => Backend::vertex_ai(location),
            Some("googleai") | Some("google") => Backend::google_ai(),
            Some(other) => {
                return Err(BridgeError::Config {
                    message: format!("unknown backend '{other}'"),
                })
            }
        };
        if let Some(policy) = var("CHAT_BRIDGE_POLICY") {
            settings.policy = policy.parse()?;
        }
        if let Some(base_url) = var("CHAT_BRIDGE_BASE_URL") {
            settings.request_options = Some(RequestOptions {
                timeout: None,
                base_url: Some(base_url),
            });
        }

        let log_level = var("CHAT_BRIDGE_LOG_LEVEL")
            .map(|level| level.parse::<LogLevel>())
            .transpose()
            .map_err(|err| BridgeError::Config {
                message: err.to_string(),
            })?;

        Ok(Self {
            firebase,
            settings,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_vertex_in_us_central1() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.model, "gemini-1.5-flash-preview-0514");
        assert_eq!(settings.backend.location(), Some("us-central1"));
        assert_eq!(settings.placeholder, "Buscando...");
        assert_eq!(settings.policy, ConcurrencyPolicy::LatestSubmissionWins);
    }

    #[test]
    fn firebase_config_json_is_merged_with_overrides() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (
                "FIREBASE_CONFIG",
                r#"{"apiKey":"json-key","projectId":"demo","appId":"1:2:web:3"}"#,
            ),
            ("FIREBASE_API_KEY", "env-key"),
            ("CHAT_BRIDGE_LOCATION", "europe-west4"),
            ("CHAT_BRIDGE_POLICY", "last-completion"),
            ("CHAT_BRIDGE_BASE_URL", "http://localhost:9000"),
            ("CHAT_BRIDGE_LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.firebase.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.firebase.project_id.as_deref(), Some("demo"));
        assert_eq!(config.settings.backend, Backend::vertex_ai("europe-west4"));
        assert_eq!(config.settings.policy, ConcurrencyPolicy::LastCompletionWins);
        assert_eq!(
            config.settings.request_options.unwrap().base_url.as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(config.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn missing_or_invalid_values_are_config_errors() {
        assert!(matches!(
            BridgeConfig::from_lookup(lookup(&[])),
            Err(BridgeError::Config { .. })
        ));
        assert!(matches!(
            BridgeConfig::from_lookup(lookup(&[("FIREBASE_CONFIG", "{not json")])),
            Err(BridgeError::App(_))
        ));
        assert!(matches!(
            BridgeConfig::from_lookup(lookup(&[
                ("FIREBASE_API_KEY", "k"),
                ("CHAT_BRIDGE_POLICY", "random")
            ])),
            Err(BridgeError::Config { .. })
        ));
        let google = BridgeConfig::from_lookup(lookup(&[
            ("FIREBASE_API_KEY", "k"),
            ("CHAT_BRIDGE_BACKEND", "googleai"),
        ]))
        .unwrap();
        assert_eq!(google.settings.backend, Backend::GoogleAi);
    }
}
