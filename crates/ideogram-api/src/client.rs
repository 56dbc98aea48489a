use std::fmt;

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn, Dispatch};

use crate::config::{non_empty_env, ClientConfig};

const API_KEY_HEADER: &str = "api-key";

/// Outcome of [`IdeogramClient::validate_api_key`].
///
/// Validation is fail-open: only an explicit 401 marks the key unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Valid,
    Invalid,
    Inconclusive { reachable: bool },
}

impl KeyStatus {
    pub fn is_usable(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Valid => "API key is valid",
            Self::Invalid => "Invalid API key",
            Self::Inconclusive { reachable: true } => "API key validation inconclusive",
            Self::Inconclusive { reachable: false } => {
                "Could not validate API key (will try anyway)"
            }
        }
    }

    pub fn into_parts(self) -> (bool, String) {
        (self.is_usable(), self.message().to_string())
    }
}

/// Response of a single GET before it is collapsed into a sentinel.
enum Fetched {
    Json(Value),
    Status(StatusCode),
}

/// Blocking client for the Ideogram REST API.
///
/// Every request carries the `Api-Key` and `User-Agent` headers and the
/// configured timeout. Lookups never return errors: failures are logged
/// and reported as `None`. Events go to the caller's current dispatcher
/// unless one was injected with [`IdeogramClient::with_dispatch`].
#[derive(Clone)]
pub struct IdeogramClient {
    api_key: String,
    config: ClientConfig,
    http: HttpClient,
    dispatch: Option<Dispatch>,
}

impl IdeogramClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, ClientConfig::default())
    }

    /// Credential from `IDEOGRAM_API_KEY`, base URL from `IDEOGRAM_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let Some(api_key) = non_empty_env("IDEOGRAM_API_KEY") else {
            anyhow::bail!("IDEOGRAM_API_KEY not set");
        };
        Self::with_config(api_key, ClientConfig::from_env())
    }

    pub fn with_config(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let api_key = api_key.into();
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(&api_key).context("API key is not a valid header value")?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .context("user agent is not a valid header value")?,
        );
        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("failed to build Ideogram HTTP client")?;
        Ok(Self {
            api_key,
            config,
            http,
            dispatch: None,
        })
    }

    /// Routes this client's log events to `dispatch` instead of whatever
    /// dispatcher is current at call time.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Remaining account credits, when the endpoint exists.
    pub fn check_quota(&self) -> Option<Value> {
        self.logged(|| match self.get_json("v1/account/quota") {
            Ok(Fetched::Json(payload)) => Some(payload),
            Ok(Fetched::Status(StatusCode::NOT_FOUND)) => {
                info!("Quota endpoint not available");
                None
            }
            Ok(Fetched::Status(status)) => {
                warn!(status = status.as_u16(), "Quota check returned status {status}");
                None
            }
            Err(err) => {
                warn!("Failed to check quota: {err:#}");
                None
            }
        })
    }

    pub fn get_generation_status(&self, generation_id: &str) -> Option<Value> {
        self.logged(|| {
            match self.get_json(&format!("v1/generations/{generation_id}")) {
                Ok(Fetched::Json(payload)) => Some(payload),
                Ok(Fetched::Status(status)) => {
                    warn!(
                        generation_id,
                        status = status.as_u16(),
                        "Status check returned {status}"
                    );
                    None
                }
                Err(err) => {
                    warn!(generation_id, "Failed to get generation status: {err:#}");
                    None
                }
            }
        })
    }

    /// Probes quota first, then the model listing. Anything short of an
    /// explicit 401 leaves the key usable.
    pub fn validate_api_key(&self) -> KeyStatus {
        if self.check_quota().as_ref().is_some_and(is_truthy) {
            return KeyStatus::Valid;
        }
        self.logged(|| match self.get_status("v1/models") {
            Ok(StatusCode::OK) => KeyStatus::Valid,
            Ok(StatusCode::UNAUTHORIZED) => KeyStatus::Invalid,
            Ok(status) => {
                debug!(status = status.as_u16(), "model listing probe inconclusive");
                KeyStatus::Inconclusive { reachable: true }
            }
            Err(err) => {
                warn!("API key validation error: {err:#}");
                KeyStatus::Inconclusive { reachable: false }
            }
        })
    }

    fn get_json(&self, path: &str) -> Result<Fetched> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("Ideogram request failed ({url})"))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Ok(Fetched::Status(status));
        }
        let payload = response
            .json::<Value>()
            .with_context(|| format!("Ideogram returned invalid JSON payload ({url})"))?;
        Ok(Fetched::Json(payload))
    }

    fn get_status(&self, path: &str) -> Result<StatusCode> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("Ideogram request failed ({url})"))?;
        Ok(response.status())
    }

    fn logged<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl fmt::Debug for IdeogramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdeogramClient")
            .field("api_key", &"<redacted>")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Mirrors the truthiness the quota probe relies on: empty payloads do not
/// count as proof of a valid key.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(rows) => !rows.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use mockito::Matcher;
    use serde_json::json;
    use tracing::Dispatch;

    use super::{is_truthy, IdeogramClient, KeyStatus};
    use crate::config::ClientConfig;

    fn client_for(server: &mockito::Server) -> anyhow::Result<IdeogramClient> {
        IdeogramClient::with_config(
            "test-key",
            ClientConfig::new()
                .with_api_base(server.url())
                .with_timeout(Duration::from_secs(2)),
        )
    }

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("capture lock poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn quota_returns_payload_and_sends_auth_headers() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/v1/account/quota")
            .match_header("api-key", "test-key")
            .match_header(
                "user-agent",
                Matcher::Regex(r"^ideogram-character/".to_string()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"credits_remaining": 12.5}"#)
            .create();

        let quota = client_for(&server)?.check_quota();
        mock.assert();
        assert_eq!(quota, Some(json!({"credits_remaining": 12.5})));
        Ok(())
    }

    #[test]
    fn quota_not_found_is_a_sentinel() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(404)
            .create();
        assert_eq!(client_for(&server)?.check_quota(), None);
        Ok(())
    }

    #[test]
    fn quota_invalid_json_is_a_sentinel() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(200)
            .with_body("not json")
            .create();
        assert_eq!(client_for(&server)?.check_quota(), None);
        Ok(())
    }

    #[test]
    fn generation_status_passes_payload_through() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        let body = json!({"status": "completed", "data": [{"url": "https://img/1.png"}]});
        server
            .mock("GET", "/v1/generations/gen-123")
            .match_header("api-key", "test-key")
            .with_status(200)
            .with_body(body.to_string())
            .create();
        let client = client_for(&server)?;
        assert_eq!(client.get_generation_status("gen-123"), Some(body));
        Ok(())
    }

    #[test]
    fn generation_status_non_200_is_a_sentinel() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/generations/missing")
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .create();
        assert_eq!(client_for(&server)?.get_generation_status("missing"), None);
        Ok(())
    }

    #[test]
    fn validation_accepts_key_when_quota_has_data() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(200)
            .with_body(r#"{"credits": 3}"#)
            .create();
        let models = server.mock("GET", "/v1/models").expect(0).create();

        let status = client_for(&server)?.validate_api_key();
        models.assert();
        assert_eq!(status, KeyStatus::Valid);
        assert_eq!(status.into_parts(), (true, "API key is valid".to_string()));
        Ok(())
    }

    #[test]
    fn validation_falls_through_on_empty_quota() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(200)
            .with_body("{}")
            .create();
        let models = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body("[]")
            .create();

        assert_eq!(client_for(&server)?.validate_api_key(), KeyStatus::Valid);
        models.assert();
        Ok(())
    }

    #[test]
    fn validation_rejects_on_unauthorized_models_probe() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(404)
            .create();
        server.mock("GET", "/v1/models").with_status(401).create();

        let status = client_for(&server)?.validate_api_key();
        assert_eq!(status, KeyStatus::Invalid);
        assert_eq!(status.into_parts(), (false, "Invalid API key".to_string()));
        Ok(())
    }

    #[test]
    fn validation_is_fail_open_on_other_statuses() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(404)
            .create();
        server.mock("GET", "/v1/models").with_status(503).create();

        let status = client_for(&server)?.validate_api_key();
        assert!(status.is_usable());
        assert_eq!(status.message(), "API key validation inconclusive");
        Ok(())
    }

    #[test]
    fn validation_is_fail_open_when_unreachable() -> anyhow::Result<()> {
        let client = IdeogramClient::with_config(
            "test-key",
            ClientConfig::new()
                .with_api_base("http://127.0.0.1:1")
                .with_timeout(Duration::from_millis(500)),
        )?;
        let status = client.validate_api_key();
        assert_eq!(status, KeyStatus::Inconclusive { reachable: false });
        assert_eq!(
            status.into_parts(),
            (true, "Could not validate API key (will try anyway)".to_string())
        );
        Ok(())
    }

    #[test]
    fn warnings_go_to_injected_dispatcher() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(403)
            .create();

        let writer = CaptureWriter::default();
        let sink = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let client = client_for(&server)?.with_dispatch(Dispatch::new(subscriber));

        assert_eq!(client.check_quota(), None);
        let logs = writer.contents();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Quota check returned status 403"));
        Ok(())
    }

    #[test]
    fn subscriber_installed_after_construction_receives_warnings() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/account/quota")
            .with_status(403)
            .create();
        let client = client_for(&server)?;

        let writer = CaptureWriter::default();
        let sink = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let quota = tracing::subscriber::with_default(subscriber, || client.check_quota());

        assert_eq!(quota, None);
        assert!(writer
            .contents()
            .contains("Quota check returned status 403"));
        Ok(())
    }

    #[test]
    fn api_key_with_control_characters_is_rejected() {
        assert!(IdeogramClient::new("bad\nkey").is_err());
    }

    #[test]
    fn debug_output_hides_the_credential() -> anyhow::Result<()> {
        let client = IdeogramClient::new("super-secret")?;
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
        Ok(())
    }

    #[test]
    fn truthiness_matches_quota_expectations() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!({"credits": 0})));
        assert!(is_truthy(&json!(1.5)));
    }
}
