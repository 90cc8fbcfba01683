/// HTTP client for the remote interpretation endpoint.
///
/// Uses the synchronous `ureq` client: one `POST` with the JSON-encoded
/// [`InterpretationRequest`], one JSON response carrying `answer`. There are
/// no automatic retries; a retry is a new user-triggered call.
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::Interpreter;
use crate::config::schema::InterpreterConfig;
use crate::shaper::InterpretationRequest;

/// Text shown when the service answers without an interpretation.
pub const NO_INTERPRETATION: &str = "No interpretation returned.";

/// Timeout for [`InterpretClient::is_reachable`].
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single interpretation call.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("could not decode interpretation response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Response type
// ---------------------------------------------------------------------------

/// Response body of `POST /interpret_agent`.
#[derive(Debug, Deserialize)]
struct InterpretResponse {
    #[serde(default)]
    answer: Option<String>,
}

impl InterpretResponse {
    fn into_text(self) -> String {
        self.answer
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| NO_INTERPRETATION.to_string())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client for the agent service's interpretation route.
#[derive(Debug, Clone)]
pub struct InterpretClient {
    base_url: String,
    endpoint: String,
    timeout: Duration,
}

impl InterpretClient {
    pub fn new(base_url: &str, endpoint: &str, timeout: Duration) -> Self {
        let endpoint = endpoint.trim_start_matches('/');
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: format!("/{endpoint}"),
            timeout,
        }
    }

    pub fn from_config(config: &InterpreterConfig) -> Self {
        Self::new(
            &config.url,
            &config.endpoint,
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Full URL of the interpretation route.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Whether anything answers HTTP at the base URL.
    ///
    /// Any status code counts as reachable; only transport failures do not.
    pub fn is_reachable(&self) -> bool {
        match ureq::get(&self.base_url).timeout(PROBE_TIMEOUT).call() {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        }
    }

    /// Send `request` and return the interpretation text.
    pub fn interpret(&self, request: &InterpretationRequest) -> Result<String, InterpretError> {
        let response = match ureq::post(&self.url())
            .timeout(self.timeout)
            .send_json(request)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(InterpretError::Api { status, body });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(InterpretError::Network(transport.to_string()));
            }
        };

        let body = response
            .into_string()
            .map_err(|e| InterpretError::Network(e.to_string()))?;
        parse_answer(&body)
    }
}

impl Interpreter for InterpretClient {
    fn interpret(&self, request: &InterpretationRequest) -> Result<String, InterpretError> {
        InterpretClient::interpret(self, request)
    }
}

/// Decode a success body into the text to display.
fn parse_answer(body: &str) -> Result<String, InterpretError> {
    serde_json::from_str::<InterpretResponse>(body)
        .map(InterpretResponse::into_text)
        .map_err(|e| InterpretError::Decode(format!("{e}; body: {body}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
