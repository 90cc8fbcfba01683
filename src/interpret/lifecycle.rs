/// Interpretation lifecycle owned by one session.
///
/// ```text
/// Idle ──begin──▶ Loading ──resolve(Ok)──▶ Success(text)
///                    │
///                    └──resolve(Err)──▶ Error(message)
/// Success | Error ──begin──▶ Loading
/// ```
///
/// Each `begin` hands out a [`RequestToken`]. Tokens increase monotonically
/// and only the most recent one may resolve the session; resolutions for
/// older tokens are dropped so a slow response cannot overwrite a newer one.
use serde::Serialize;

use super::client::InterpretError;

/// Observable state of the interpretation panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Idle,
    Loading,
    Success(String),
    Error(String),
}

impl Lifecycle {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Interpretation text, if the last call succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(text) => Some(text),
            _ => None,
        }
    }

    /// Error message, if the last call failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Success(_) => write!(f, "success"),
            Self::Error(_) => write!(f, "error"),
        }
    }
}

/// Identifies one trigger of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// What happened to a resolution handed to [`InterpretationSession::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// A newer trigger superseded this token.
    Stale,
}

/// Sole owner of one lifecycle value.
#[derive(Debug, Default)]
pub struct InterpretationSession {
    state: Lifecycle,
    latest: u64,
}

impl InterpretationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Lifecycle {
        &self.state
    }

    /// The token issued by the most recent `begin`, if any.
    pub fn latest_token(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }

    /// Enter `Loading`, discarding any previous text or message.
    pub fn begin(&mut self) -> RequestToken {
        self.latest += 1;
        self.state = Lifecycle::Loading;
        RequestToken(self.latest)
    }

    /// Settle the call identified by `token`.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        outcome: Result<String, InterpretError>,
    ) -> Resolution {
        if token.0 != self.latest {
            return Resolution::Stale;
        }

        self.state = match outcome {
            Ok(text) => Lifecycle::Success(text),
            Err(err) => Lifecycle::Error(err.to_string()),
        };
        Resolution::Applied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
