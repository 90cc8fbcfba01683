/// Configuration schema and defaults.
///
/// Sections: `[interpreter]`, `[server]`, `[logging]`. Every field has a
/// built-in default, so a config file only needs the keys it changes.
use serde::{Deserialize, Serialize};

/// Top-level flightlens configuration.
///
/// Maps to `~/.flightlens/config.toml` and `.flightlens.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightlensConfig {
    pub interpreter: InterpreterConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [interpreter]
// ---------------------------------------------------------------------------

/// Remote interpretation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Base URL of the agent service.
    pub url: String,
    /// Path of the interpretation route, appended to `url`.
    pub endpoint: String,
    /// Request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            endpoint: "/interpret_agent".to_string(),
            timeout_ms: 60_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Local JSON API served by `flightlens serve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9757".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Interpretation event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// JSONL file path. A leading `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.flightlens/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl FlightlensConfig {
    /// The commented TOML written by `flightlens config init`.
    pub fn default_toml() -> String {
        r#"# flightlens configuration
#
# Precedence (highest wins):
#   1. Environment variables (FLIGHTLENS_*)
#   2. Project config (.flightlens.toml in current directory)
#   3. User global config (~/.flightlens/config.toml)
#   4. Built-in defaults

[interpreter]
url = "http://127.0.0.1:8000"
endpoint = "/interpret_agent"
timeout_ms = 60000

[server]
addr = "127.0.0.1:9757"

[logging]
enabled = true
path = "~/.flightlens/events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
