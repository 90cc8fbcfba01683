//! JSON API handlers for the local server.
//!
//! Each handler corresponds to an API endpoint and returns a [`Reply`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::events;
use crate::interpret::{InterpretClient, Lifecycle};
use crate::model::AnalyticsResult;
use crate::visualize;

use super::{ApiState, Reply};

// ---------------------------------------------------------------------------
// JSON request/response types
// ---------------------------------------------------------------------------

/// `POST /api/interpret` body.
#[derive(Deserialize)]
struct InterpretBody {
    #[serde(default)]
    result: Option<AnalyticsResult>,
    #[serde(default)]
    query: String,
}

/// Config API response: the effective config as JSON plus the TOML text.
#[derive(Serialize)]
struct ConfigResponse {
    config: config::FlightlensConfig,
    toml_text: String,
}

#[derive(Serialize)]
struct HealthResponse {
    interpreter_url: String,
    interpreter_reachable: bool,
    config_exists: bool,
    logging_enabled: bool,
    log_exists: bool,
    interpretation_state: Lifecycle,
}

fn json_reply<T: Serialize>(data: &T) -> Result<Reply> {
    let body = serde_json::to_value(data).context("failed to serialize JSON response")?;
    Ok(Reply::ok(body))
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `POST /api/visualize`: chart data and summary cards for a result.
pub fn post_visualize(body: &str) -> Result<Reply> {
    let result = AnalyticsResult::from_json(body).context("invalid analytics result")?;
    json_reply(&visualize::visualize(&result))
}

/// `POST /api/interpret`: start one interpretation trigger.
///
/// Replies with `loading` straight away; poll `GET /api/interpretation` for
/// the outcome. Without a `result` the session is left untouched and its
/// current state is returned.
pub fn post_interpret(state: &mut ApiState, body: &str) -> Result<Reply> {
    let req: InterpretBody =
        serde_json::from_str(body).context("invalid JSON in interpret request")?;

    if let Some(result) = &req.result {
        state.start_interpretation(result, &req.query);
    }

    json_reply(state.session.state())
}

/// `GET /api/interpretation`: current lifecycle value.
pub fn get_interpretation(state: &ApiState) -> Result<Reply> {
    json_reply(state.session.state())
}

/// `GET /api/config`: current effective configuration.
pub fn get_config() -> Result<Reply> {
    let cfg = config::load();
    let toml_text = toml::to_string_pretty(&cfg).unwrap_or_default();

    json_reply(&ConfigResponse {
        config: cfg,
        toml_text,
    })
}

/// `GET /api/health`: interpreter reachability and local state.
pub fn get_health(state: &ApiState) -> Result<Reply> {
    let cfg = config::load();
    let client = InterpretClient::from_config(&cfg.interpreter);

    let resp = HealthResponse {
        interpreter_url: client.url(),
        interpreter_reachable: client.is_reachable(),
        config_exists: config::global_config_file().is_some_and(|p| p.exists()),
        logging_enabled: state.logging.enabled,
        log_exists: events::event_log_path(&state.logging).is_some_and(|p| p.exists()),
        interpretation_state: state.session.state().clone(),
    };

    json_reply(&resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::schema::LoggingConfig;
    use crate::interpret::{InterpretError, Interpreter, Resolution};
    use crate::shaper::InterpretationRequest;

    struct Failing;

    impl Interpreter for Failing {
        fn interpret(&self, _request: &InterpretationRequest) -> Result<String, InterpretError> {
            Err(InterpretError::Api {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    fn state() -> ApiState {
        ApiState::new(
            Failing,
            LoggingConfig {
                enabled: false,
                path: String::new(),
            },
        )
    }

    #[test]
    fn visualize_returns_dashboard() {
        let body = r#"{
            "mode": "special_case",
            "function_executed": "conditional_distribution_analysis",
            "multivalue_stats": {"distribution": {"A": 60, "B": 40}},
            "base_stats": {"total_reviews": 12}
        }"#;
        let reply = post_visualize(body).unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["function_executed"], "conditional_distribution_analysis");
        assert_eq!(reply.body["visualization"]["kind"], "distribution");
        assert_eq!(reply.body["visualization"]["series"]["points"][1]["label"], "B");
        assert_eq!(reply.body["summary"][0]["display"], "12");
    }

    #[test]
    fn interpret_error_reaches_lifecycle() {
        let mut state = state();
        let body = r#"{"result": {"mode": "special_case"}, "query": "q"}"#;
        let reply = post_interpret(&mut state, body).unwrap();
        assert_eq!(reply.body["state"], "loading");

        assert_eq!(state.settle_next(Duration::from_secs(5)), Some(Resolution::Applied));
        let reply = get_interpretation(&state).unwrap();
        assert_eq!(reply.body["state"], "error");
        let detail = reply.body["detail"].as_str().unwrap();
        assert!(detail.contains("500"));
        assert!(detail.contains("boom"));
    }

    #[test]
    fn interpret_without_result_leaves_session_idle() {
        let mut state = state();
        let reply = post_interpret(&mut state, r#"{"query": "q"}"#).unwrap();
        assert_eq!(reply.body["state"], "idle");
        assert!(state.session().latest_token().is_none());
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn interpret_body_must_be_json() {
        assert!(post_interpret(&mut state(), "nope").is_err());
    }
}
