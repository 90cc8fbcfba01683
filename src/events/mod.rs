//! Interpretation event log: one JSONL line per resolved trigger.
//!
//! Records the shape of each outgoing request (see
//! [`RequestSummary`](crate::shaper::RequestSummary)) together with the
//! outcome and latency, so `flightlens history` can report on past calls.
//!
//! Log file: `[logging] path`, default `~/.flightlens/events.jsonl`.
//! Writing is best-effort: failures never reach the caller.

pub mod history;

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, schema::LoggingConfig};
use crate::interpret::{Lifecycle, Resolution, Trigger};

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// How a trigger ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
    /// Superseded by a newer trigger before it resolved.
    Stale,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Stale => write!(f, "stale"),
        }
    }
}

/// A single entry in the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretEvent {
    pub timestamp: String,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_executed: Option<String>,
    pub request_token: u64,
    pub has_reintr_query: bool,
    pub has_base_stats: bool,
    pub has_special_stats: bool,
    pub has_description: bool,
    pub top_reviews_count: usize,
    pub outcome: Outcome,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InterpretEvent {
    /// Describe `trigger`, reading the outcome from the session state it left.
    pub fn from_trigger(trigger: &Trigger, state: &Lifecycle, function: Option<&str>) -> Self {
        let (outcome, error) = match (trigger.resolution, state) {
            (Resolution::Stale, _) => (Outcome::Stale, None),
            (Resolution::Applied, Lifecycle::Error(message)) => {
                (Outcome::Error, Some(message.clone()))
            }
            (Resolution::Applied, _) => (Outcome::Success, None),
        };

        let summary = &trigger.summary;
        Self {
            timestamp: Utc::now().to_rfc3339(),
            mode: summary.mode.to_string(),
            function_executed: function.map(str::to_string),
            request_token: trigger.token.id(),
            has_reintr_query: summary.has_reintr_query,
            has_base_stats: summary.has_base_stats,
            has_special_stats: summary.has_special_stats,
            has_description: summary.has_description,
            top_reviews_count: summary.top_reviews_count,
            outcome,
            latency_ms: trigger.latency_ms,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append `event` to the configured log. Best-effort.
pub fn log_event(logging: &LoggingConfig, event: &InterpretEvent) {
    if !logging.enabled {
        return;
    }
    let _ = append_event(logging, event);
}

fn append_event(logging: &LoggingConfig, event: &InterpretEvent) -> Result<()> {
    let Some(path) = event_log_path(logging) else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(event)?)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read every event, skipping malformed lines. Empty if the log is missing.
pub fn read_all_events(logging: &LoggingConfig) -> Vec<InterpretEvent> {
    let Some(path) = event_log_path(logging) else {
        return Vec::new();
    };
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str::<InterpretEvent>(&line).ok())
        .collect()
}

/// Events from the last `days` days, or all of them.
pub fn read_events_since_days(logging: &LoggingConfig, days: Option<u32>) -> Vec<InterpretEvent> {
    let events = read_all_events(logging);
    let Some(days) = days else {
        return events;
    };

    let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
    events.into_iter().filter(|e| e.timestamp >= cutoff).collect()
}

/// Resolved path of the event log.
pub fn event_log_path(logging: &LoggingConfig) -> Option<PathBuf> {
    config::expand_home(&logging.path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
