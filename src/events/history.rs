//! History report: aggregates the interpretation event log.
//!
//! Provides the numbers behind `flightlens history`: outcome counts,
//! average latency of successful calls, and a per-function breakdown.

use std::collections::HashMap;

use serde::Serialize;

use super::{InterpretEvent, Outcome, read_events_since_days};
use crate::config::schema::LoggingConfig;

/// Aggregate view over a set of events.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct History {
    pub total: usize,
    pub successes: usize,
    pub errors: usize,
    pub stale: usize,
    /// Mean latency of successful calls, in milliseconds.
    pub avg_success_latency_ms: Option<u64>,
    /// Sorted by call count, most frequent first.
    pub functions: Vec<FunctionStat>,
    /// The most recent error message, if any.
    pub last_error: Option<String>,
}

impl History {
    /// Percentage of applied calls that succeeded; 0.0 when none were applied.
    pub fn success_rate(&self) -> f64 {
        let applied = self.successes + self.errors;
        if applied == 0 {
            0.0
        } else {
            (self.successes as f64 / applied as f64) * 100.0
        }
    }
}

/// Per-`function_executed` counts. Base-case calls are grouped under
/// `"(base case)"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionStat {
    pub function: String,
    pub calls: usize,
    pub errors: usize,
}

const BASE_CASE_LABEL: &str = "(base case)";

/// Aggregate the configured event log, optionally limited to the last `days`.
pub fn compute_history(logging: &LoggingConfig, days: Option<u32>) -> History {
    build_history(&read_events_since_days(logging, days))
}

pub fn build_history(events: &[InterpretEvent]) -> History {
    let mut history = History {
        total: events.len(),
        ..History::default()
    };
    let mut by_function: HashMap<&str, FunctionStat> = HashMap::new();
    let mut success_latency_total = 0u64;

    for event in events {
        match event.outcome {
            Outcome::Success => {
                history.successes += 1;
                success_latency_total += event.latency_ms;
            }
            Outcome::Error => {
                history.errors += 1;
                if event.error.is_some() {
                    history.last_error = event.error.clone();
                }
            }
            Outcome::Stale => history.stale += 1,
        }

        let function = event.function_executed.as_deref().unwrap_or(BASE_CASE_LABEL);
        let stat = by_function.entry(function).or_insert_with(|| FunctionStat {
            function: function.to_string(),
            calls: 0,
            errors: 0,
        });
        stat.calls += 1;
        if event.outcome == Outcome::Error {
            stat.errors += 1;
        }
    }

    if history.successes > 0 {
        history.avg_success_latency_ms = Some(success_latency_total / history.successes as u64);
    }

    history.functions = by_function.into_values().collect();
    history
        .functions
        .sort_by(|a, b| b.calls.cmp(&a.calls).then_with(|| a.function.cmp(&b.function)));
    history
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event(function: Option<&str>, outcome: Outcome, latency_ms: u64) -> InterpretEvent {
        InterpretEvent {
            timestamp: "2026-10-01T12:00:00+00:00".to_string(),
            mode: if function.is_some() { "special_case" } else { "base_case" }.to_string(),
            function_executed: function.map(str::to_string),
            request_token: 1,
            has_reintr_query: true,
            has_base_stats: true,
            has_special_stats: function.is_some(),
            has_description: false,
            top_reviews_count: 5,
            outcome,
            latency_ms,
            error: (outcome == Outcome::Error).then(|| "API error: 500 - boom".to_string()),
        }
    }

    #[test]
    fn empty_log_is_empty_history() {
        assert_eq!(build_history(&[]), History::default());
    }

    #[test]
    fn counts_outcomes_and_latency() {
        let events = vec![
            event(None, Outcome::Success, 1000),
            event(Some("conditional_distribution_analysis"), Outcome::Success, 3000),
            event(Some("conditional_distribution_analysis"), Outcome::Error, 50),
            event(None, Outcome::Stale, 9000),
        ];
        let history = build_history(&events);

        assert_eq!(history.total, 4);
        assert_eq!(history.successes, 2);
        assert_eq!(history.errors, 1);
        assert_eq!(history.stale, 1);
        assert_eq!(history.avg_success_latency_ms, Some(2000));
        assert_eq!(history.last_error.as_deref(), Some("API error: 500 - boom"));
        assert!((history.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn functions_sorted_by_calls() {
        let events = vec![
            event(None, Outcome::Success, 10),
            event(Some("general_percentage_distribution"), Outcome::Error, 10),
            event(Some("general_percentage_distribution"), Outcome::Success, 10),
        ];
        let history = build_history(&events);

        assert_eq!(history.functions[0].function, "general_percentage_distribution");
        assert_eq!(history.functions[0].calls, 2);
        assert_eq!(history.functions[0].errors, 1);
        assert_eq!(history.functions[1].function, "(base case)");
    }
}
