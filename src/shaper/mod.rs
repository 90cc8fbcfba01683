/// Result shaper: builds the interpretation request from an analytics result.
///
/// The shaper is a pure, total function over [`AnalyticsResult`]. It picks
/// the mode-specific query text and statistics block, forwards the
/// special-case statistics (annotated with the user-facing message) and
/// normalizes the first few review rows. The input is only borrowed; the
/// forwarded statistics are copies.
use serde::Serialize;
use serde_json::Value;

use crate::model::{AnalyticsResult, ResultMode, ReviewRecord, StatsMap};

/// Maximum number of review rows forwarded to the interpreter.
pub const TOP_REVIEWS_LIMIT: usize = 5;

/// Placeholder for reviews without an airline name.
const UNKNOWN_AIRLINE: &str = "Unknown";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /interpret_agent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretationRequest {
    /// The user's original query.
    pub query: String,
    /// The query as rewritten by the backend for the active mode.
    pub reintr_query: String,
    pub top_reviews: Vec<TopReview>,
    /// Mode-selected aggregate statistics; `{}` when the result has none.
    pub base_stats: StatsMap,
    /// Special-case statistics, serialized as `null` for base-case results.
    pub special_stats: Option<Value>,
}

/// A normalized review row inside [`InterpretationRequest::top_reviews`].
///
/// Pass-through columns keep an explicit `null`; only missing keys are
/// left out of the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopReview {
    pub airline_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_rating: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_of_traveller: Option<Value>,
    pub review: String,
}

impl From<&ReviewRecord> for TopReview {
    fn from(row: &ReviewRecord) -> Self {
        Self {
            airline_name: row
                .airline_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_AIRLINE.to_string()),
            overall_rating: row.overall_rating.clone(),
            recommended: row.recommended.clone(),
            verified: row.verified.clone(),
            seat_type: row.seat_type.clone(),
            type_of_traveller: row.type_of_traveller.clone(),
            review: row.review.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shaping
// ---------------------------------------------------------------------------

/// Build the interpretation request for `result` and the user's `query`.
pub fn build_interpretation_request(result: &AnalyticsResult, query: &str) -> InterpretationRequest {
    let (reintr_query, base_stats) = match result.mode {
        ResultMode::SpecialCase => (&result.semantic_query_used, &result.base_stats),
        ResultMode::BaseCase => (&result.interpreted_query, &result.summary_stats),
    };

    InterpretationRequest {
        query: query.to_string(),
        reintr_query: reintr_query.clone().unwrap_or_default(),
        top_reviews: result
            .display_rows
            .iter()
            .take(TOP_REVIEWS_LIMIT)
            .map(TopReview::from)
            .collect(),
        base_stats: base_stats.clone().unwrap_or_default(),
        special_stats: special_stats(result),
    }
}

/// Forwarded special-case statistics.
///
/// `None` for base-case results or when the backend sent no statistics.
/// Object-shaped statistics gain a `description` field carrying the
/// non-empty `user_message`.
fn special_stats(result: &AnalyticsResult) -> Option<Value> {
    if !result.is_special_case() {
        return None;
    }

    let stats = result.multivalue_stats.as_ref().filter(|v| !v.is_null())?;
    let mut forwarded = stats.clone();

    if let Some(message) = result.user_message()
        && let Value::Object(map) = &mut forwarded
    {
        map.insert("description".to_string(), Value::String(message.to_string()));
    }

    Some(forwarded)
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Shape of an outgoing request, recorded in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub mode: ResultMode,
    pub has_reintr_query: bool,
    pub has_base_stats: bool,
    pub has_special_stats: bool,
    pub has_description: bool,
    pub top_reviews_count: usize,
}

impl InterpretationRequest {
    /// Summarize the request for logging.
    pub fn summary(&self, mode: ResultMode) -> RequestSummary {
        let has_description = self
            .special_stats
            .as_ref()
            .and_then(|stats| stats.get("description"))
            .and_then(Value::as_str)
            .is_some_and(|d| !d.is_empty());

        RequestSummary {
            mode,
            has_reintr_query: !self.reintr_query.is_empty(),
            has_base_stats: !self.base_stats.is_empty(),
            has_special_stats: self.special_stats.is_some(),
            has_description,
            top_reviews_count: self.top_reviews.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
