/// Wire model for analytics results produced by the upstream agent service.
///
/// Every field is optional on the wire. Absence is represented with `Option`
/// (or an empty collection) and the defaults are applied by the consumers:
/// the request shaper in [`crate::shaper`] and the chart transforms in
/// [`crate::visualize`]. Nothing in this module mutates a result after it has
/// been deserialized.
pub mod lenient;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Aggregate metric name → value, as returned by the backend.
///
/// Key order is the order received (`serde_json` is built with
/// `preserve_order`).
pub type StatsMap = Map<String, Value>;

// ---------------------------------------------------------------------------
// Result mode
// ---------------------------------------------------------------------------

/// Which backend path produced a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// Simple aggregate path.
    #[default]
    BaseCase,
    /// Multi-statistic conditional path.
    SpecialCase,
}

impl ResultMode {
    /// Only the literal `"special_case"` selects the conditional path; a
    /// missing, null or unrecognized mode falls back to `base_case`.
    pub fn from_name(raw: Option<&str>) -> Self {
        match raw {
            Some("special_case") => Self::SpecialCase,
            _ => Self::BaseCase,
        }
    }
}

impl<'de> Deserialize<'de> for ResultMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_name(raw.as_str()))
    }
}

impl std::fmt::Display for ResultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseCase => write!(f, "base_case"),
            Self::SpecialCase => write!(f, "special_case"),
        }
    }
}

// ---------------------------------------------------------------------------
// Analytics result
// ---------------------------------------------------------------------------

/// The backend's response to a user query.
///
/// Parsing only fails on malformed JSON or a non-object document. A field of
/// the wrong type reads as absent (see [`lenient`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    #[serde(default)]
    pub mode: ResultMode,
    #[serde(default, deserialize_with = "review_rows")]
    pub display_rows: Vec<ReviewRecord>,
    /// Query as rewritten by the base-case path.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub interpreted_query: Option<String>,
    /// Query as rewritten by the special-case path.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub semantic_query_used: Option<String>,
    /// Base-case aggregates.
    #[serde(default, deserialize_with = "lenient::object", skip_serializing_if = "Option::is_none")]
    pub summary_stats: Option<StatsMap>,
    /// Special-case aggregates over the unfiltered population.
    #[serde(default, deserialize_with = "lenient::object", skip_serializing_if = "Option::is_none")]
    pub base_stats: Option<StatsMap>,
    /// Nested statistics whose shape depends on `function_executed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multivalue_stats: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub function_executed: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub total_results_fetched: Option<Number>,
}

impl AnalyticsResult {
    /// Parse a result from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn is_special_case(&self) -> bool {
        self.mode == ResultMode::SpecialCase
    }

    /// `user_message`, treating an empty string as absent.
    pub fn user_message(&self) -> Option<&str> {
        self.user_message.as_deref().filter(|m| !m.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Review record
// ---------------------------------------------------------------------------

/// One review row from `display_rows`.
///
/// The pass-through columns are kept as raw JSON values: the backend is not
/// consistent about their types, and an explicit `null` is forwarded as
/// `null` while a missing key stays missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub airline_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub overall_rating: Option<Value>,
    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub recommended: Option<Value>,
    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub verified: Option<Value>,
    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub seat_type: Option<Value>,
    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub type_of_traveller: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

/// `display_rows`: `null` or a non-array reads as empty; a row that is not an
/// object reads as an all-absent record.
fn review_rows<'de, D>(deserializer: D) -> Result<Vec<ReviewRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(rows) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(rows
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap_or_default())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
