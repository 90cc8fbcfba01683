/// Visualization selector for special-case analytics results.
///
/// `function_executed` names one of five fixed analytic routines. Each maps
/// to a transform that restructures `multivalue_stats` into chart primitives
/// ([`chart`]); an unrecognized name maps to [`Visualization::Unsupported`],
/// which renderers show as a placeholder. Transforms never touch the network
/// and never recompute statistics.
pub mod chart;
pub mod stats;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::model::{AnalyticsResult, ResultMode, StatsMap};
use chart::{BreakdownRow, BreakdownTable, ChartPoint, ChartSeries};

// ---------------------------------------------------------------------------
// Analytic functions
// ---------------------------------------------------------------------------

/// The analytic routines the backend can report in `function_executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticFunction {
    ConditionalRatingAnalysis,
    ConditionalRatingToRatingAnalysis,
    ConditionalCategoryToCategoryAnalysis,
    ConditionalDistributionAnalysis,
    GeneralPercentageDistribution,
}

impl AnalyticFunction {
    pub const ALL: [Self; 5] = [
        Self::ConditionalRatingAnalysis,
        Self::ConditionalRatingToRatingAnalysis,
        Self::ConditionalCategoryToCategoryAnalysis,
        Self::ConditionalDistributionAnalysis,
        Self::GeneralPercentageDistribution,
    ];

    /// Exact-match lookup of a backend identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ConditionalRatingAnalysis => "conditional_rating_analysis",
            Self::ConditionalRatingToRatingAnalysis => "conditional_rating_to_rating_analysis",
            Self::ConditionalCategoryToCategoryAnalysis => {
                "conditional_category_to_category_analysis"
            }
            Self::ConditionalDistributionAnalysis => "conditional_distribution_analysis",
            Self::GeneralPercentageDistribution => "general_percentage_distribution",
        }
    }

    /// Human title for the panel heading.
    pub fn title(self) -> &'static str {
        match self {
            Self::ConditionalRatingAnalysis => "Analysis Summary",
            Self::ConditionalRatingToRatingAnalysis => "Comparative Analysis",
            Self::ConditionalCategoryToCategoryAnalysis => "Category Cross-Analysis",
            Self::ConditionalDistributionAnalysis => "Distribution Analysis",
            Self::GeneralPercentageDistribution => "Percentage Distribution",
        }
    }
}

impl std::fmt::Display for AnalyticFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Visualization output
// ---------------------------------------------------------------------------

/// Chart data for one special-case result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visualization {
    /// Two populations, each with a percentage distribution.
    ConditionalGroups {
        matching_total: Number,
        opposite_total: Number,
        matching: ChartSeries,
        opposite: ChartSeries,
    },
    /// How often a base rating condition also meets a compare condition.
    RatingMatch {
        base_condition: Option<String>,
        compare_condition: Option<String>,
        match_percent: Number,
        split: ChartSeries,
    },
    /// Cross-tabulation of two categorical fields.
    CategoryBreakdown { table: BreakdownTable },
    /// One field's distribution under a filter condition.
    Distribution {
        condition: Option<String>,
        target_field: Option<String>,
        total_filtered_rows: Option<Number>,
        series: ChartSeries,
    },
    /// Share of users meeting `field operator threshold`.
    PercentageSplit {
        field: Option<String>,
        operator: Option<String>,
        threshold: Option<String>,
        note: Option<String>,
        matching_users: Option<Number>,
        total_users: Option<Number>,
        match_percent: Number,
        split: ChartSeries,
    },
    /// No chart exists for this function; render a placeholder.
    Unsupported { function: Option<String> },
}

impl Visualization {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }
}

// ---------------------------------------------------------------------------
// Transform selection
// ---------------------------------------------------------------------------

/// The restructuring chosen for a `function_executed` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    Known(AnalyticFunction),
    Unsupported(String),
}

/// Pick the transform for `function_name`. Never fails.
pub fn select_transform(function_name: &str) -> Transform {
    match AnalyticFunction::from_name(function_name) {
        Some(function) => Transform::Known(function),
        None => Transform::Unsupported(function_name.to_string()),
    }
}

impl Transform {
    /// Restructure `multivalue_stats` (absent reads as `{}`).
    pub fn apply(&self, raw: Option<&Value>) -> Visualization {
        let function = match self {
            Self::Known(function) => *function,
            Self::Unsupported(name) => {
                return Visualization::Unsupported {
                    function: Some(name.clone()),
                };
            }
        };

        match function {
            AnalyticFunction::ConditionalRatingAnalysis => conditional_groups(stats::parse(raw)),
            AnalyticFunction::ConditionalRatingToRatingAnalysis => rating_match(stats::parse(raw)),
            AnalyticFunction::ConditionalCategoryToCategoryAnalysis => {
                category_breakdown(stats::parse(raw))
            }
            AnalyticFunction::ConditionalDistributionAnalysis => distribution(stats::parse(raw)),
            AnalyticFunction::GeneralPercentageDistribution => percentage_split(stats::parse(raw)),
        }
    }
}

fn conditional_groups(stats: stats::ConditionalGroupStats) -> Visualization {
    let matching = stats.matching_group.unwrap_or_default();
    let opposite = stats.opposite_group.unwrap_or_default();

    Visualization::ConditionalGroups {
        matching_total: matching.total.unwrap_or_else(zero),
        opposite_total: opposite.total.unwrap_or_else(zero),
        matching: ChartSeries::from_distribution("Matching Group Distribution", &matching.distribution),
        opposite: ChartSeries::from_distribution("Opposite Group Distribution", &opposite.distribution),
    }
}

fn rating_match(stats: stats::RatingMatchStats) -> Visualization {
    let match_percent = stats.match_percent.unwrap_or_else(zero);
    let matching_users = stats.matching_users.unwrap_or_else(zero);
    let total_base_users = stats.total_base_users.unwrap_or_else(zero);
    let not_matching_users = chart::difference(&total_base_users, &matching_users);

    Visualization::RatingMatch {
        base_condition: stats.base_condition,
        compare_condition: stats.compare_condition,
        split: match_split(&match_percent, Some(matching_users), not_matching_users),
        match_percent,
    }
}

fn category_breakdown(stats: stats::CategoryStats) -> Visualization {
    let rows = stats
        .groups()
        .map(|(category, group)| BreakdownRow {
            row_key: category.to_string(),
            total: group.total,
            distribution: chart::distribution_points(&group.distribution),
        })
        .collect();

    Visualization::CategoryBreakdown {
        table: BreakdownTable::new(stats.base_field.clone(), stats.compare_field.clone(), rows),
    }
}

fn distribution(stats: stats::DistributionStats) -> Visualization {
    let title = match &stats.target_field {
        Some(field) => format!("{field} Distribution"),
        None => "Distribution".to_string(),
    };

    Visualization::Distribution {
        series: ChartSeries::from_distribution(title, &stats.distribution),
        condition: stats.condition,
        target_field: stats.target_field,
        total_filtered_rows: stats.total_filtered_rows,
    }
}

fn percentage_split(stats: stats::PercentageStats) -> Visualization {
    let match_percent = stats.match_percent.unwrap_or_else(zero);
    let not_matching_users = stats
        .total_users
        .as_ref()
        .zip(stats.matching_users.as_ref())
        .and_then(|(total, matching)| chart::difference(total, matching));

    Visualization::PercentageSplit {
        split: match_split(&match_percent, stats.matching_users.clone(), not_matching_users),
        field: stats.field,
        operator: stats.operator,
        threshold: stats.threshold,
        note: stats.note,
        matching_users: stats.matching_users,
        total_users: stats.total_users,
        match_percent,
    }
}

/// Two-slice pie: the received match percentage and its complement.
fn match_split(
    match_percent: &Number,
    matching: Option<Number>,
    not_matching: Option<Number>,
) -> ChartSeries {
    let complement = chart::difference(&Number::from(100), match_percent).unwrap_or_else(zero);
    ChartSeries {
        title: "Percentage Breakdown".to_string(),
        points: vec![
            ChartPoint::new("Matching", match_percent.clone()).with_count(matching),
            ChartPoint::new("Not Matching", complement).with_count(not_matching),
        ],
    }
}

fn zero() -> Number {
    Number::from(0)
}

// ---------------------------------------------------------------------------
// Summary cards
// ---------------------------------------------------------------------------

/// One headline metric card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub key: &'static str,
    pub label: &'static str,
    pub value: Value,
    /// The value as displayed on the card.
    pub display: String,
}

/// Card definitions, in display order: key, label, decimals, percent suffix.
const SUMMARY_METRICS: [(&str, &str, Option<usize>, bool); 4] = [
    ("average_overall_rating", "Avg Overall Rating", Some(2), false),
    ("recommendation_rate", "Recommendation Rate", Some(1), true),
    ("verification_rate", "Verification Rate", Some(1), true),
    ("total_reviews", "Total Reviews", None, false),
];

/// Whether the summary cards section is shown for `base_stats`.
///
/// Hidden when the stats carry a truthy `error` (anything but `null`,
/// `false`, `0` or `""`), or when none of the four card metrics is present.
pub fn summary_cards_visible(base_stats: Option<&StatsMap>) -> bool {
    !summary_cards(base_stats).is_empty()
}

/// The cards to show for `base_stats`; empty when the section is hidden.
pub fn summary_cards(base_stats: Option<&StatsMap>) -> Vec<SummaryCard> {
    let Some(stats) = base_stats else {
        return Vec::new();
    };
    if stats.get("error").is_some_and(is_truthy) {
        return Vec::new();
    }

    SUMMARY_METRICS
        .iter()
        .filter_map(|&(key, label, decimals, percent)| {
            let value = stats.get(key).filter(|v| !v.is_null())?;
            Some(SummaryCard {
                key,
                label,
                value: value.clone(),
                display: format_metric(value, decimals, percent),
            })
        })
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn format_metric(value: &Value, decimals: Option<usize>, percent: bool) -> String {
    let text = match (value.as_f64(), decimals) {
        (Some(n), Some(places)) => format!("{n:.places$}"),
        _ => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    };
    if percent { format!("{text}%") } else { text }
}

// ---------------------------------------------------------------------------
// Whole-result view
// ---------------------------------------------------------------------------

/// Everything the special-case panel renders, keyed by `function_executed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub function_executed: Option<String>,
    /// Header: the query as the backend rewrote it.
    pub semantic_query_used: Option<String>,
    /// Header: number of rows the backend fetched.
    pub total_results_fetched: Option<Number>,
    /// Caption shown above the chart; absent when empty.
    pub user_message: Option<String>,
    pub visualization: Visualization,
    pub summary: Vec<SummaryCard>,
}

/// Build the dashboard view of `result`.
///
/// Summary cards read the mode-selected statistics: `base_stats` for special
/// case, `summary_stats` otherwise.
pub fn visualize(result: &AnalyticsResult) -> Dashboard {
    let visualization = match result.function_executed.as_deref() {
        Some(name) => select_transform(name).apply(result.multivalue_stats.as_ref()),
        None => Visualization::Unsupported { function: None },
    };

    let stats = match result.mode {
        ResultMode::SpecialCase => result.base_stats.as_ref(),
        ResultMode::BaseCase => result.summary_stats.as_ref(),
    };

    Dashboard {
        function_executed: result.function_executed.clone(),
        semantic_query_used: result.semantic_query_used.clone(),
        total_results_fetched: result.total_results_fetched.clone(),
        user_message: result.user_message().map(str::to_string),
        visualization,
        summary: summary_cards(stats),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
