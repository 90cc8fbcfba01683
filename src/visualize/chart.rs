/// Renderer-agnostic chart primitives.
///
/// Values are copied from the backend as received: an integer stays an
/// integer and nothing is rescaled. Series values are percentages; raw user
/// counts ride along in [`ChartPoint::count`].
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One bar or pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Number,
    /// Raw number of users behind a percentage slice, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<Number>,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: Number) -> Self {
        Self {
            label: label.into(),
            value,
            count: None,
        }
    }

    pub fn with_count(mut self, count: Option<Number>) -> Self {
        self.count = count;
        self
    }

    /// The value as a float, for drawing.
    pub fn magnitude(&self) -> f64 {
        self.value.as_f64().unwrap_or(0.0)
    }
}

/// An ordered set of points drawn as one bar chart or pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Build a series from a label → number mapping, in mapping order.
    ///
    /// Entries whose value is not a number are skipped.
    pub fn from_distribution(title: impl Into<String>, map: &Map<String, Value>) -> Self {
        Self {
            title: title.into(),
            points: distribution_points(map),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.label.as_str())
    }
}

/// Numeric entries of a distribution as points, in mapping order.
pub fn distribution_points(map: &Map<String, Value>) -> Vec<ChartPoint> {
    map.iter()
        .filter_map(|(label, value)| match value {
            Value::Number(n) => Some(ChartPoint::new(label.as_str(), n.clone())),
            _ => None,
        })
        .collect()
}

/// `a - b`, staying integral when both operands are integers.
pub fn difference(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64())
        && let Some(diff) = a.checked_sub(b)
    {
        return Some(Number::from(diff));
    }
    Number::from_f64(a.as_f64()? - b.as_f64()?)
}

// ---------------------------------------------------------------------------
// Breakdown table
// ---------------------------------------------------------------------------

/// One category row of a cross-tabulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub row_key: String,
    pub total: Option<Number>,
    pub distribution: Vec<ChartPoint>,
}

/// Category → distribution table, also drawn as a stacked bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownTable {
    pub row_field: Option<String>,
    pub column_field: Option<String>,
    /// Union of every row's distribution labels, first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<BreakdownRow>,
}

impl BreakdownTable {
    pub fn new(row_field: Option<String>, column_field: Option<String>, rows: Vec<BreakdownRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for point in rows.iter().flat_map(|r| &r.distribution) {
            if !columns.contains(&point.label) {
                columns.push(point.label.clone());
            }
        }
        Self {
            row_field,
            column_field,
            columns,
            rows,
        }
    }

    /// Stacked-bar cell value; a label missing from a row reads as 0.
    pub fn cell(&self, row_key: &str, column: &str) -> Number {
        self.rows
            .iter()
            .find(|r| r.row_key == row_key)
            .and_then(|r| r.distribution.iter().find(|p| p.label == column))
            .map_or_else(|| Number::from(0), |p| p.value.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
