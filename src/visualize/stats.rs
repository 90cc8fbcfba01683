/// Typed views of `multivalue_stats`, one per analytic function.
///
/// Deserialization is lenient: each field is read independently, so one
/// malformed field degrades to `None` instead of losing the whole block.
/// Numbers are kept exactly as received.
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::model::lenient;

/// A label → value mapping in the order the backend sent it.
pub type Distribution = Map<String, Value>;

/// `conditional_rating_analysis`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConditionalGroupStats {
    pub matching_group: Option<GroupStats>,
    pub opposite_group: Option<GroupStats>,
}

/// One population inside a conditional comparison.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupStats {
    #[serde(deserialize_with = "lenient::number")]
    pub total: Option<Number>,
    #[serde(deserialize_with = "lenient::map")]
    pub distribution: Distribution,
}

/// `conditional_rating_to_rating_analysis`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RatingMatchStats {
    #[serde(deserialize_with = "lenient::text")]
    pub base_condition: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub compare_condition: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub match_percent: Option<Number>,
    #[serde(deserialize_with = "lenient::number")]
    pub matching_users: Option<Number>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_base_users: Option<Number>,
}

/// `conditional_category_to_category_analysis`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryStats {
    #[serde(deserialize_with = "lenient::text")]
    pub base_field: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub compare_field: Option<String>,
    /// Category → group, in received order.
    #[serde(deserialize_with = "lenient::map")]
    pub summary: Map<String, Value>,
}

impl CategoryStats {
    /// Each category's group. Entries that are not group-shaped read as empty.
    pub fn groups(&self) -> impl Iterator<Item = (&str, GroupStats)> {
        self.summary.iter().map(|(category, raw)| {
            let group = serde_json::from_value(raw.clone()).unwrap_or_default();
            (category.as_str(), group)
        })
    }
}

/// `conditional_distribution_analysis`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DistributionStats {
    #[serde(deserialize_with = "lenient::text")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub target_field: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_filtered_rows: Option<Number>,
    #[serde(deserialize_with = "lenient::map")]
    pub distribution: Distribution,
}

/// `general_percentage_distribution`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PercentageStats {
    #[serde(deserialize_with = "lenient::number")]
    pub match_percent: Option<Number>,
    #[serde(deserialize_with = "lenient::number")]
    pub matching_users: Option<Number>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_users: Option<Number>,
    #[serde(deserialize_with = "lenient::text")]
    pub field: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub operator: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub threshold: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub note: Option<String>,
}

/// Read a typed view out of the raw block. Missing or non-object input
/// yields the all-default view.
pub fn parse<T>(raw: Option<&Value>) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    raw.filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_field_does_not_poison_block() {
        let raw = json!({
            "match_percent": "lots",
            "matching_users": 40,
            "field": "overall_rating",
            "threshold": 8
        });
        let stats: PercentageStats = parse(Some(&raw));
        assert_eq!(stats.match_percent, None);
        assert_eq!(stats.matching_users, Some(Number::from(40)));
        assert_eq!(stats.field.as_deref(), Some("overall_rating"));
        assert_eq!(stats.threshold.as_deref(), Some("8"));
    }

    #[test]
    fn non_object_block_reads_as_default() {
        let stats: DistributionStats = parse(Some(&json!([1, 2, 3])));
        assert!(stats.distribution.is_empty());
        let stats: DistributionStats = parse(None);
        assert!(stats.condition.is_none());
    }

    #[test]
    fn distribution_keeps_received_order() {
        let raw: Value =
            serde_json::from_str(r#"{"distribution": {"Solo": 10, "Couple": 30, "Family": 20}}"#)
                .unwrap();
        let stats: DistributionStats = parse(Some(&raw));
        let keys: Vec<&str> = stats.distribution.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Solo", "Couple", "Family"]);
    }

    #[test]
    fn category_groups_tolerate_odd_entries() {
        let raw = json!({
            "summary": {
                "Economy": {"total": 50, "distribution": {"yes": 20}},
                "Broken": "n/a"
            }
        });
        let stats: CategoryStats = parse(Some(&raw));
        let groups: Vec<(&str, GroupStats)> = stats.groups().collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.total, Some(Number::from(50)));
        assert!(groups[1].1.distribution.is_empty());
    }
}
