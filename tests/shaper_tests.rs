use flightlens::model::AnalyticsResult;
use flightlens::shaper::{TOP_REVIEWS_LIMIT, build_interpretation_request};
use serde_json::{Value, json};

fn parse(value: Value) -> AnalyticsResult {
    AnalyticsResult::from_json(&value.to_string()).unwrap()
}

fn rows(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"airline_name": format!("Airline {i}"), "overall_rating": i, "review": format!("r{i}")}))
        .collect()
}

#[test]
fn base_case_uses_summary_stats_and_null_special_stats() {
    let result = parse(json!({
        "mode": "base_case",
        "interpreted_query": "reviews about legroom",
        "semantic_query_used": "ignored",
        "summary_stats": {"total_reviews": 40, "recommendation_rate": 55.0},
        "base_stats": {"total_reviews": 999},
        "multivalue_stats": {"distribution": {"A": 1}}
    }));

    let request = build_interpretation_request(&result, "legroom?");

    assert_eq!(request.query, "legroom?");
    assert_eq!(request.reintr_query, "reviews about legroom");
    assert_eq!(Value::Object(request.base_stats.clone()), json!({"total_reviews": 40, "recommendation_rate": 55.0}));
    assert!(request.special_stats.is_none());

    let wire = serde_json::to_value(&request).unwrap();
    assert!(wire["special_stats"].is_null());
}

#[test]
fn base_case_without_stats_sends_empty_object() {
    let request = build_interpretation_request(&parse(json!({"mode": "base_case"})), "q");
    let wire = serde_json::to_value(&request).unwrap();
    assert_eq!(wire["base_stats"], json!({}));
    assert_eq!(wire["reintr_query"], "");
}

#[test]
fn special_case_adds_description_without_touching_source() {
    let result = parse(json!({
        "mode": "special_case",
        "semantic_query_used": "solo travellers",
        "base_stats": {"total_reviews": 10},
        "multivalue_stats": {"match_percent": 42.0},
        "user_message": "Share of solo travellers rating 8+"
    }));
    let before = result.clone();

    let request = build_interpretation_request(&result, "q");

    assert_eq!(request.reintr_query, "solo travellers");
    assert_eq!(
        request.special_stats,
        Some(json!({"match_percent": 42.0, "description": "Share of solo travellers rating 8+"}))
    );
    assert_eq!(result, before);
    assert_eq!(result.multivalue_stats, Some(json!({"match_percent": 42.0})));
}

#[test]
fn empty_user_message_adds_no_description() {
    let result = parse(json!({
        "mode": "special_case",
        "multivalue_stats": {"match_percent": 42.0},
        "user_message": ""
    }));
    let request = build_interpretation_request(&result, "q");
    assert_eq!(request.special_stats, Some(json!({"match_percent": 42.0})));
}

#[test]
fn top_reviews_capped_in_order() {
    let result = parse(json!({"mode": "base_case", "display_rows": rows(9)}));
    let request = build_interpretation_request(&result, "q");

    assert_eq!(request.top_reviews.len(), TOP_REVIEWS_LIMIT);
    let names: Vec<&str> = request.top_reviews.iter().map(|r| r.airline_name.as_str()).collect();
    assert_eq!(names, ["Airline 0", "Airline 1", "Airline 2", "Airline 3", "Airline 4"]);
}

#[test]
fn fewer_rows_are_all_forwarded() {
    let result = parse(json!({"mode": "base_case", "display_rows": rows(2)}));
    assert_eq!(build_interpretation_request(&result, "q").top_reviews.len(), 2);

    let result = parse(json!({"mode": "base_case", "display_rows": null}));
    assert!(build_interpretation_request(&result, "q").top_reviews.is_empty());
}

#[test]
fn missing_review_fields_get_defaults() {
    let result = parse(json!({
        "mode": "base_case",
        "display_rows": [
            {"overall_rating": 3, "seat_type": "Economy Class"},
            {"airline_name": "", "review": "late again", "verified": true}
        ]
    }));
    let wire = serde_json::to_value(build_interpretation_request(&result, "q")).unwrap();

    let first = &wire["top_reviews"][0];
    assert_eq!(first["airline_name"], "Unknown");
    assert_eq!(first["review"], "");
    assert_eq!(first["overall_rating"], 3);
    assert_eq!(first["seat_type"], "Economy Class");
    assert!(first.get("recommended").is_none());

    let second = &wire["top_reviews"][1];
    assert_eq!(second["airline_name"], "Unknown");
    assert_eq!(second["review"], "late again");
    assert_eq!(second["verified"], true);
}

#[test]
fn summary_describes_request_shape() {
    let result = parse(json!({
        "mode": "special_case",
        "semantic_query_used": "x",
        "multivalue_stats": {"a": 1},
        "user_message": "m",
        "display_rows": rows(3)
    }));
    let request = build_interpretation_request(&result, "q");
    let summary = request.summary(result.mode);

    assert!(summary.has_reintr_query);
    assert!(!summary.has_base_stats);
    assert!(summary.has_special_stats);
    assert!(summary.has_description);
    assert_eq!(summary.top_reviews_count, 3);
}
