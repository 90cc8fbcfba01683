/// Integration tests for the interpretation client and session.
///
/// Each test starts a throwaway `tiny_http` server on `127.0.0.1:0` that
/// answers exactly one request, then drives a real [`InterpretClient`]
/// through [`interpret_result`].
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flightlens::interpret::{
    InterpretClient, InterpretError, InterpretationSession, Lifecycle, NO_INTERPRETATION,
    Resolution, interpret_result,
};
use flightlens::model::AnalyticsResult;
use serde_json::{Value, json};
use tiny_http::{Response, Server, StatusCode};

/// What the mock server saw: request path and body.
type Received = Option<(String, String)>;

/// Serve one canned response; returns the base URL and a handle yielding
/// the received request.
fn mock_interpreter(status: u16, body: &'static str) -> (String, JoinHandle<Received>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = thread::spawn(move || {
        let mut request = server.recv().ok()?;
        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).ok()?;
        let path = request.url().to_string();
        let response = Response::from_string(body).with_status_code(StatusCode(status));
        request.respond(response).ok()?;
        Some((path, received))
    });

    (format!("http://{addr}"), handle)
}

fn client(base_url: &str) -> InterpretClient {
    InterpretClient::new(base_url, "/interpret_agent", Duration::from_secs(5))
}

fn special_case_result() -> AnalyticsResult {
    let rows: Vec<Value> = (1..=7)
        .map(|i| json!({"airline_name": format!("Airline {i}"), "review": format!("review {i}")}))
        .collect();

    AnalyticsResult::from_json(
        &json!({
            "mode": "special_case",
            "semantic_query_used": "economy reviews rated 8+",
            "base_stats": {"total_reviews": 1200, "average_overall_rating": 6.1},
            "multivalue_stats": {"distribution": {"A": 60, "B": 40}},
            "user_message": "Distribution of traveller types",
            "function_executed": "conditional_distribution_analysis",
            "display_rows": rows
        })
        .to_string(),
    )
    .unwrap()
}

#[test]
fn success_carries_answer_and_request_shape() {
    let (base, handle) = mock_interpreter(200, r#"{"answer": "Most travellers are solo."}"#);
    let mut session = InterpretationSession::new();
    let result = special_case_result();

    let trigger = interpret_result(&mut session, &client(&base), Some(&result), "who flies?").unwrap();

    assert_eq!(trigger.resolution, Resolution::Applied);
    assert_eq!(session.state(), &Lifecycle::Success("Most travellers are solo.".into()));

    let (path, body) = handle.join().unwrap().unwrap();
    assert_eq!(path, "/interpret_agent");
    let sent: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent["query"], "who flies?");
    assert_eq!(sent["reintr_query"], "economy reviews rated 8+");
    assert_eq!(sent["top_reviews"].as_array().unwrap().len(), 5);
    assert_eq!(sent["top_reviews"][4]["airline_name"], "Airline 5");
    assert_eq!(sent["base_stats"]["total_reviews"], 1200);
    assert_eq!(sent["special_stats"]["description"], "Distribution of traveller types");
    assert_eq!(sent["special_stats"]["distribution"]["A"], 60);
}

#[test]
fn server_error_reports_status_and_body() {
    let (base, handle) = mock_interpreter(500, "boom");
    let mut session = InterpretationSession::new();
    let result = special_case_result();

    interpret_result(&mut session, &client(&base), Some(&result), "q").unwrap();
    handle.join().unwrap();

    let message = session.state().error().unwrap();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("boom"), "{message}");
}

#[test]
fn empty_answer_uses_fallback_text() {
    let (base, handle) = mock_interpreter(200, "{}");
    let mut session = InterpretationSession::new();
    let result = AnalyticsResult::default();

    interpret_result(&mut session, &client(&base), Some(&result), "q").unwrap();
    handle.join().unwrap();

    assert_eq!(session.state().text(), Some(NO_INTERPRETATION));
}

#[test]
fn base_case_sends_null_special_stats() {
    let (base, handle) = mock_interpreter(200, r#"{"answer": "ok"}"#);
    let result = AnalyticsResult::from_json(
        r#"{"mode": "base_case", "interpreted_query": "all reviews", "summary_stats": {"total_reviews": 3}}"#,
    )
    .unwrap();

    client(&base)
        .interpret(&flightlens::shaper::build_interpretation_request(&result, "q"))
        .unwrap();

    let (_, body) = handle.join().unwrap().unwrap();
    let sent: Value = serde_json::from_str(&body).unwrap();
    assert!(sent["special_stats"].is_null());
    assert_eq!(sent["base_stats"], json!({"total_reviews": 3}));
    assert_eq!(sent["reintr_query"], "all reviews");
}

#[test]
fn non_json_body_is_a_decode_error() {
    let (base, handle) = mock_interpreter(200, "<html>gateway</html>");
    let request = flightlens::shaper::build_interpretation_request(&AnalyticsResult::default(), "q");

    let err = client(&base).interpret(&request).unwrap_err();
    handle.join().unwrap();

    assert!(matches!(err, InterpretError::Decode(_)));
}

#[test]
fn refused_connection_is_a_network_error() {
    // Bind then drop to obtain a port nothing listens on.
    let addr = {
        let server = Server::http("127.0.0.1:0").unwrap();
        server.server_addr().to_ip().unwrap()
    };
    let request = flightlens::shaper::build_interpretation_request(&AnalyticsResult::default(), "q");

    let err = client(&format!("http://{addr}")).interpret(&request).unwrap_err();
    assert!(matches!(err, InterpretError::Network(_)));

    let mut session = InterpretationSession::new();
    let token = session.begin();
    session.resolve(token, Err(err));
    assert!(session.state().error().unwrap().starts_with("network error"));
}

#[test]
fn no_result_makes_no_call() {
    let mut session = InterpretationSession::new();
    let unreachable = client("http://127.0.0.1:9");
    assert!(interpret_result(&mut session, &unreachable, None, "q").is_none());
    assert_eq!(session.state(), &Lifecycle::Idle);
}
