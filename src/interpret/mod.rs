/// Interpretation client: turns an analytics result into narrative text.
///
/// Interpretation is always user-triggered. A trigger shapes the in-memory
/// result into an [`InterpretationRequest`](crate::shaper::InterpretationRequest),
/// moves the session to `Loading`, performs the call through an
/// [`Interpreter`] and resolves the session with the outcome.
///
/// # Components
///
/// - [`client`]: the `ureq` transport and its error taxonomy.
/// - [`lifecycle`]: the per-session state machine with request tokens.
///
/// [`interpret_result`] performs the call inline, which suits the CLI. The
/// local server instead calls [`InterpretationSession::begin`] and runs the
/// call on a worker thread, so triggers can overlap; they are settled by
/// token and only the latest trigger may resolve.
use std::time::Instant;

pub mod client;
pub mod lifecycle;

pub use client::{InterpretClient, InterpretError, NO_INTERPRETATION};
pub use lifecycle::{InterpretationSession, Lifecycle, RequestToken, Resolution};

use crate::model::AnalyticsResult;
use crate::shaper::{InterpretationRequest, RequestSummary, build_interpretation_request};

/// Transport seam for interpretation calls.
pub trait Interpreter {
    fn interpret(&self, request: &InterpretationRequest) -> Result<String, InterpretError>;
}

/// Record of one completed trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub token: RequestToken,
    pub resolution: Resolution,
    pub summary: RequestSummary,
    pub latency_ms: u64,
}

/// Interpret `result` for `query`, updating `session`.
///
/// Returns `None` without touching the session when there is no result yet.
pub fn interpret_result<I>(
    session: &mut InterpretationSession,
    interpreter: &I,
    result: Option<&AnalyticsResult>,
    query: &str,
) -> Option<Trigger>
where
    I: Interpreter + ?Sized,
{
    let result = result?;
    let request = build_interpretation_request(result, query);
    let summary = request.summary(result.mode);

    let token = session.begin();
    let start = Instant::now();
    let outcome = interpreter.interpret(&request);
    let latency_ms = start.elapsed().as_millis() as u64;
    let resolution = session.resolve(token, outcome);

    Some(Trigger {
        token,
        resolution,
        summary,
        latency_ms,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Interpreter that replays canned outcomes and records requests.
    struct Scripted {
        outcomes: RefCell<Vec<Result<String, InterpretError>>>,
        seen: RefCell<Vec<InterpretationRequest>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, InterpretError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Interpreter for Scripted {
        fn interpret(&self, request: &InterpretationRequest) -> Result<String, InterpretError> {
            self.seen.borrow_mut().push(request.clone());
            self.outcomes.borrow_mut().remove(0)
        }
    }

    #[test]
    fn absent_result_is_a_no_op() {
        let mut session = InterpretationSession::new();
        let interpreter = Scripted::new(vec![]);
        assert!(interpret_result(&mut session, &interpreter, None, "q").is_none());
        assert_eq!(session.state(), &Lifecycle::Idle);
        assert!(interpreter.seen.borrow().is_empty());
    }

    #[test]
    fn successful_trigger_lands_in_success() {
        let mut session = InterpretationSession::new();
        let interpreter = Scripted::new(vec![Ok("Crew friendliness stands out.".into())]);
        let result = AnalyticsResult::default();

        let trigger = interpret_result(&mut session, &interpreter, Some(&result), "crew").unwrap();
        assert_eq!(trigger.resolution, Resolution::Applied);
        assert_eq!(session.state().text(), Some("Crew friendliness stands out."));
        assert_eq!(interpreter.seen.borrow()[0].query, "crew");
    }

    #[test]
    fn retry_after_error_replaces_message() {
        let mut session = InterpretationSession::new();
        let interpreter = Scripted::new(vec![
            Err(InterpretError::Api {
                status: 503,
                body: "busy".into(),
            }),
            Ok("Second time lucky.".into()),
        ]);
        let result = AnalyticsResult::default();

        interpret_result(&mut session, &interpreter, Some(&result), "q");
        assert_eq!(session.state().error(), Some("API error: 503 - busy"));

        let retry = interpret_result(&mut session, &interpreter, Some(&result), "q").unwrap();
        assert_eq!(retry.token.id(), 2);
        assert_eq!(session.state().text(), Some("Second time lucky."));
    }
}
