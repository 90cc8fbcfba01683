//! Local JSON API for flightlens.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) exposing the
//! visualization selector and the interpretation session to a frontend.
//! The server owns exactly one [`InterpretationSession`]. Requests are
//! handled sequentially, so the session needs no locking; interpretation
//! calls run on worker threads and report back over a channel.
//!
//! Launched via `flightlens serve` (default: `http://127.0.0.1:9757`).

mod api;

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::Value;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::config::{self, FlightlensConfig, schema::LoggingConfig};
use crate::events::{self, InterpretEvent};
use crate::interpret::{
    InterpretClient, InterpretError, InterpretationSession, Interpreter, RequestToken, Resolution,
    Trigger,
};
use crate::model::AnalyticsResult;
use crate::shaper::{RequestSummary, build_interpretation_request};

/// How long the server waits for a request before settling finished calls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// A finished interpretation call, sent back by its worker.
struct Completion {
    token: RequestToken,
    outcome: Result<String, InterpretError>,
    latency_ms: u64,
}

/// What the event log needs about a call that has not finished yet.
struct InFlight {
    summary: RequestSummary,
    function: Option<String>,
}

/// Everything the handlers share across requests.
pub struct ApiState {
    session: InterpretationSession,
    interpreter: Arc<dyn Interpreter + Send + Sync>,
    logging: LoggingConfig,
    done_tx: Sender<Completion>,
    done_rx: Receiver<Completion>,
    in_flight: HashMap<RequestToken, InFlight>,
}

impl ApiState {
    pub fn new(interpreter: impl Interpreter + Send + Sync + 'static, logging: LoggingConfig) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            session: InterpretationSession::new(),
            interpreter: Arc::new(interpreter),
            logging,
            done_tx,
            done_rx,
            in_flight: HashMap::new(),
        }
    }

    pub fn from_config(config: &FlightlensConfig) -> Self {
        Self::new(
            InterpretClient::from_config(&config.interpreter),
            config.logging.clone(),
        )
    }

    pub fn session(&self) -> &InterpretationSession {
        &self.session
    }

    /// Number of calls started but not yet settled.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Move the session to `Loading` and run the call on a worker thread.
    pub fn start_interpretation(&mut self, result: &AnalyticsResult, query: &str) -> RequestToken {
        let request = build_interpretation_request(result, query);
        let token = self.session.begin();
        self.in_flight.insert(
            token,
            InFlight {
                summary: request.summary(result.mode),
                function: result.function_executed.clone(),
            },
        );

        let interpreter = Arc::clone(&self.interpreter);
        let done_tx = self.done_tx.clone();
        thread::spawn(move || {
            let start = Instant::now();
            let outcome = interpreter.interpret(&request);
            let latency_ms = start.elapsed().as_millis() as u64;
            // The receiver only goes away with the server.
            let _ = done_tx.send(Completion {
                token,
                outcome,
                latency_ms,
            });
        });

        token
    }

    /// Apply every call that has finished, without blocking.
    pub fn settle(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.done_rx.try_recv() {
            self.apply(done);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for the next call to finish and apply it.
    pub fn settle_next(&mut self, timeout: Duration) -> Option<Resolution> {
        if self.in_flight.is_empty() {
            return None;
        }
        match self.done_rx.recv_timeout(timeout) {
            Ok(done) => Some(self.apply(done)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn apply(&mut self, done: Completion) -> Resolution {
        let resolution = self.session.resolve(done.token, done.outcome);
        if let Some(call) = self.in_flight.remove(&done.token) {
            let trigger = Trigger {
                token: done.token,
                resolution,
                summary: call.summary,
                latency_ms: done.latency_ms,
            };
            let event =
                InterpretEvent::from_trigger(&trigger, self.session.state(), call.function.as_deref());
            events::log_event(&self.logging, &event);
        }
        resolution
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the API server on the given address.
///
/// Blocks the current thread. A failing request gets a 500 JSON body; the
/// server keeps running. Finished interpretation calls are applied between
/// requests.
pub fn serve(addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
    let mut state = ApiState::from_config(&config::load());

    println!("flightlens API running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    loop {
        let mut request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => request,
            Ok(None) => {
                state.settle();
                continue;
            }
            Err(e) => {
                eprintln!("flightlens: failed to receive request: {e}");
                continue;
            }
        };
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = dispatch(&mut state, &method, &url, body.as_deref())
            .unwrap_or_else(|e| Reply::error(500, &format!("{e:#}")));
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(state: &mut ApiState, method: &Method, url: &str, body: Option<&str>) -> Result<Reply> {
    let path = url.split('?').next().unwrap_or(url);
    state.settle();

    match (method, path) {
        (&Method::Post, "/api/visualize") => api::post_visualize(body.unwrap_or("{}")),
        (&Method::Post, "/api/interpret") => api::post_interpret(state, body.unwrap_or("{}")),
        (&Method::Get, "/api/interpretation") => api::get_interpretation(state),
        (&Method::Get, "/api/config") => api::get_config(),
        (&Method::Get, "/api/health") => api::get_health(state),
        _ => Ok(Reply::error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A JSON reply before it is written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }),
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let response = Response::from_data(self.body.to_string().into_bytes())
            .with_status_code(StatusCode(self.status));
        match Header::from_bytes("Content-Type", "application/json; charset=utf-8") {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
