//! Shared helpers for client tests.

use futures::future::BoxFuture;
use reqflow::{Request, Response, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

/// What the mock transport does for one call.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Status(u16),
    Network,
    /// Never completes.
    Hang,
}

/// Scripted transport that records every call.
///
/// Successful responses carry the body `"call N"` (1-based), so tests can
/// tell which call produced a response.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
    delay: Duration,
}

struct MockState {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    seen: Mutex<Vec<Request>>,
}

impl MockTransport {
    /// Answers every call with 200.
    pub fn ok() -> Self {
        Self::scripted([], Outcome::Status(200))
    }

    /// Answers every call with `status`.
    pub fn status(status: u16) -> Self {
        Self::scripted([], Outcome::Status(status))
    }

    /// Plays `script` in order, then answers with `fallback`.
    pub fn scripted(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
        Self {
            state: Arc::new(MockState {
                script: Mutex::new(script.into_iter().collect()),
                fallback,
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }),
            delay: Duration::ZERO,
        }
    }

    /// Delays every call by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at once.
    pub fn max_active(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<Request> {
        self.state.seen.lock().unwrap().clone()
    }

    /// Targets received so far, in call order.
    pub fn targets(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.target().to_string())
            .collect()
    }
}

impl Service<Request> for MockTransport {
    type Response = Response;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<Response, TransportError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
        state.seen.lock().unwrap().push(request.clone());
        let outcome = state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(state.fallback);

        Box::pin(async move {
            let active = state.active.fetch_add(1, Ordering::SeqCst) + 1;
            state.max_active.fetch_max(active, Ordering::SeqCst);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = match outcome {
                Outcome::Status(status) => {
                    Ok(Response::new(&request, status).with_body(format!("call {}", call)))
                }
                Outcome::Network => Err(TransportError::Network("connection reset".into())),
                Outcome::Hang => futures::future::pending().await,
            };

            state.active.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// Lets spawned tasks run to completion under a paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
