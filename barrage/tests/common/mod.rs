//! In-process transport doubles shared by the integration tests.
#![allow(dead_code)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use barrage::{PreparedRequest, Transport, TransportError, TransportResponse};

/// What the scripted transport does for one request.
#[derive(Debug, Clone)]
pub enum Step {
    Respond { status: u16, after: Duration, body: u64 },
    Fail { after: Duration },
}

impl Step {
    pub fn ok_after(ms: u64) -> Self {
        Step::Respond {
            status: 200,
            after: Duration::from_millis(ms),
            body: 128,
        }
    }

    pub fn status_after(status: u16, ms: u64) -> Self {
        Step::Respond {
            status,
            after: Duration::from_millis(ms),
            body: 0,
        }
    }

    pub fn fail() -> Self {
        Step::Fail {
            after: Duration::ZERO,
        }
    }
}

pub struct ScriptedResponse {
    status: u16,
    body: u64,
}

impl TransportResponse for ScriptedResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn server_header(&self) -> Option<String> {
        Some("scripted".to_owned())
    }

    async fn body_len(self) -> Result<u64, TransportError> {
        Ok(self.body)
    }
}

/// Plays `steps` in dispatch order, wrapping around when exhausted.
pub struct ScriptedTransport {
    steps: Vec<Step>,
    next: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty());
        Self {
            steps,
            next: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    type Response = ScriptedResponse;

    async fn send(&self, _: PreparedRequest) -> Result<ScriptedResponse, TransportError> {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        match self.steps[i % self.steps.len()].clone() {
            Step::Respond {
                status,
                after,
                body,
            } => {
                tokio::time::sleep(after).await;
                Ok(ScriptedResponse { status, body })
            }
            Step::Fail { after } => {
                tokio::time::sleep(after).await;
                Err(TransportError::Other("connection reset by peer".to_owned()))
            }
        }
    }
}
