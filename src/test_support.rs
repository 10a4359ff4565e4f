//! In-memory transport for unit tests

use crate::error::{Error, Result};
use crate::http::{Transport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&TransportRequest) -> Result<TransportResponse> + Send + Sync>;

/// Transport answering from a script and recording every request it sees
pub(crate) struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    /// Answer requests in order from a fixed list
    pub(crate) fn sequence(outcomes: Vec<Result<TransportResponse>>) -> Self {
        let queue = Mutex::new(VecDeque::from(outcomes));
        Self::from_fn(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Other("script exhausted".to_string())))
        })
    }

    /// Answer requests with a closure
    pub(crate) fn from_fn(
        f: impl Fn(&TransportRequest) -> Result<TransportResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(f),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far
    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

/// A response with a JSON body
pub(crate) fn json(status: u16, body: serde_json::Value) -> Result<TransportResponse> {
    Ok(TransportResponse::new(status, body.to_string()))
}

/// A response with a text body
pub(crate) fn status(status: u16, body: &str) -> Result<TransportResponse> {
    Ok(TransportResponse::new(status, body.to_string()))
}

/// A response carrying a `Retry-After` header
pub(crate) fn with_retry_after(status: u16, seconds: &str) -> Result<TransportResponse> {
    let mut response = TransportResponse::new(status, String::new());
    response
        .headers
        .insert("retry-after", seconds.parse().unwrap());
    Ok(response)
}
