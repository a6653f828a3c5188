//! Scripted transport shared by the integration-style tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hub_api::{Error, HttpRequest, HttpResponse, Result, Transport, Value};

/// Replays queued responses in order, then repeats the fallback response.
/// Every request is recorded.
#[derive(Default)]
pub struct StubTransport {
    queued: Mutex<VecDeque<HttpResponse>>,
    fallback: Mutex<Option<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: HttpResponse) -> &Self {
        self.queued.lock().unwrap().push_back(response);
        self
    }

    pub fn always(&self, response: HttpResponse) -> &Self {
        *self.fallback.lock().unwrap() = Some(response);
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.sent().into_iter().map(|request| request.url).collect()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.sent.lock().unwrap().push(request.clone());
        if let Some(response) = self.queued.lock().unwrap().pop_front() {
            return Ok(response);
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Transport(format!("no scripted response for {}", request.url)))
    }
}

/// JSON response with the given status.
pub fn json(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status)
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_body(body.to_string())
}

/// Query parameter `name` of a sent request.
pub fn query(request: &HttpRequest, name: &str) -> Option<String> {
    hub_api::pagination::query_param(&request.url, name)
}
