//! Scripted transports for driving controllers without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};

use console_core::{ApiClient, HttpRequest, HttpResponse, Session, Transport, TransportError};

pub const BASE_URL: &str = "http://localhost:8080/api";

pub fn api() -> ApiClient {
    ApiClient::new(BASE_URL, Session::in_memory())
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: serde_json::Value) {
        let body = if body.is_null() {
            String::new()
        } else {
            body.to_string()
        };
        self.push(Ok(HttpResponse::new(status, body)));
    }

    pub fn respond_raw(&self, status: u16, body: &str) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, reason: &str) {
        self.push(Err(TransportError::Io(reason.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }

    fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }
}

/// Holds every request until the test releases a response for it.
pub struct GateTransport {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<HttpResponse>>,
}

impl GateTransport {
    /// Returns the transport, a receiver signalled when a request arrives,
    /// and a sender that releases it with the given response.
    pub fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<HttpResponse>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let transport = Self {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (transport, entered_rx, release_tx)
    }
}

impl Transport for GateTransport {
    fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release
            .lock()
            .unwrap()
            .recv()
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
