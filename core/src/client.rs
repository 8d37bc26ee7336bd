//! Request builder and response parser for the console backend.
//!
//! # Design
//! `ApiClient` holds the base URL and the [`Session`] it reads the bearer
//! token from. Each operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`;
//! the caller runs the round trip through a
//! [`Transport`](crate::transport::Transport). Any 2xx status is success and
//! every other status fails with the operation's `FetchError`, without
//! looking at the body.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FetchError, FetchFailure, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{Client, ClientDraft, Credentials, Delivery, DeliveryDraft, LoginResponse, RecordId};

/// Builds requests for, and parses responses from, the console backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.session.get_token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        operation: Operation,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, FetchError> {
        let body = serde_json::to_string(body)
            .map_err(|e| FetchError::new(operation, FetchFailure::Encode(e)))?;
        Ok(self.request(method, path, Some(body)))
    }

    // --- clients ---

    pub fn build_list_clients(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/clients", None)
    }

    pub fn build_create_client(&self, draft: &ClientDraft) -> Result<HttpRequest, FetchError> {
        self.json_request(Operation::CreateClient, HttpMethod::Post, "/clients", draft)
    }

    pub fn build_update_client(
        &self,
        id: RecordId,
        draft: &ClientDraft,
    ) -> Result<HttpRequest, FetchError> {
        self.json_request(
            Operation::UpdateClient,
            HttpMethod::Put,
            &format!("/clients/{id}"),
            draft,
        )
    }

    pub fn build_delete_client(&self, id: RecordId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/clients/{id}"), None)
    }

    pub fn parse_list_clients(&self, response: HttpResponse) -> Result<Vec<Client>, FetchError> {
        decode(Operation::FetchClients, response)
    }

    pub fn parse_create_client(&self, response: HttpResponse) -> Result<Client, FetchError> {
        decode(Operation::CreateClient, response)
    }

    pub fn parse_update_client(&self, response: HttpResponse) -> Result<Client, FetchError> {
        decode(Operation::UpdateClient, response)
    }

    pub fn parse_delete_client(&self, response: HttpResponse) -> Result<(), FetchError> {
        check_status(Operation::DeleteClient, &response)
    }

    // --- deliveries ---

    pub fn build_list_deliveries(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/deliveries", None)
    }

    pub fn build_create_delivery(&self, draft: &DeliveryDraft) -> Result<HttpRequest, FetchError> {
        self.json_request(Operation::CreateDelivery, HttpMethod::Post, "/deliveries", draft)
    }

    pub fn parse_list_deliveries(&self, response: HttpResponse) -> Result<Vec<Delivery>, FetchError> {
        decode(Operation::FetchDeliveries, response)
    }

    pub fn parse_create_delivery(&self, response: HttpResponse) -> Result<Delivery, FetchError> {
        decode(Operation::CreateDelivery, response)
    }

    // --- auth ---

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, FetchError> {
        self.json_request(Operation::Login, HttpMethod::Post, "/auth/login", credentials)
    }

    pub fn build_register(&self, credentials: &Credentials) -> Result<HttpRequest, FetchError> {
        self.json_request(Operation::Register, HttpMethod::Post, "/auth/register", credentials)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, FetchError> {
        decode(Operation::Login, response)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<(), FetchError> {
        check_status(Operation::Register, &response)
    }
}

/// Map a non-2xx status to the operation's `FetchError`.
fn check_status(operation: Operation, response: &HttpResponse) -> Result<(), FetchError> {
    if response.is_success() {
        return Ok(());
    }
    Err(FetchError::new(
        operation,
        FetchFailure::Status {
            status: response.status,
            body: response.body.clone(),
        },
    ))
}

fn decode<T: DeserializeOwned>(operation: Operation, response: HttpResponse) -> Result<T, FetchError> {
    check_status(operation, &response)?;
    serde_json::from_str(&response.body).map_err(|e| FetchError::new(operation, FetchFailure::Decode(e)))
}
