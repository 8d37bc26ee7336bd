//! Login, registration and logout.
//!
//! The backend issues tokens; this controller only forwards credentials and
//! writes whatever token comes back into the [`Session`].

use tracing::{error, info};

use crate::client::ApiClient;
use crate::error::{FetchError, Operation};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::Transport;
use crate::types::Credentials;

pub struct AuthController<T> {
    api: ApiClient,
    transport: T,
}

impl<T: Transport> AuthController<T> {
    pub fn new(api: ApiClient, transport: T) -> Self {
        Self { api, transport }
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    /// Exchange credentials for a token and store it. A failed login leaves
    /// any existing token in place.
    pub fn login(&self, credentials: &Credentials) -> Result<(), FetchError> {
        let outcome = self
            .api
            .build_login(credentials)
            .and_then(|request| self.send(Operation::Login, request))
            .and_then(|response| self.api.parse_login(response));
        match outcome {
            Ok(login) => {
                self.session().set_token(&login.token);
                info!("logged in");
                Ok(())
            }
            Err(err) => Err(log_failure(err)),
        }
    }

    pub fn register(&self, credentials: &Credentials) -> Result<(), FetchError> {
        let outcome = self
            .api
            .build_register(credentials)
            .and_then(|request| self.send(Operation::Register, request))
            .and_then(|response| self.api.parse_register(response));
        match outcome {
            Ok(()) => {
                info!("registered");
                Ok(())
            }
            Err(err) => Err(log_failure(err)),
        }
    }

    pub fn logout(&self) {
        self.session().clear_token();
        info!("logged out");
    }

    fn send(&self, operation: Operation, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.transport
            .execute(request)
            .map_err(|e| FetchError::new(operation, e))
    }
}

fn log_failure(err: FetchError) -> FetchError {
    error!(operation = ?err.operation(), detail = %err.failure(), "{err}");
    err
}
