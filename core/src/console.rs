//! Composition root: one session, one transport, every controller.

use std::sync::Arc;

use crate::auth::AuthController;
use crate::client::ApiClient;
use crate::config::ConsoleConfig;
use crate::controller::{refresh_with_clients, ClientsController, DeliveriesController};
use crate::error::ControllerError;
use crate::session::{FileStore, Session};
use crate::transport::{Transport, UreqTransport};

/// The console's controllers, sharing one [`Session`] and one transport.
pub struct Console<T = UreqTransport> {
    pub clients: ClientsController<Arc<T>>,
    pub deliveries: DeliveriesController<Arc<T>>,
    pub auth: AuthController<Arc<T>>,
}

impl Console<UreqTransport> {
    /// Console over HTTP, with the session persisted to `config.token_file`.
    pub fn from_config(config: &ConsoleConfig) -> Self {
        let session = Session::new(FileStore::new(&config.token_file));
        Self::new(ApiClient::new(&config.api_base_url, session), UreqTransport::new())
    }
}

impl<T: Transport> Console<T> {
    pub fn new(api: ApiClient, transport: T) -> Self {
        let transport = Arc::new(transport);
        Self {
            clients: ClientsController::new(api.clone(), Arc::clone(&transport)),
            deliveries: DeliveriesController::new(api.clone(), Arc::clone(&transport)),
            auth: AuthController::new(api, transport),
        }
    }

    pub fn session(&self) -> &Session {
        self.auth.session()
    }

    /// Load the delivery view: deliveries first, then the clients that label
    /// their stops.
    pub fn load_deliveries(&self) -> Result<(), ControllerError> {
        refresh_with_clients(&self.deliveries, &self.clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_reads_a_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig {
            api_base_url: "http://localhost:9000/api/".to_string(),
            token_file: dir.path().join("session.json"),
        };
        Session::new(FileStore::new(&config.token_file)).set_token("kept");

        let console = Console::from_config(&config);

        assert_eq!(console.clients.api().base_url(), "http://localhost:9000/api");
        assert_eq!(console.session().get_token().as_deref(), Some("kept"));
        console.auth.logout();
        assert!(!Session::new(FileStore::new(&config.token_file)).is_authenticated());
    }
}
