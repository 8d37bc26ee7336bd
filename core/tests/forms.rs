//! Form submission and auth flows against scripted backends.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{api, ScriptedTransport};
use console_core::{
    ApiClient, AuthController, ClientForm, ClientsController, Credentials, DeliveriesController,
    DeliveryForm, DeliveryStatus, FileStore, RegisterForm, Session, SubmitError, Transport,
    ValidationError,
};
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;

#[test]
fn invalid_coordinates_never_reach_the_network() {
    let transport = ScriptedTransport::new();
    let clients = ClientsController::new(api(), Arc::clone(&transport));
    let mut form = ClientForm::create();
    form.description = "Acme".to_string();
    form.address = "1 Main St".to_string();
    form.latitude = "12,5".to_string();
    form.longitude = "3".to_string();

    let err = form.submit(&clients).unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Invalid(ValidationError::InvalidCoordinate { field: "latitude", .. })
    ));
    assert!(transport.requests().is_empty());
    assert_eq!(clients.error(), None);
}

#[test]
fn create_form_posts_and_edit_form_puts() {
    let transport = ScriptedTransport::new();
    let clients = ClientsController::new(api(), Arc::clone(&transport));

    let mut form = ClientForm::create();
    form.description = "Acme".to_string();
    form.address = "1 Main St".to_string();
    transport.respond(201, json!({"id": 7, "description": "Acme", "address": "1 Main St"}));
    let created = form.submit(&clients).unwrap();
    assert_eq!(created.id, 7);
    assert_eq!(transport.last_request().url, "http://localhost:8080/api/clients");

    let mut form = ClientForm::edit(&created);
    form.latitude = "10".to_string();
    form.longitude = "20".to_string();
    transport.respond(
        200,
        json!({"id": 7, "description": "Acme", "address": "1 Main St",
               "gpsPosition": {"latitude": 10.0, "longitude": 20.0}}),
    );
    let updated = form.submit(&clients).unwrap();
    assert_eq!(updated.gps_position.unwrap().latitude, 10.0);
    assert_eq!(transport.last_request().url, "http://localhost:8080/api/clients/7");
    assert_eq!(clients.items(), vec![updated]);
}

#[test]
fn rejected_submission_surfaces_the_controller_error() {
    let transport = ScriptedTransport::new();
    let clients = ClientsController::new(api(), Arc::clone(&transport));
    let mut form = ClientForm::create();
    form.description = "Acme".to_string();
    form.address = "1 Main St".to_string();

    transport.respond(500, json!(null));
    let err = form.submit(&clients).unwrap_err();

    assert_eq!(err.to_string(), "Failed to create client");
    assert_eq!(clients.error().as_deref(), Some("Failed to create client"));
}

#[test]
fn delivery_form_opens_over_a_fresh_client_list() {
    let transport = ScriptedTransport::new();
    let clients = ClientsController::new(api(), Arc::clone(&transport));
    let deliveries = DeliveriesController::new(api(), Arc::clone(&transport));

    transport.respond(200, json!([{"id": 3, "description": "Acme", "address": "1 Main St"}]));
    let mut form = DeliveryForm::open_fresh(&clients).unwrap();
    assert_eq!(form.options().len(), 1);

    form.date = "2024-05-01".to_string();
    form.status = DeliveryStatus::InProgress;
    form.select_clients([3, 3]);
    transport.respond(
        201,
        json!({"id": 1, "date": "2024-05-01", "status": "IN_PROGRESS",
               "details": [{"clientId": 3}, {"clientId": 3}]}),
    );
    let delivery = form.submit(&deliveries).unwrap();

    assert_eq!(delivery.details.len(), 2);
    assert_eq!(deliveries.items(), vec![delivery]);
}

#[test]
fn delivery_form_open_fails_with_the_fetch_message() {
    let transport = ScriptedTransport::new();
    let clients = ClientsController::new(api(), Arc::clone(&transport));

    transport.fail("connection reset");
    let err = DeliveryForm::open_fresh(&clients).unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch clients");
}

#[test]
fn login_stores_the_token_for_later_requests() {
    let transport = ScriptedTransport::new();
    let auth = AuthController::new(api(), Arc::clone(&transport));
    let clients = ClientsController::new(auth_api(&auth), Arc::clone(&transport));
    let credentials = Credentials {
        email: "ops@example.com".to_string(),
        password: "hunter2".to_string(),
    };

    transport.respond(200, json!({"token": "t-123"}));
    auth.login(&credentials).unwrap();
    assert_eq!(auth.session().get_token().as_deref(), Some("t-123"));

    transport.respond(200, json!([]));
    clients.refresh().unwrap();
    assert_eq!(transport.last_request().header("authorization"), Some("Bearer t-123"));

    auth.logout();
    transport.respond(401, json!(null));
    clients.refresh().unwrap_err();
    assert_eq!(transport.last_request().header("authorization"), None);
}

#[test]
fn failed_login_keeps_the_existing_token() {
    let transport = ScriptedTransport::new();
    let auth = AuthController::new(api(), Arc::clone(&transport));
    auth.session().set_token("old");

    transport.respond(401, json!(null));
    let err = auth
        .login(&Credentials {
            email: "ops@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to log in");
    assert_eq!(auth.session().get_token().as_deref(), Some("old"));
}

#[test]
fn login_recovers_from_a_corrupt_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{truncated").unwrap();
    let transport = ScriptedTransport::new();
    let api = ApiClient::new(common::BASE_URL, Session::new(FileStore::new(&path)));
    let auth = AuthController::new(api, Arc::clone(&transport));

    transport.respond(200, json!({"token": "abc"}));
    auth.login(&Credentials {
        email: "ops@example.com".to_string(),
        password: "hunter2".to_string(),
    })
    .unwrap();

    assert!(auth.session().is_authenticated());
    let reopened = Session::new(FileStore::new(&path));
    assert_eq!(reopened.get_token().as_deref(), Some("abc"));
}

#[test]
fn register_form_clears_after_success() {
    let transport = ScriptedTransport::new();
    let auth = AuthController::new(api(), Arc::clone(&transport));
    let mut form = RegisterForm {
        email: "ops@example.com".to_string(),
        password: "hunter2".to_string(),
        confirm_password: "hunter2".to_string(),
    };

    transport.respond(201, json!(null));
    form.submit(&auth).unwrap();

    assert_eq!(form, RegisterForm::default());
    assert_eq!(transport.last_request().url, "http://localhost:8080/api/auth/register");
}

#[test]
fn register_form_keeps_input_after_failure() {
    let transport = ScriptedTransport::new();
    let auth = AuthController::new(api(), Arc::clone(&transport));
    let mut form = RegisterForm {
        email: "ops@example.com".to_string(),
        password: "hunter2".to_string(),
        confirm_password: "hunter2".to_string(),
    };

    transport.respond(409, json!(null));
    let err = form.submit(&auth).unwrap_err();

    assert_eq!(err.to_string(), "Failed to register");
    assert_eq!(form.email, "ops@example.com");
}

/// A client sharing the auth controller's session.
fn auth_api<T: Transport>(auth: &AuthController<T>) -> ApiClient {
    ApiClient::new(common::BASE_URL, auth.session().clone())
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn auth_logs_never_carry_the_email() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let transport = ScriptedTransport::new();
    let auth = AuthController::new(api(), Arc::clone(&transport));
    let credentials = Credentials {
        email: "ops@example.com".to_string(),
        password: "hunter2".to_string(),
    };

    tracing::subscriber::with_default(subscriber, || {
        transport.respond(201, json!(null));
        auth.register(&credentials).unwrap();
        transport.respond(200, json!({"token": "t-1"}));
        auth.login(&credentials).unwrap();
    });

    let output = logs.contents();
    assert!(output.contains("registered"));
    assert!(output.contains("logged in"));
    assert!(!output.contains("ops@example.com"));
}
