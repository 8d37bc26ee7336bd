//! View-state controllers for the client and delivery collections.
//!
//! # Design
//! `EntityController` owns one resource's in-memory collection, its loading
//! phase, the last error message and the editor selection. Every operation is
//! a single round trip through the controller's [`Transport`]; results are
//! reconciled into the collection only on success, so a failed call leaves the
//! items exactly as they were and records the operation's fixed message.
//!
//! A controller admits one operation at a time. A call made while another is
//! outstanding is rejected with [`ControllerError::Busy`] and changes nothing.
//!
//! The resource-specific parts (endpoints, record and draft types) come from
//! the [`Resource`] implementations [`Clients`] and [`Deliveries`]. Update and
//! delete exist only for clients.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{error, info, warn};

use crate::client::ApiClient;
use crate::error::{ControllerError, FetchError, Operation};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Client, ClientDraft, Delivery, DeliveryDraft, Identified, RecordId};

/// Label shown for a delivery stop whose client is not in the directory.
pub const UNKNOWN_CLIENT: &str = "Unknown Client";

/// A backend collection a controller can list and append to.
pub trait Resource {
    type Record: Identified + Clone;
    type Draft;

    /// Used in log fields.
    const NAME: &'static str;
    const LIST: Operation;
    const CREATE: Operation;

    fn build_list(api: &ApiClient) -> HttpRequest;
    fn parse_list(api: &ApiClient, response: HttpResponse) -> Result<Vec<Self::Record>, FetchError>;
    fn build_create(api: &ApiClient, draft: &Self::Draft) -> Result<HttpRequest, FetchError>;
    fn parse_create(api: &ApiClient, response: HttpResponse) -> Result<Self::Record, FetchError>;
}

/// The `/clients` collection.
#[derive(Debug)]
pub struct Clients;

impl Resource for Clients {
    type Record = Client;
    type Draft = ClientDraft;

    const NAME: &'static str = "clients";
    const LIST: Operation = Operation::FetchClients;
    const CREATE: Operation = Operation::CreateClient;

    fn build_list(api: &ApiClient) -> HttpRequest {
        api.build_list_clients()
    }

    fn parse_list(api: &ApiClient, response: HttpResponse) -> Result<Vec<Client>, FetchError> {
        api.parse_list_clients(response)
    }

    fn build_create(api: &ApiClient, draft: &ClientDraft) -> Result<HttpRequest, FetchError> {
        api.build_create_client(draft)
    }

    fn parse_create(api: &ApiClient, response: HttpResponse) -> Result<Client, FetchError> {
        api.parse_create_client(response)
    }
}

/// The `/deliveries` collection.
#[derive(Debug)]
pub struct Deliveries;

impl Resource for Deliveries {
    type Record = Delivery;
    type Draft = DeliveryDraft;

    const NAME: &'static str = "deliveries";
    const LIST: Operation = Operation::FetchDeliveries;
    const CREATE: Operation = Operation::CreateDelivery;

    fn build_list(api: &ApiClient) -> HttpRequest {
        api.build_list_deliveries()
    }

    fn parse_list(api: &ApiClient, response: HttpResponse) -> Result<Vec<Delivery>, FetchError> {
        api.parse_list_deliveries(response)
    }

    fn build_create(api: &ApiClient, draft: &DeliveryDraft) -> Result<HttpRequest, FetchError> {
        api.build_create_delivery(draft)
    }

    fn parse_create(api: &ApiClient, response: HttpResponse) -> Result<Delivery, FetchError> {
        api.parse_create_delivery(response)
    }
}

/// Loading phase of a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    Loading,
    /// The last operation finished; see [`View::error`] for its outcome.
    Ready,
}

/// Which editor, if any, is open over the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Editor {
    #[default]
    Closed,
    Creating,
    Editing(RecordId),
}

/// Snapshot of a controller's state, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct View<R> {
    pub phase: Phase,
    pub items: Vec<R>,
    pub error: Option<String>,
    pub editor: Editor,
}

impl<R> Default for View<R> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            items: Vec::new(),
            error: None,
            editor: Editor::Closed,
        }
    }
}

impl<R: Identified> View<R> {
    pub fn find(&self, id: RecordId) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Replace the record with the same id, or append it.
    fn upsert(&mut self, record: R) {
        match self.items.iter_mut().find(|item| item.id() == record.id()) {
            Some(slot) => *slot = record,
            None => self.items.push(record),
        }
    }
}

/// Clears the in-flight flag when the operation ends, even by panic.
struct Flight<'a>(&'a AtomicBool);

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State machine owning one resource's collection.
pub struct EntityController<R: Resource, T> {
    api: ApiClient,
    transport: T,
    view: Mutex<View<R::Record>>,
    in_flight: AtomicBool,
    _resource: PhantomData<fn() -> R>,
}

pub type ClientsController<T> = EntityController<Clients, T>;
pub type DeliveriesController<T> = EntityController<Deliveries, T>;

impl<R: Resource, T: Transport> EntityController<R, T> {
    pub fn new(api: ApiClient, transport: T) -> Self {
        Self {
            api,
            transport,
            view: Mutex::new(View::default()),
            in_flight: AtomicBool::new(false),
            _resource: PhantomData,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> View<R::Record> {
        self.view().clone()
    }

    pub fn items(&self) -> Vec<R::Record> {
        self.view().items.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.view().error.clone()
    }

    pub fn phase(&self) -> Phase {
        self.view().phase
    }

    pub fn editor(&self) -> Editor {
        self.view().editor
    }

    pub fn find(&self, id: RecordId) -> Option<R::Record> {
        self.view().find(id).cloned()
    }

    /// True while an operation is outstanding; submit controls should be
    /// disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn open_create(&self) {
        self.view().editor = Editor::Creating;
    }

    pub fn close_editor(&self) {
        self.view().editor = Editor::Closed;
    }

    /// Replace the collection with the server's current list.
    pub fn refresh(&self) -> Result<(), ControllerError> {
        let _flight = self.begin(R::LIST)?;
        let outcome = self
            .round_trip(R::LIST, R::build_list(&self.api))
            .and_then(|response| R::parse_list(&self.api, response));
        self.settle(R::LIST, outcome, |view, items| {
            view.items = items.clone();
        })?;
        Ok(())
    }

    /// Create a record from `draft` and append the server's copy. The editor
    /// closes on success and stays open on failure.
    pub fn submit_create(&self, draft: &R::Draft) -> Result<R::Record, ControllerError> {
        let _flight = self.begin(R::CREATE)?;
        let outcome = R::build_create(&self.api, draft)
            .and_then(|request| self.round_trip(R::CREATE, request))
            .and_then(|response| R::parse_create(&self.api, response));
        self.settle(R::CREATE, outcome, |view, record| {
            view.upsert(record.clone());
            view.editor = Editor::Closed;
        })
    }

    fn view(&self) -> MutexGuard<'_, View<R::Record>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, operation: Operation) -> Result<Flight<'_>, ControllerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(resource = R::NAME, ?operation, "rejected while another request is in flight");
            return Err(ControllerError::Busy);
        }
        let mut view = self.view();
        view.phase = Phase::Loading;
        view.error = None;
        Ok(Flight(&self.in_flight))
    }

    fn round_trip(&self, operation: Operation, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.transport
            .execute(request)
            .map_err(|e| FetchError::new(operation, e))
    }

    fn settle<V>(
        &self,
        operation: Operation,
        outcome: Result<V, FetchError>,
        apply: impl FnOnce(&mut View<R::Record>, &V),
    ) -> Result<V, ControllerError> {
        let mut view = self.view();
        view.phase = Phase::Ready;
        match outcome {
            Ok(value) => {
                apply(&mut *view, &value);
                view.error = None;
                info!(resource = R::NAME, ?operation, items = view.items.len(), "request succeeded");
                Ok(value)
            }
            Err(err) => {
                error!(resource = R::NAME, ?operation, detail = %err.failure(), "{err}");
                view.error = Some(err.to_string());
                Err(err.into())
            }
        }
    }
}

impl<T: Transport> EntityController<Clients, T> {
    /// Open the editor on an existing client. Returns false, leaving the
    /// editor unchanged, when no local record has that id.
    ///
    /// Deliveries cannot be edited:
    ///
    /// ```compile_fail
    /// use console_core::{ApiClient, DeliveriesController, Session, UreqTransport};
    ///
    /// let api = ApiClient::new("http://localhost:8080/api", Session::in_memory());
    /// let deliveries = DeliveriesController::new(api, UreqTransport::new());
    /// deliveries.open_edit(1);
    /// ```
    pub fn open_edit(&self, id: RecordId) -> bool {
        let mut view = self.view();
        if view.find(id).is_none() {
            return false;
        }
        view.editor = Editor::Editing(id);
        true
    }

    /// Replace the client `id` with `draft`. The local copy is swapped for the
    /// server's response by identity.
    pub fn submit_update(&self, id: RecordId, draft: &ClientDraft) -> Result<Client, ControllerError> {
        let operation = Operation::UpdateClient;
        let _flight = self.begin(operation)?;
        let outcome = self
            .api
            .build_update_client(id, draft)
            .and_then(|request| self.round_trip(operation, request))
            .and_then(|response| self.api.parse_update_client(response));
        self.settle(operation, outcome, |view, client| {
            view.upsert(client.clone());
            view.editor = Editor::Closed;
        })
    }

    /// Delete the client `id` and drop it from the collection.
    pub fn remove(&self, id: RecordId) -> Result<(), ControllerError> {
        let operation = Operation::DeleteClient;
        let _flight = self.begin(operation)?;
        let outcome = self
            .round_trip(operation, self.api.build_delete_client(id))
            .and_then(|response| self.api.parse_delete_client(response));
        self.settle(operation, outcome, |view, _| {
            view.items.retain(|client| client.id != id);
            if view.editor == Editor::Editing(id) {
                view.editor = Editor::Closed;
            }
        })
    }
}

/// Refresh the delivery list, then the client directory used to label its
/// stops. Stops at the first failure.
pub fn refresh_with_clients<T: Transport, U: Transport>(
    deliveries: &DeliveriesController<T>,
    clients: &ClientsController<U>,
) -> Result<(), ControllerError> {
    deliveries.refresh()?;
    clients.refresh()
}

/// Description of each stop's client, in stop order.
pub fn stop_descriptions<'a>(delivery: &Delivery, clients: &'a [Client]) -> Vec<&'a str> {
    delivery
        .details
        .iter()
        .map(|detail| {
            clients
                .iter()
                .find(|client| client.id == detail.client_id)
                .map_or(UNKNOWN_CLIENT, |client| client.description.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeliveryDetail, DeliveryStatus};

    fn client(id: RecordId, description: &str) -> Client {
        ClientDraft::new(description, "somewhere").into_client(id)
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut view = View {
            items: vec![client(1, "a"), client(2, "b")],
            ..View::default()
        };
        view.upsert(client(2, "changed"));
        view.upsert(client(3, "c"));
        let names: Vec<_> = view.items.iter().map(|c| c.description.as_str()).collect();
        assert_eq!(names, ["a", "changed", "c"]);
    }

    #[test]
    fn stops_fall_back_to_unknown_client() {
        let clients = [client(1, "Acme"), client(2, "Globex")];
        let delivery = Delivery {
            id: 1,
            date: "2024-05-01".to_string(),
            status: DeliveryStatus::Pending,
            details: vec![
                DeliveryDetail { client_id: 2 },
                DeliveryDetail { client_id: 9 },
                DeliveryDetail { client_id: 2 },
            ],
        };
        assert_eq!(
            stop_descriptions(&delivery, &clients),
            ["Globex", UNKNOWN_CLIENT, "Globex"]
        );
    }
}
