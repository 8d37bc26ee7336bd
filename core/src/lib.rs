//! Data-access and view-state core for the delivery console.
//!
//! # Overview
//! Talks to the console backend's REST API (clients, deliveries, auth) and
//! keeps the in-memory state each console screen renders from.
//!
//! # Design
//! - `ApiClient` splits every operation into `build_*` (produces an
//!   `HttpRequest`) and `parse_*` (consumes an `HttpResponse`); a `Transport`
//!   runs the round trip in between, so every layer above it can be driven by
//!   a scripted transport in tests.
//! - The bearer token is read from an explicit `Session` handle given to the
//!   client at construction.
//! - `EntityController` owns one collection and reconciles results into it:
//!   full replace on refresh, append on create, replace-by-id on update,
//!   drop-by-id on delete. One operation per controller at a time.
//! - Forms validate raw input into drafts and delegate to the controllers.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod forms;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use auth::AuthController;
pub use client::ApiClient;
pub use config::{ConfigError, ConsoleConfig};
pub use console::Console;
pub use controller::{
    refresh_with_clients, stop_descriptions, Clients, ClientsController, Deliveries,
    DeliveriesController, Editor, EntityController, Phase, Resource, View, UNKNOWN_CLIENT,
};
pub use error::{ControllerError, FetchError, FetchFailure, Operation};
pub use forms::{ClientForm, DeliveryForm, FormMode, RegisterForm, SubmitError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{FileStore, MemoryStore, Session, TokenStore, TOKEN_KEY};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Client, ClientDraft, Credentials, Delivery, DeliveryDetail, DeliveryDraft, DeliveryStatus,
    GpsPosition, Identified, LoginResponse, RecordId,
};
