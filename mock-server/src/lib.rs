//! In-memory stand-in for the console backend.
//!
//! Serves the REST surface the console consumes under `/api`: clients
//! (list, create, replace, delete), deliveries (list, create) and auth
//! (register, login). With [`Settings::require_auth`] set, the resource
//! routes reject requests without a bearer token issued by `/auth/login`.

pub mod config;
pub mod error;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub description: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_position: Option<GpsPosition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub description: String,
    pub address: String,
    #[serde(default)]
    pub gps_position: Option<GpsPosition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    InProgress,
    Delivered,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetail {
    pub client_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub date: String,
    pub status: DeliveryStatus,
    pub details: Vec<DeliveryDetail>,
}

#[derive(Deserialize)]
pub struct DeliveryInput {
    pub date: String,
    pub status: DeliveryStatus,
    pub details: Vec<DeliveryDetail>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Settings {
    /// Reject resource requests that lack a token issued by `/auth/login`.
    pub require_auth: bool,
}

#[derive(Default)]
struct Store {
    clients: BTreeMap<i64, Client>,
    deliveries: Vec<Delivery>,
    last_client_id: i64,
    last_delivery_id: i64,
    users: HashMap<String, String>,
    tokens: HashSet<String>,
}

type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    settings: Settings,
}

pub fn app() -> Router {
    app_with(Settings::default())
}

pub fn app_with(settings: Settings) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        settings,
    };
    let resources = Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{id}", put(update_client).delete(delete_client))
        .route("/deliveries", get(list_deliveries).post(create_delivery))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));
    let auth = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));
    Router::new()
        .nest("/api", resources.merge(auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener, settings: Settings) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(settings)).await
}

async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.settings.require_auth {
        return Ok(next.run(request).await);
    }
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);
    let known = match token {
        Some(token) => state.db.read().await.tokens.contains(&token),
        None => false,
    };
    if !known {
        warn!(uri = %request.uri(), "rejected unauthenticated request");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

// --- clients ---

async fn list_clients(State(state): State<AppState>) -> Json<Vec<Client>> {
    let store = state.db.read().await;
    Json(store.clients.values().cloned().collect())
}

async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    require_text("description", &input.description)?;
    require_text("address", &input.address)?;
    let mut store = state.db.write().await;
    store.last_client_id += 1;
    let client = Client {
        id: store.last_client_id,
        description: input.description,
        address: input.address,
        gps_position: input.gps_position,
    };
    store.clients.insert(client.id, client.clone());
    info!(id = client.id, "created client");
    Ok((StatusCode::CREATED, Json(client)))
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ClientInput>,
) -> Result<Json<Client>, AppError> {
    require_text("description", &input.description)?;
    require_text("address", &input.address)?;
    let mut store = state.db.write().await;
    let client = store.clients.get_mut(&id).ok_or(AppError::NotFound)?;
    client.description = input.description;
    client.address = input.address;
    client.gps_position = input.gps_position;
    info!(id, "updated client");
    Ok(Json(client.clone()))
}

async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut store = state.db.write().await;
    store.clients.remove(&id).ok_or(AppError::NotFound)?;
    info!(id, "deleted client");
    Ok(StatusCode::NO_CONTENT)
}

// --- deliveries ---

async fn list_deliveries(State(state): State<AppState>) -> Json<Vec<Delivery>> {
    let store = state.db.read().await;
    Json(store.deliveries.clone())
}

async fn create_delivery(
    State(state): State<AppState>,
    Json(input): Json<DeliveryInput>,
) -> Result<(StatusCode, Json<Delivery>), AppError> {
    require_text("date", &input.date)?;
    if input.details.is_empty() {
        return Err(AppError::Invalid("details must not be empty".to_string()));
    }
    let mut store = state.db.write().await;
    if let Some(detail) = input
        .details
        .iter()
        .find(|detail| !store.clients.contains_key(&detail.client_id))
    {
        return Err(AppError::Invalid(format!("unknown client {}", detail.client_id)));
    }
    store.last_delivery_id += 1;
    let delivery = Delivery {
        id: store.last_delivery_id,
        date: input.date,
        status: input.status,
        details: input.details,
    };
    store.deliveries.push(delivery.clone());
    info!(id = delivery.id, stops = delivery.details.len(), "created delivery");
    Ok((StatusCode::CREATED, Json(delivery)))
}

// --- auth ---

async fn register(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> Result<StatusCode, AppError> {
    require_text("email", &input.email)?;
    require_text("password", &input.password)?;
    let mut store = state.db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(AppError::UserExists);
    }
    info!(email = %input.email, "registered user");
    store.users.insert(input.email, input.password);
    Ok(StatusCode::CREATED)
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut store = state.db.write().await;
    if store.users.get(&input.email) != Some(&input.password) {
        return Err(AppError::InvalidCredentials);
    }
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone());
    info!(email = %input.email, "issued token");
    Ok(Json(TokenResponse { token }))
}
