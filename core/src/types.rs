//! Wire DTOs for the console backend.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. Records carry
//! the server-assigned `id`, drafts never do.

use serde::{Deserialize, Serialize};

/// Server-assigned identifier shared by every resource.
pub type RecordId = i64;

/// Implemented by records the controllers reconcile by identity.
pub trait Identified {
    fn id(&self) -> RecordId;
}

/// Decimal-degree coordinates attached to a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// A client as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: RecordId,
    pub description: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_position: Option<GpsPosition>,
}

/// Request payload for creating or replacing a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub description: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_position: Option<GpsPosition>,
}

impl ClientDraft {
    pub fn new(description: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            address: address.into(),
            gps_position: None,
        }
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.gps_position = Some(GpsPosition {
            latitude,
            longitude,
        });
        self
    }

    /// Attach a server-assigned id, producing the record this draft describes.
    pub fn into_client(self, id: RecordId) -> Client {
        Client {
            id,
            description: self.description,
            address: self.address,
            gps_position: self.gps_position,
        }
    }
}

impl From<&Client> for ClientDraft {
    fn from(client: &Client) -> Self {
        Self {
            description: client.description.clone(),
            address: client.address.clone(),
            gps_position: client.gps_position,
        }
    }
}

impl Identified for Client {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Lifecycle of a delivery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    InProgress,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Pending,
        DeliveryStatus::InProgress,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
    ];

    /// Human-readable label for selection controls.
    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::InProgress => "In Progress",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
        }
    }
}

/// One stop of a delivery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetail {
    pub client_id: RecordId,
}

/// A delivery run as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: RecordId,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub status: DeliveryStatus,
    pub details: Vec<DeliveryDetail>,
}

/// Request payload for creating a delivery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDraft {
    pub date: String,
    pub status: DeliveryStatus,
    pub details: Vec<DeliveryDetail>,
}

impl DeliveryDraft {
    /// Build a draft whose stops follow `client_ids` in order, duplicates
    /// included.
    pub fn new(
        date: impl Into<String>,
        status: DeliveryStatus,
        client_ids: impl IntoIterator<Item = RecordId>,
    ) -> Self {
        Self {
            date: date.into(),
            status,
            details: client_ids
                .into_iter()
                .map(|client_id| DeliveryDetail { client_id })
                .collect(),
        }
    }
}

impl Identified for Delivery {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Login and registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
