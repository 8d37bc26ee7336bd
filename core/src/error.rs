//! Error types for the console core.
//!
//! # Design
//! Every failed backend call surfaces as a single `FetchError` whose display
//! text is the fixed message for the operation ("Failed to fetch clients",
//! ...). Network failures, non-2xx statuses and malformed bodies are not
//! distinguished in that message; the underlying `FetchFailure` is kept as the
//! error source so it can be logged.

use std::fmt;

use thiserror::Error;

use crate::transport::TransportError;

/// Backend operation a request belongs to. Displays as the user-facing
/// failure message for that operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchClients,
    CreateClient,
    UpdateClient,
    DeleteClient,
    FetchDeliveries,
    CreateDelivery,
    Login,
    Register,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::FetchClients => "Failed to fetch clients",
            Operation::CreateClient => "Failed to create client",
            Operation::UpdateClient => "Failed to update client",
            Operation::DeleteClient => "Failed to delete client",
            Operation::FetchDeliveries => "Failed to fetch deliveries",
            Operation::CreateDelivery => "Failed to create delivery",
            Operation::Login => "Failed to log in",
            Operation::Register => "Failed to register",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

/// Why a backend call failed. Only used for diagnostics.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("unexpected HTTP status {status}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("response body could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("request body could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A failed backend call.
#[derive(Debug, Error)]
#[error("{operation}")]
pub struct FetchError {
    operation: Operation,
    #[source]
    failure: FetchFailure,
}

impl FetchError {
    pub fn new(operation: Operation, failure: impl Into<FetchFailure>) -> Self {
        Self {
            operation,
            failure: failure.into(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn failure(&self) -> &FetchFailure {
        &self.failure
    }

    /// The HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match &self.failure {
            FetchFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Outcome of a rejected controller call.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Another operation on the same controller is still in flight.
    #[error("another request is already in progress")]
    Busy,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ControllerError {
    /// Operation of the failed backend call, if the call reached the backend.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            ControllerError::Busy => None,
            ControllerError::Fetch(err) => Some(err.operation()),
        }
    }
}
