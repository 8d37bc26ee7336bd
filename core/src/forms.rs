//! Editable drafts behind the create/edit dialogs.
//!
//! # Design
//! Forms hold raw user input as strings, validate it into a typed draft, and
//! hand the draft to the owning controller. They never build requests
//! themselves. Validation failures are returned before anything reaches the
//! network.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::auth::AuthController;
use crate::controller::{ClientsController, DeliveriesController};
use crate::error::{ControllerError, FetchError};
use crate::transport::Transport;
use crate::types::{
    Client, ClientDraft, Credentials, Delivery, DeliveryDraft, DeliveryStatus, GpsPosition, RecordId,
};

/// Input that cannot be submitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be a decimal number, got {input:?}")]
    InvalidCoordinate { field: &'static str, input: String },

    #[error("{field} must be between -{limit} and {limit}")]
    CoordinateOutOfRange { field: &'static str, limit: f64 },

    #[error("latitude and longitude must be given together")]
    IncompletePosition,

    #[error("date must be a calendar date (YYYY-MM-DD), got {0:?}")]
    InvalidDate(String),

    #[error("select at least one client")]
    NoClientsSelected,

    #[error("client {0} is not in the client list")]
    UnknownClient(RecordId),

    #[error("email must be a valid address")]
    InvalidEmail,

    #[error("Passwords do not match.")]
    PasswordMismatch,
}

/// Why a form submission did not go through.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Rejected(#[from] ControllerError),
}

impl From<FetchError> for SubmitError {
    fn from(err: FetchError) -> Self {
        SubmitError::Rejected(err.into())
    }
}

/// The first of `fields`, in form order, that broke `rule`.
fn first_broken(errors: &ValidationErrors, fields: &[&'static str], rule: &str) -> Option<&'static str> {
    let failed = errors.field_errors();
    fields.iter().copied().find(|field| {
        failed
            .get(*field)
            .is_some_and(|errs| errs.iter().any(|e| e.code == rule))
    })
}

/// Trimmed text fields of a [`ClientForm`].
#[derive(Validate)]
struct ClientFields {
    #[validate(length(min = 1))]
    description: String,
    #[validate(length(min = 1))]
    address: String,
}

#[derive(Validate)]
struct Coordinates {
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
}

fn coordinate(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidCoordinate {
        field,
        input: input.to_string(),
    };
    let value: f64 = input.trim().parse().map_err(|_| invalid())?;
    // "NaN" and "inf" parse as f64 but are not coordinates.
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

fn position(latitude: &str, longitude: &str) -> Result<GpsPosition, ValidationError> {
    let coordinates = Coordinates {
        latitude: coordinate("latitude", latitude)?,
        longitude: coordinate("longitude", longitude)?,
    };
    coordinates.validate().map_err(|errors| {
        match first_broken(&errors, &["latitude", "longitude"], "range") {
            Some("latitude") => ValidationError::CoordinateOutOfRange {
                field: "latitude",
                limit: 90.0,
            },
            _ => ValidationError::CoordinateOutOfRange {
                field: "longitude",
                limit: 180.0,
            },
        }
    })?;
    Ok(GpsPosition {
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
    })
}

/// Trimmed fields of a [`RegisterForm`].
#[derive(Validate)]
struct Registration {
    #[validate(length(min = 1), email)]
    email: String,
    #[validate(length(min = 1), must_match(other = "confirm_password"))]
    password: String,
    confirm_password: String,
}

impl Registration {
    fn check(&self) -> Result<(), ValidationError> {
        self.validate().map_err(|errors| {
            if let Some(field) = first_broken(&errors, &["email", "password"], "length") {
                ValidationError::MissingField(field)
            } else if first_broken(&errors, &["email"], "email").is_some() {
                ValidationError::InvalidEmail
            } else {
                ValidationError::PasswordMismatch
            }
        })
    }
}

/// Whether a client form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Create,
    Edit(RecordId),
}

/// Draft state of the add/edit client dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientForm {
    mode: FormMode,
    pub description: String,
    pub address: String,
    /// Decimal degrees as typed; blank together with `longitude` means no
    /// position.
    pub latitude: String,
    pub longitude: String,
}

impl ClientForm {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn edit(client: &Client) -> Self {
        let mut form = Self {
            mode: FormMode::Edit(client.id),
            description: client.description.clone(),
            address: client.address.clone(),
            ..Self::default()
        };
        if let Some(position) = client.gps_position {
            form.set_position(position);
        }
        form
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn set_position(&mut self, position: GpsPosition) {
        self.latitude = position.latitude.to_string();
        self.longitude = position.longitude.to_string();
    }

    pub fn clear_position(&mut self) {
        self.latitude.clear();
        self.longitude.clear();
    }

    pub fn validate(&self) -> Result<ClientDraft, ValidationError> {
        let fields = ClientFields {
            description: self.description.trim().to_string(),
            address: self.address.trim().to_string(),
        };
        fields.validate().map_err(|errors| {
            let field = first_broken(&errors, &["description", "address"], "length");
            ValidationError::MissingField(field.unwrap_or("description"))
        })?;
        let gps_position = match (self.latitude.trim().is_empty(), self.longitude.trim().is_empty()) {
            (true, true) => None,
            (false, false) => Some(position(&self.latitude, &self.longitude)?),
            _ => return Err(ValidationError::IncompletePosition),
        };
        Ok(ClientDraft {
            description: fields.description,
            address: fields.address,
            gps_position,
        })
    }

    /// Validate and hand the draft to `clients`: a create in
    /// [`FormMode::Create`], an update of the edited id otherwise.
    pub fn submit<T: Transport>(&self, clients: &ClientsController<T>) -> Result<Client, SubmitError> {
        let draft = self.validate().inspect_err(|e| debug!(error = %e, "client form rejected"))?;
        let client = match self.mode {
            FormMode::Create => clients.submit_create(&draft)?,
            FormMode::Edit(id) => clients.submit_update(id, &draft)?,
        };
        Ok(client)
    }
}

/// Draft state of the new-delivery dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryForm {
    /// Calendar date as typed, `YYYY-MM-DD`.
    pub date: String,
    pub status: DeliveryStatus,
    selected: Vec<RecordId>,
    options: Vec<Client>,
}

impl DeliveryForm {
    /// Open the form over a fixed list of selectable clients.
    pub fn open(options: Vec<Client>) -> Self {
        Self {
            date: String::new(),
            status: DeliveryStatus::Pending,
            selected: Vec::new(),
            options,
        }
    }

    /// Open the form over the clients currently held by `clients`.
    pub fn open_from<T: Transport>(clients: &ClientsController<T>) -> Self {
        Self::open(clients.items())
    }

    /// Refresh `clients` and open the form over the fresh list.
    pub fn open_fresh<T: Transport>(clients: &ClientsController<T>) -> Result<Self, ControllerError> {
        clients.refresh()?;
        Ok(Self::open_from(clients))
    }

    pub fn options(&self) -> &[Client] {
        &self.options
    }

    pub fn selected(&self) -> &[RecordId] {
        &self.selected
    }

    /// Replace the selection. Order and duplicates are kept.
    pub fn select_clients(&mut self, ids: impl IntoIterator<Item = RecordId>) {
        self.selected = ids.into_iter().collect();
    }

    /// Add `id` to the selection, or remove every occurrence of it.
    pub fn toggle_client(&mut self, id: RecordId) {
        if self.selected.contains(&id) {
            self.selected.retain(|selected| *selected != id);
        } else {
            self.selected.push(id);
        }
    }

    pub fn validate(&self) -> Result<DeliveryDraft, ValidationError> {
        let date = self.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingField("date"));
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(self.date.clone()))?;
        if self.selected.is_empty() {
            return Err(ValidationError::NoClientsSelected);
        }
        if let Some(unknown) = self
            .selected
            .iter()
            .find(|id| !self.options.iter().any(|client| client.id == **id))
        {
            return Err(ValidationError::UnknownClient(*unknown));
        }
        Ok(DeliveryDraft::new(date, self.status, self.selected.iter().copied()))
    }

    pub fn submit<T: Transport>(
        &self,
        deliveries: &DeliveriesController<T>,
    ) -> Result<Delivery, SubmitError> {
        let draft = self.validate().inspect_err(|e| debug!(error = %e, "delivery form rejected"))?;
        Ok(deliveries.submit_create(&draft)?)
    }
}

/// Draft state of the registration screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// True when both password fields are filled in and differ; drives the
    /// inline mismatch hint.
    pub fn shows_mismatch(&self) -> bool {
        !self.password.is_empty()
            && !self.confirm_password.is_empty()
            && self.password != self.confirm_password
    }

    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        let registration = Registration {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        };
        registration.check()?;
        Ok(Credentials {
            email: registration.email,
            password: registration.password,
        })
    }

    /// Register and, on success, clear every field.
    pub fn submit<T: Transport>(&mut self, auth: &AuthController<T>) -> Result<(), SubmitError> {
        let credentials = self.validate()?;
        auth.register(&credentials)?;
        *self = Self::default();
        Ok(())
    }
}
