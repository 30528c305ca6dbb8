//! Domain errors and their HTTP mapping.

use seatlease_runtime::StoreError;
use seatlease_web::AppError;
use serde_json::json;
use thiserror::Error;

use crate::types::{BuyerId, EventName, Seat};

/// Errors reported synchronously by box office operations.
///
/// Nothing is mutated when one of these is returned: multi-seat requests are
/// validated in full before the first seat changes state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoxOfficeError {
    /// No event with this name
    #[error("Event {0} not found")]
    NotFound(EventName),

    /// An event with this name already exists
    #[error("Event {0} already exists")]
    AlreadyExists(EventName),

    /// Seat coordinate outside the event's grid
    #[error("Seat {0} is outside the seat grid")]
    InvalidSeat(Seat),

    /// Seat is not in a state that allows the operation
    #[error("Seat {0} is not available")]
    SeatUnavailable(Seat),

    /// Gated event and the buyer is not in the active set
    #[error("Buyer {0} has not been admitted")]
    NotAdmitted(BuyerId),

    /// Hold or purchase without any seat
    #[error("No seats requested")]
    NoSeatsRequested,

    /// Event definition cannot back a seat grid
    #[error("Invalid event definition: {0}")]
    InvalidDefinition(String),

    /// The event's coordinator is not accepting work
    #[error("Event unavailable: {0}")]
    Unavailable(#[from] StoreError),

    /// The catalog could not be consulted
    #[error("Catalog lookup failed: {0}")]
    Catalog(String),
}

impl BoxOfficeError {
    /// Stable machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidSeat(_) => "INVALID_SEAT",
            Self::SeatUnavailable(_) => "SEAT_UNAVAILABLE",
            Self::NotAdmitted(_) => "NOT_ADMITTED",
            Self::NoSeatsRequested => "NO_SEATS_REQUESTED",
            Self::InvalidDefinition(_) => "INVALID_DEFINITION",
            Self::Unavailable(_) => "EVENT_UNAVAILABLE",
            Self::Catalog(_) => "CATALOG_UNAVAILABLE",
        }
    }

    /// The seat a group request failed on, if any
    #[must_use]
    pub const fn seat(&self) -> Option<Seat> {
        match self {
            Self::InvalidSeat(seat) | Self::SeatUnavailable(seat) => Some(*seat),
            _ => None,
        }
    }
}

impl From<BoxOfficeError> for AppError {
    fn from(err: BoxOfficeError) -> Self {
        let code = err.code();
        let message = err.to_string();

        let app_error = match &err {
            BoxOfficeError::NotFound(name) => AppError::not_found("Event", name),
            BoxOfficeError::AlreadyExists(_) | BoxOfficeError::SeatUnavailable(_) => {
                AppError::conflict(message)
            },
            BoxOfficeError::InvalidSeat(_) | BoxOfficeError::NoSeatsRequested => {
                AppError::bad_request(message)
            },
            BoxOfficeError::NotAdmitted(_) => AppError::forbidden(message),
            BoxOfficeError::InvalidDefinition(_) => AppError::validation(message),
            BoxOfficeError::Unavailable(_) | BoxOfficeError::Catalog(_) => {
                AppError::unavailable(message).with_source(err.clone().into())
            },
        };

        let app_error = app_error.with_code(code);
        match err.seat() {
            Some(seat) => app_error.with_details(json!({ "row": seat.row, "col": seat.col })),
            None => app_error,
        }
    }
}
