pub mod reservation;
pub mod repository;
pub mod identity;
pub mod clock;
pub mod memory;

pub use reservation::{Reservation, ReservationStatus, StayDates};
pub use repository::{CatalogReader, ReservationFilter, ReservationStore};
pub use identity::{AccessControl, StaticAccessControl};
pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::{InMemoryCatalog, InMemoryReservationStore};

use rokadan_catalog::CartError;
use rokadan_shared::{CabinId, ReservationId, ServiceId};

/// Every way a reservation operation can be refused.
///
/// None of these are fatal; each one is meant to be reported back to the
/// caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid occupancy: {0}")]
    InvalidOccupancy(String),

    #[error("Cabin {cabin_id} is not available for the requested dates")]
    CabinUnavailable { cabin_id: CabinId },

    #[error("Reservation {id} is {status} and can no longer be edited")]
    ReservationLocked {
        id: ReservationId,
        status: ReservationStatus,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    #[error("Service already selected: {0}")]
    DuplicateItem(ServiceId),

    #[error("Storage error: {0}")]
    Io(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wrap a collaborator failure; it is passed through without retry
    pub fn io<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Io(err.into())
    }
}

impl From<CartError> for BookingError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::DuplicateItem(id) => BookingError::DuplicateItem(id),
            CartError::NotFound(id) => BookingError::not_found("Cart item", id),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_errors_convert() {
        let id = ServiceId::new();
        let err: BookingError = CartError::DuplicateItem(id).into();
        assert!(matches!(err, BookingError::DuplicateItem(got) if got == id));

        let err: BookingError = CartError::NotFound(id).into();
        assert!(matches!(err, BookingError::NotFound { entity: "Cart item", .. }));
    }

    #[test]
    fn test_io_keeps_source_message() {
        let err = BookingError::io("connection reset");
        assert_eq!(err.to_string(), "Storage error: connection reset");
    }
}
