pub mod availability;
pub mod lifecycle;
pub mod changes;
pub mod service;

pub use availability::AvailabilityChecker;
pub use lifecycle::{Actor, ReservationLifecycle};
pub use changes::ReservationChanges;
pub use service::{NewReservation, ReservationService, ServiceSelection};
