pub mod ids;
pub mod models;

pub use ids::{CabinId, ReservationId, ServiceId, UserId};
pub use models::{ChangeKind, ReservationChange};
