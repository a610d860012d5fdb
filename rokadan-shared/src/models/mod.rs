pub mod events;

pub use events::{ChangeKind, ReservationChange};
