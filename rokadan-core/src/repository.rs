use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rokadan_catalog::{Cabin, Service};
use rokadan_shared::{CabinId, ReservationChange, ReservationId, ServiceId, UserId};

use crate::reservation::{Reservation, ReservationStatus};
use crate::BookingResult;

/// Read access to the cabin and service catalog
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// `NotFound` when the cabin does not exist
    async fn get_cabin(&self, id: CabinId) -> BookingResult<Cabin>;

    /// `NotFound` when the service does not exist
    async fn get_service(&self, id: ServiceId) -> BookingResult<Service>;

    async fn list_cabins(&self) -> BookingResult<Vec<Cabin>>;
}

/// Admin listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub cabin_id: Option<CabinId>,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.status.map_or(true, |s| reservation.status == s)
            && self.cabin_id.map_or(true, |c| reservation.cabin_id == c)
    }
}

/// Persistence boundary for reservations.
///
/// `insert` and `update` are conditional writes: when the written reservation
/// is active, the store re-checks it against the other active reservations of
/// the same cabin inside its own critical section and fails with
/// `CabinUnavailable` instead of writing an overlap. Listings are newest first.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn find_by_cabin_and_status(
        &self,
        cabin_id: CabinId,
        statuses: &[ReservationStatus],
    ) -> BookingResult<Vec<Reservation>>;

    /// `NotFound` when absent
    async fn find_by_id(&self, id: ReservationId) -> BookingResult<Reservation>;

    async fn find_by_owner(&self, owner_id: UserId) -> BookingResult<Vec<Reservation>>;

    async fn list(&self, filter: &ReservationFilter) -> BookingResult<Vec<Reservation>>;

    async fn insert(&self, reservation: Reservation) -> BookingResult<Reservation>;

    /// `NotFound` when the reservation was never inserted
    async fn update(&self, reservation: Reservation) -> BookingResult<Reservation>;

    async fn append_change(&self, change: ReservationChange) -> BookingResult<()>;

    /// Audit trail of one reservation, oldest first
    async fn changes_for(&self, id: ReservationId) -> BookingResult<Vec<ReservationChange>>;
}
