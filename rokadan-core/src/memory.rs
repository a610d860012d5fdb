use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use rokadan_catalog::{Cabin, Service};
use rokadan_shared::{CabinId, ReservationChange, ReservationId, ServiceId, UserId};

use crate::repository::{CatalogReader, ReservationFilter, ReservationStore};
use crate::reservation::{Reservation, ReservationStatus};
use crate::{BookingError, BookingResult};

/// Catalog held in memory (tests, demos, seeding)
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    cabins: Vec<Cabin>,
    services: Vec<Service>,
}

impl InMemoryCatalog {
    pub fn new(cabins: Vec<Cabin>, services: Vec<Service>) -> Self {
        Self { cabins, services }
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn get_cabin(&self, id: CabinId) -> BookingResult<Cabin> {
        self.cabins.iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("Cabin", id))
    }

    async fn get_service(&self, id: ServiceId) -> BookingResult<Service> {
        self.services.iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("Service", id))
    }

    async fn list_cabins(&self) -> BookingResult<Vec<Cabin>> {
        Ok(self.cabins.clone())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    // insertion order == creation order
    reservations: Vec<Reservation>,
    changes: Vec<ReservationChange>,
}

/// Reservation store behind one mutex; the overlap re-check and the write
/// happen under the same guard.
#[derive(Debug, Default)]
pub struct InMemoryReservationStore {
    state: Mutex<StoreState>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> BookingResult<MutexGuard<'_, StoreState>> {
        self.state.lock()
            .map_err(|_| BookingError::io("reservation store lock poisoned"))
    }

    fn newest_first<'a>(iter: impl DoubleEndedIterator<Item = &'a Reservation>) -> Vec<Reservation> {
        let mut out: Vec<Reservation> = iter.rev().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

fn ensure_no_collision(state: &StoreState, candidate: &Reservation) -> BookingResult<()> {
    if state.reservations.iter().any(|r| candidate.collides_with(r)) {
        return Err(BookingError::CabinUnavailable { cabin_id: candidate.cabin_id });
    }
    Ok(())
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn find_by_cabin_and_status(
        &self,
        cabin_id: CabinId,
        statuses: &[ReservationStatus],
    ) -> BookingResult<Vec<Reservation>> {
        let state = self.lock()?;
        Ok(Self::newest_first(
            state.reservations.iter()
                .filter(|r| r.cabin_id == cabin_id && statuses.contains(&r.status)),
        ))
    }

    async fn find_by_id(&self, id: ReservationId) -> BookingResult<Reservation> {
        let state = self.lock()?;
        state.reservations.iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| BookingError::not_found("Reservation", id))
    }

    async fn find_by_owner(&self, owner_id: UserId) -> BookingResult<Vec<Reservation>> {
        let state = self.lock()?;
        Ok(Self::newest_first(
            state.reservations.iter().filter(|r| r.owner_id == owner_id),
        ))
    }

    async fn list(&self, filter: &ReservationFilter) -> BookingResult<Vec<Reservation>> {
        let state = self.lock()?;
        Ok(Self::newest_first(
            state.reservations.iter().filter(|r| filter.matches(r)),
        ))
    }

    async fn insert(&self, reservation: Reservation) -> BookingResult<Reservation> {
        let mut state = self.lock()?;
        ensure_no_collision(&state, &reservation)?;
        state.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update(&self, reservation: Reservation) -> BookingResult<Reservation> {
        let mut state = self.lock()?;
        ensure_no_collision(&state, &reservation)?;

        let slot = state.reservations.iter_mut()
            .find(|r| r.id == reservation.id)
            .ok_or_else(|| BookingError::not_found("Reservation", reservation.id))?;
        *slot = reservation.clone();
        Ok(reservation)
    }

    async fn append_change(&self, change: ReservationChange) -> BookingResult<()> {
        self.lock()?.changes.push(change);
        Ok(())
    }

    async fn changes_for(&self, id: ReservationId) -> BookingResult<Vec<ReservationChange>> {
        let state = self.lock()?;
        Ok(state.changes.iter()
            .filter(|c| c.reservation_id == id)
            .cloned()
            .collect())
    }
}
