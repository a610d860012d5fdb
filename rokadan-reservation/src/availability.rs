use chrono::NaiveDate;
use std::sync::Arc;

use rokadan_catalog::Cabin;
use rokadan_core::{
    BookingError, BookingResult, CatalogReader, ReservationStatus, ReservationStore, StayDates,
};
use rokadan_shared::{CabinId, ReservationId};

/// Answers "is this cabin free for these dates". Pure queries, no writes.
#[derive(Clone)]
pub struct AvailabilityChecker {
    store: Arc<dyn ReservationStore>,
    catalog: Arc<dyn CatalogReader>,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn ReservationStore>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self { store, catalog }
    }

    /// `false` iff an active reservation of the cabin overlaps
    /// `[checkin, checkout)`. `exclude` lets an edit skip its own booking.
    pub async fn is_available(
        &self,
        cabin_id: CabinId,
        checkin: NaiveDate,
        checkout: NaiveDate,
        exclude: Option<ReservationId>,
    ) -> BookingResult<bool> {
        let stay = StayDates::new(checkin, checkout)?;
        self.catalog.get_cabin(cabin_id).await?;
        self.is_free(cabin_id, stay, exclude).await
    }

    /// Cabins that fit the party and are free for the whole stay, in
    /// catalog order
    pub async fn available_cabins(
        &self,
        checkin: NaiveDate,
        checkout: NaiveDate,
        adults: u32,
        children: u32,
    ) -> BookingResult<Vec<Cabin>> {
        let stay = StayDates::new(checkin, checkout)?;
        if adults < 1 {
            return Err(BookingError::InvalidOccupancy(
                "at least one adult is required".to_string(),
            ));
        }

        let mut available = Vec::new();
        for cabin in self.catalog.list_cabins().await? {
            if cabin.fits(adults, children) && self.is_free(cabin.id, stay, None).await? {
                available.push(cabin);
            }
        }

        tracing::debug!(
            %checkin, %checkout, adults, children,
            found = available.len(),
            "Availability search"
        );
        Ok(available)
    }

    /// Overlap test against the store, for a cabin already known to exist
    pub(crate) async fn is_free(
        &self,
        cabin_id: CabinId,
        stay: StayDates,
        exclude: Option<ReservationId>,
    ) -> BookingResult<bool> {
        let active = self.store
            .find_by_cabin_and_status(cabin_id, &ReservationStatus::ACTIVE)
            .await?;

        Ok(!active.iter()
            .filter(|r| Some(r.id) != exclude)
            .any(|r| stay.overlaps(&r.stay())))
    }
}
