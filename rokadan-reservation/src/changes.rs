use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rokadan_catalog::ExtraLine;
use rokadan_core::{BookingResult, Reservation, StayDates};

/// Owner edits to a pending reservation. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationChanges {
    pub checkin: Option<NaiveDate>,
    pub checkout: Option<NaiveDate>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    /// Replaces the whole extras snapshot
    pub extras: Option<Vec<ExtraLine>>,
}

impl ReservationChanges {
    pub fn is_empty(&self) -> bool {
        self.checkin.is_none()
            && self.checkout.is_none()
            && self.adults.is_none()
            && self.children.is_none()
            && self.extras.is_none()
    }

    /// Merge onto a copy of `reservation` and recompute its total.
    ///
    /// Only date ordering is checked here; "not in the past", occupancy and
    /// availability are the service's job.
    pub fn apply(&self, reservation: &Reservation) -> BookingResult<Reservation> {
        let stay = StayDates::new(
            self.checkin.unwrap_or(reservation.checkin),
            self.checkout.unwrap_or(reservation.checkout),
        )?;

        let mut updated = reservation.clone();
        updated.checkin = stay.checkin;
        updated.checkout = stay.checkout;
        if let Some(adults) = self.adults {
            updated.adults = adults;
        }
        if let Some(children) = self.children {
            updated.children = children;
        }
        if let Some(extras) = &self.extras {
            updated.extras = extras.clone();
        }

        updated.recompute_total();
        Ok(updated)
    }
}
