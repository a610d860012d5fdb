use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rokadan_catalog::{ExtraLine, StayQuote};
use rokadan_shared::{CabinId, ReservationId, UserId};

use crate::{BookingError, BookingResult};

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pendiente,
    Confirmada,
    Cancelada,
    Completada,
}

impl ReservationStatus {
    /// Statuses that hold the cabin's dates
    pub const ACTIVE: [ReservationStatus; 2] =
        [ReservationStatus::Pendiente, ReservationStatus::Confirmada];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pendiente => "pendiente",
            ReservationStatus::Confirmada => "confirmada",
            ReservationStatus::Cancelada => "cancelada",
            ReservationStatus::Completada => "completada",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Cancelada | ReservationStatus::Completada)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pendiente" => Ok(ReservationStatus::Pendiente),
            "confirmada" => Ok(ReservationStatus::Confirmada),
            "cancelada" => Ok(ReservationStatus::Cancelada),
            "completada" => Ok(ReservationStatus::Completada),
            other => Err(BookingError::not_found("Reservation status", other)),
        }
    }
}

/// A validated half-open stay `[checkin, checkout)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StayDates {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

impl StayDates {
    pub fn new(checkin: NaiveDate, checkout: NaiveDate) -> BookingResult<Self> {
        if checkin >= checkout {
            return Err(BookingError::InvalidDateRange(format!(
                "check-out {} must be after check-in {}",
                checkout, checkin
            )));
        }

        Ok(Self { checkin, checkout })
    }

    /// Reject stays that start before `today`
    pub fn ensure_not_past(&self, today: NaiveDate) -> BookingResult<()> {
        if self.checkin < today {
            return Err(BookingError::InvalidDateRange(format!(
                "check-in {} is in the past (today is {})",
                self.checkin, today
            )));
        }
        Ok(())
    }

    pub fn nights(&self) -> i64 {
        (self.checkout - self.checkin).num_days()
    }

    pub fn overlaps(&self, other: &StayDates) -> bool {
        self.checkin < other.checkout && other.checkin < self.checkout
    }
}

/// A booking of one cabin by one customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: ReservationId,
    pub cabin_id: CabinId,
    pub owner_id: UserId,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub extras: Vec<ExtraLine>,
    /// Cabin price per night when the reservation was placed
    pub nightly_price: i64,
    pub status: ReservationStatus,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Build a new `pendiente` reservation with its total already computed
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cabin_id: CabinId,
        owner_id: UserId,
        stay: StayDates,
        adults: u32,
        children: u32,
        extras: Vec<ExtraLine>,
        nightly_price: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let mut reservation = Self {
            id: ReservationId::new(),
            cabin_id,
            owner_id,
            checkin: stay.checkin,
            checkout: stay.checkout,
            adults,
            children,
            extras,
            nightly_price,
            status: ReservationStatus::Pendiente,
            total: 0,
            created_at: now,
            updated_at: now,
        };
        reservation.recompute_total();
        reservation
    }

    pub fn stay(&self) -> StayDates {
        StayDates {
            checkin: self.checkin,
            checkout: self.checkout,
        }
    }

    pub fn nights(&self) -> i64 {
        self.stay().nights()
    }

    pub fn quote(&self) -> StayQuote {
        StayQuote::compute(self.nightly_price, self.nights(), &self.extras)
    }

    /// Bring `total` back in line with dates, nightly price and extras
    pub fn recompute_total(&mut self) {
        self.total = self.quote().total;
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Two distinct active reservations of one cabin whose stays overlap
    pub fn collides_with(&self, other: &Reservation) -> bool {
        self.id != other.id
            && self.cabin_id == other.cabin_id
            && self.is_active()
            && other.is_active()
            && self.stay().overlaps(&other.stay())
    }
}
