use chrono::{DateTime, Utc};
use rokadan_core::{BookingError, BookingResult, Reservation, ReservationStatus};

/// Who is asking for a transition, relative to the reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Admin,
}

use ReservationStatus::{Cancelada, Completada, Confirmada, Pendiente};

/// Reservation status state machine.
///
/// ```text
/// pendiente ──admin──────────► confirmada ──admin──► completada
///     │                            │
///     └──owner/admin──► cancelada ◄┘ admin
/// ```
pub struct ReservationLifecycle;

impl ReservationLifecycle {
    /// Actors allowed to take the edge `from → to`, `None` when the edge
    /// does not exist.
    pub fn allowed_actors(from: ReservationStatus, to: ReservationStatus) -> Option<&'static [Actor]> {
        match (from, to) {
            (Pendiente, Confirmada) => Some(&[Actor::Admin]),
            (Pendiente, Cancelada) => Some(&[Actor::Owner, Actor::Admin]),
            (Confirmada, Cancelada) => Some(&[Actor::Admin]),
            (Confirmada, Completada) => Some(&[Actor::Admin]),
            _ => None,
        }
    }

    /// Statuses reachable in one step from `from`, by anyone
    pub fn reachable_from(from: ReservationStatus) -> Vec<ReservationStatus> {
        [Pendiente, Confirmada, Cancelada, Completada]
            .into_iter()
            .filter(|to| Self::allowed_actors(from, *to).is_some())
            .collect()
    }

    /// Check the edge and the actor without touching the reservation
    pub fn check(from: ReservationStatus, to: ReservationStatus, actor: Actor) -> BookingResult<()> {
        let actors = Self::allowed_actors(from, to)
            .ok_or(BookingError::InvalidTransition { from, to })?;

        if !actors.contains(&actor) {
            return Err(BookingError::Forbidden(format!(
                "{:?} may not move a reservation from {} to {}",
                actor, from, to
            )));
        }
        Ok(())
    }

    /// Apply a transition to the reservation
    pub fn transition(
        reservation: &mut Reservation,
        to: ReservationStatus,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> BookingResult<()> {
        Self::check(reservation.status, to, actor)?;

        reservation.status = to;
        reservation.updated_at = now;
        Ok(())
    }

    /// Dates, occupants and extras are editable only while pending
    pub fn ensure_editable(reservation: &Reservation) -> BookingResult<()> {
        if reservation.status != Pendiente {
            return Err(BookingError::ReservationLocked {
                id: reservation.id,
                status: reservation.status,
            });
        }
        Ok(())
    }
}
