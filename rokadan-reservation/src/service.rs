use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use rokadan_catalog::{Cabin, ExtraLine, ServiceCart};
use rokadan_core::{
    AccessControl, BookingError, BookingResult, CatalogReader, Clock, Reservation,
    ReservationFilter, ReservationStatus, ReservationStore, StayDates,
};
use rokadan_shared::{
    CabinId, ChangeKind, ReservationChange, ReservationId, ServiceId, UserId,
};

use crate::availability::AvailabilityChecker;
use crate::changes::ReservationChanges;
use crate::lifecycle::{Actor, ReservationLifecycle};

/// Everything a customer submits to book a cabin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub cabin_id: CabinId,
    pub owner_id: UserId,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub adults: u32,
    pub children: u32,
    /// Snapshot of the customer's cart
    pub extras: Vec<ExtraLine>,
}

/// A service picked for a number of days, as sent by a client
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub service_id: ServiceId,
    pub days: i32,
}

/// Creates, amends, cancels and moves reservations through their lifecycle
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    catalog: Arc<dyn CatalogReader>,
    access: Arc<dyn AccessControl>,
    clock: Arc<dyn Clock>,
    availability: AvailabilityChecker,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        catalog: Arc<dyn CatalogReader>,
        access: Arc<dyn AccessControl>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let availability = AvailabilityChecker::new(store.clone(), catalog.clone());
        Self {
            store,
            catalog,
            access,
            clock,
            availability,
        }
    }

    pub fn availability(&self) -> &AvailabilityChecker {
        &self.availability
    }

    /// Rebuild a cart from client selections, pricing each service from the
    /// catalog. A service listed twice is a `DuplicateItem`.
    pub async fn build_cart(&self, selections: &[ServiceSelection]) -> BookingResult<ServiceCart> {
        let mut cart = ServiceCart::new();
        for selection in selections {
            let service = self.catalog.get_service(selection.service_id).await?;
            cart.add(service)?;
            cart.set_days(&selection.service_id, selection.days)?;
        }
        Ok(cart)
    }

    /// Place a new `pendiente` reservation. The caller clears its cart once
    /// this succeeds.
    pub async fn create(&self, request: NewReservation) -> BookingResult<Reservation> {
        let stay = StayDates::new(request.checkin, request.checkout)?;
        stay.ensure_not_past(self.clock.today())?;
        ensure_adults(request.adults)?;

        let cabin = self.catalog.get_cabin(request.cabin_id).await?;
        ensure_fits(&cabin, request.adults, request.children)?;

        if !self.availability.is_free(cabin.id, stay, None).await? {
            return Err(BookingError::CabinUnavailable { cabin_id: cabin.id });
        }

        let reservation = Reservation::new(
            cabin.id,
            request.owner_id,
            stay,
            request.adults,
            request.children,
            request.extras,
            cabin.nightly_price,
            self.clock.now(),
        );

        let reservation = self.store.insert(reservation).await
            .inspect_err(|e| log_rejected_write("insert", cabin.id, e))?;

        info!(
            reservation_id = %reservation.id,
            cabin_id = %reservation.cabin_id,
            owner_id = %reservation.owner_id,
            total = reservation.total,
            "Reservation created"
        );

        self.record(
            &reservation,
            ChangeKind::Created,
            None,
            Some(summary(&reservation)),
            reservation.owner_id,
        )
        .await;

        Ok(reservation)
    }

    /// Owner edit of a pending reservation; re-validated as if newly created,
    /// ignoring its own dates in the overlap check
    pub async fn amend(
        &self,
        reservation_id: ReservationId,
        requester_id: UserId,
        changes: ReservationChanges,
    ) -> BookingResult<Reservation> {
        let current = self.store.find_by_id(reservation_id).await?;

        if current.owner_id != requester_id {
            return Err(BookingError::Forbidden(
                "only the owner may edit a reservation".to_string(),
            ));
        }
        ReservationLifecycle::ensure_editable(&current)?;

        let mut updated = changes.apply(&current)?;
        updated.stay().ensure_not_past(self.clock.today())?;
        ensure_adults(updated.adults)?;

        let cabin = self.catalog.get_cabin(updated.cabin_id).await?;
        ensure_fits(&cabin, updated.adults, updated.children)?;

        if !self.availability.is_free(cabin.id, updated.stay(), Some(current.id)).await? {
            return Err(BookingError::CabinUnavailable { cabin_id: cabin.id });
        }

        updated.updated_at = self.clock.now();
        let updated = self.store.update(updated).await
            .inspect_err(|e| log_rejected_write("update", cabin.id, e))?;

        info!(reservation_id = %updated.id, total = updated.total, "Reservation amended");

        self.record(
            &updated,
            ChangeKind::Amended,
            Some(summary(&current)),
            Some(summary(&updated)),
            requester_id,
        )
        .await;

        Ok(updated)
    }

    /// Owner cancels a pending reservation, an admin cancels any active one
    pub async fn cancel(
        &self,
        reservation_id: ReservationId,
        requester_id: UserId,
    ) -> BookingResult<Reservation> {
        let mut reservation = self.store.find_by_id(reservation_id).await?;
        let actor = self.actor_for(&reservation, requester_id).await?;
        let from = reservation.status;

        ReservationLifecycle::transition(
            &mut reservation,
            ReservationStatus::Cancelada,
            actor,
            self.clock.now(),
        )?;
        let reservation = self.store.update(reservation).await?;

        info!(reservation_id = %reservation.id, actor = ?actor, "Reservation cancelled");

        self.record(
            &reservation,
            ChangeKind::Cancelled,
            Some(status_value(from)),
            Some(status_value(reservation.status)),
            requester_id,
        )
        .await;

        Ok(reservation)
    }

    /// Back-office status change
    pub async fn change_status(
        &self,
        reservation_id: ReservationId,
        admin_id: UserId,
        new_status: ReservationStatus,
    ) -> BookingResult<Reservation> {
        self.ensure_admin(admin_id).await?;

        let mut reservation = self.store.find_by_id(reservation_id).await?;
        let from = reservation.status;

        ReservationLifecycle::transition(&mut reservation, new_status, Actor::Admin, self.clock.now())?;
        let reservation = self.store.update(reservation).await?;

        info!(
            reservation_id = %reservation.id,
            from = %from,
            to = %reservation.status,
            "Reservation status changed"
        );

        let kind = if new_status == ReservationStatus::Cancelada {
            ChangeKind::Cancelled
        } else {
            ChangeKind::StatusChanged
        };
        self.record(
            &reservation,
            kind,
            Some(status_value(from)),
            Some(status_value(reservation.status)),
            admin_id,
        )
        .await;

        Ok(reservation)
    }

    /// One reservation, visible to its owner and to admins
    pub async fn get(
        &self,
        reservation_id: ReservationId,
        requester_id: UserId,
    ) -> BookingResult<Reservation> {
        let reservation = self.store.find_by_id(reservation_id).await?;
        self.actor_for(&reservation, requester_id).await?;
        Ok(reservation)
    }

    /// "My reservations", newest first
    pub async fn list_for_owner(
        &self,
        owner_id: UserId,
        requester_id: UserId,
    ) -> BookingResult<Vec<Reservation>> {
        if owner_id != requester_id {
            self.ensure_admin(requester_id).await?;
        }
        self.store.find_by_owner(owner_id).await
    }

    /// Back-office listing, newest first
    pub async fn list_all(
        &self,
        admin_id: UserId,
        filter: &ReservationFilter,
    ) -> BookingResult<Vec<Reservation>> {
        self.ensure_admin(admin_id).await?;
        self.store.list(filter).await
    }

    /// Audit trail of one reservation, oldest first
    pub async fn history(
        &self,
        reservation_id: ReservationId,
        admin_id: UserId,
    ) -> BookingResult<Vec<ReservationChange>> {
        self.ensure_admin(admin_id).await?;
        self.store.find_by_id(reservation_id).await?;
        self.store.changes_for(reservation_id).await
    }

    /// `Forbidden` unless the user holds the administrator role
    pub async fn ensure_admin(&self, user_id: UserId) -> BookingResult<()> {
        if !self.access.is_admin(user_id).await? {
            return Err(BookingError::Forbidden(
                "administrator role required".to_string(),
            ));
        }
        Ok(())
    }

    /// Admin wins over owner so an admin's own booking gets admin rights
    async fn actor_for(&self, reservation: &Reservation, requester_id: UserId) -> BookingResult<Actor> {
        if self.access.is_admin(requester_id).await? {
            return Ok(Actor::Admin);
        }
        if reservation.owner_id == requester_id {
            return Ok(Actor::Owner);
        }
        Err(BookingError::Forbidden(
            "reservation belongs to another customer".to_string(),
        ))
    }

    async fn record(
        &self,
        reservation: &Reservation,
        kind: ChangeKind,
        from: Option<serde_json::Value>,
        to: Option<serde_json::Value>,
        actor: UserId,
    ) {
        let change = ReservationChange {
            reservation_id: reservation.id,
            kind,
            from,
            to,
            actor,
            timestamp: self.clock.now().timestamp(),
        };

        // mutation already committed, audit loss is only logged
        if let Err(e) = self.store.append_change(change).await {
            warn!(reservation_id = %reservation.id, error = %e, "Failed to record reservation change");
        }
    }
}

fn ensure_adults(adults: u32) -> BookingResult<()> {
    if adults < 1 {
        return Err(BookingError::InvalidOccupancy(
            "at least one adult is required".to_string(),
        ));
    }
    Ok(())
}

fn ensure_fits(cabin: &Cabin, adults: u32, children: u32) -> BookingResult<()> {
    if !cabin.fits(adults, children) {
        return Err(BookingError::InvalidOccupancy(format!(
            "{} guests exceed the capacity of {} ({})",
            adults + children,
            cabin.name,
            cabin.capacity
        )));
    }
    Ok(())
}

fn log_rejected_write(op: &str, cabin_id: CabinId, err: &BookingError) {
    if let BookingError::CabinUnavailable { .. } = err {
        warn!(%cabin_id, op, "Store rejected overlapping write");
    }
}

fn status_value(status: ReservationStatus) -> serde_json::Value {
    serde_json::json!({ "status": status })
}

fn summary(reservation: &Reservation) -> serde_json::Value {
    serde_json::json!({
        "status": reservation.status,
        "checkin": reservation.checkin,
        "checkout": reservation.checkout,
        "adults": reservation.adults,
        "children": reservation.children,
        "extras": reservation.extras.len(),
        "total": reservation.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rokadan_catalog::Service;
    use rokadan_core::{FixedClock, InMemoryCatalog, InMemoryReservationStore, StaticAccessControl};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    struct Fixture {
        service: Arc<ReservationService>,
        store: Arc<InMemoryReservationStore>,
        cabin: Cabin,
        piscina: Service,
        admin: UserId,
        customer: UserId,
    }

    fn fixture_with(store: Arc<dyn ReservationStore>, raw: Arc<InMemoryReservationStore>) -> Fixture {
        let cabin = Cabin::new("C1", 25000, 4);
        let piscina = Service::new("Piscina", 10000);
        let catalog = Arc::new(InMemoryCatalog::new(vec![cabin.clone()], vec![piscina.clone()]));
        let admin = UserId::new();
        let access = Arc::new(StaticAccessControl::new([admin]));
        let clock = Arc::new(FixedClock::on(date("2025-01-01")));

        Fixture {
            service: Arc::new(ReservationService::new(store, catalog, access, clock)),
            store: raw,
            cabin,
            piscina,
            admin,
            customer: UserId::new(),
        }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryReservationStore::new());
        fixture_with(store.clone(), store)
    }

    fn request(f: &Fixture, checkin: &str, checkout: &str) -> NewReservation {
        NewReservation {
            cabin_id: f.cabin.id,
            owner_id: f.customer,
            checkin: date(checkin),
            checkout: date(checkout),
            adults: 2,
            children: 0,
            extras: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_with_pool_service() {
        let f = fixture();
        let cart = f.service
            .build_cart(&[ServiceSelection { service_id: f.piscina.id, days: 1 }])
            .await
            .unwrap();

        let mut req = request(&f, "2025-01-10", "2025-01-12");
        req.extras = cart.snapshot();
        let reservation = f.service.create(req).await.unwrap();

        assert_eq!(reservation.status, ReservationStatus::Pendiente);
        assert_eq!(reservation.total, 60000);
        assert_eq!(reservation.extras.len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_create_is_rejected() {
        let f = fixture();
        f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();

        let result = f.service.create(request(&f, "2025-01-11", "2025-01-13")).await;
        assert!(matches!(result, Err(BookingError::CabinUnavailable { .. })));

        // checkout day is free again
        assert!(f.service.create(request(&f, "2025-01-12", "2025-01-14")).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_validates_dates_and_occupancy() {
        let f = fixture();

        let result = f.service.create(request(&f, "2025-01-12", "2025-01-10")).await;
        assert!(matches!(result, Err(BookingError::InvalidDateRange(_))));

        let result = f.service.create(request(&f, "2024-12-30", "2025-01-02")).await;
        assert!(matches!(result, Err(BookingError::InvalidDateRange(_))));

        let mut req = request(&f, "2025-01-10", "2025-01-12");
        req.adults = 0;
        req.children = 1;
        let result = f.service.create(req).await;
        assert!(matches!(result, Err(BookingError::InvalidOccupancy(_))));

        let mut req = request(&f, "2025-01-10", "2025-01-12");
        req.adults = 3;
        req.children = 2;
        let result = f.service.create(req).await;
        assert!(matches!(result, Err(BookingError::InvalidOccupancy(_))));

        let mut req = request(&f, "2025-01-10", "2025-01-12");
        req.cabin_id = CabinId::new();
        let result = f.service.create(req).await;
        assert!(matches!(result, Err(BookingError::NotFound { entity: "Cabin", .. })));
    }

    #[tokio::test]
    async fn test_duplicate_service_selection() {
        let f = fixture();
        let selection = ServiceSelection { service_id: f.piscina.id, days: 2 };

        let result = f.service.build_cart(&[selection, selection]).await;
        assert!(matches!(result, Err(BookingError::DuplicateItem(id)) if id == f.piscina.id));
    }

    #[tokio::test]
    async fn test_selection_days_are_clamped() {
        let f = fixture();
        let cart = f.service
            .build_cart(&[ServiceSelection { service_id: f.piscina.id, days: -3 }])
            .await
            .unwrap();

        assert_eq!(cart.total(), 10000);
    }

    #[tokio::test]
    async fn test_concurrent_creates_book_once() {
        let f = fixture();

        let (a, b) = tokio::join!(
            f.service.create(request(&f, "2025-01-10", "2025-01-12")),
            f.service.create(request(&f, "2025-01-11", "2025-01-13")),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let active = f.store
            .find_by_cabin_and_status(f.cabin.id, &ReservationStatus::ACTIVE)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_amend_pending_reservation() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();

        let changes = ReservationChanges {
            checkout: Some(date("2025-01-13")),
            children: Some(1),
            ..Default::default()
        };
        let updated = f.service.amend(r.id, f.customer, changes).await.unwrap();

        assert_eq!(updated.total, 75000);
        assert_eq!(updated.children, 1);
        assert_eq!(f.store.find_by_id(r.id).await.unwrap().total, 75000);
    }

    #[tokio::test]
    async fn test_empty_amend_keeps_total() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();

        let updated = f.service.amend(r.id, f.customer, ReservationChanges::default()).await.unwrap();

        assert_eq!(updated.total, r.total);
        assert_eq!(updated.stay(), r.stay());
    }

    #[tokio::test]
    async fn test_amend_confirmed_is_locked() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();
        f.service.change_status(r.id, f.admin, ReservationStatus::Confirmada).await.unwrap();

        let changes = ReservationChanges {
            adults: Some(1),
            ..Default::default()
        };
        let result = f.service.amend(r.id, f.customer, changes).await;

        assert!(matches!(
            result,
            Err(BookingError::ReservationLocked { status: ReservationStatus::Confirmada, .. })
        ));
    }

    #[tokio::test]
    async fn test_amend_rejects_foreign_owner_and_overlap() {
        let f = fixture();
        let first = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();
        let second = f.service.create(request(&f, "2025-01-15", "2025-01-17")).await.unwrap();

        let result = f.service.amend(first.id, UserId::new(), ReservationChanges::default()).await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));

        let changes = ReservationChanges {
            checkout: Some(date("2025-01-16")),
            ..Default::default()
        };
        let result = f.service.amend(first.id, f.customer, changes).await;
        assert!(matches!(result, Err(BookingError::CabinUnavailable { .. })));

        // moving into its own old slot is fine
        let changes = ReservationChanges {
            checkin: Some(date("2025-01-14")),
            ..Default::default()
        };
        let moved = f.service.amend(second.id, f.customer, changes).await.unwrap();
        assert_eq!(moved.nights(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_reservation_is_final() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();
        let cancelled = f.service.cancel(r.id, f.customer).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelada);

        for to in [
            ReservationStatus::Pendiente,
            ReservationStatus::Confirmada,
            ReservationStatus::Cancelada,
            ReservationStatus::Completada,
        ] {
            let result = f.service.change_status(r.id, f.admin, to).await;
            assert!(matches!(result, Err(BookingError::InvalidTransition { .. })));
        }

        // dates are free again
        assert!(f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.is_ok());
    }

    #[tokio::test]
    async fn test_owner_cannot_cancel_confirmed() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();
        f.service.change_status(r.id, f.admin, ReservationStatus::Confirmada).await.unwrap();

        let result = f.service.cancel(r.id, f.customer).await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));

        let cancelled = f.service.cancel(r.id, f.admin).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelada);
    }

    #[tokio::test]
    async fn test_status_change_requires_admin() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();

        let result = f.service.change_status(r.id, f.customer, ReservationStatus::Confirmada).await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));

        let result = f.service.change_status(r.id, f.admin, ReservationStatus::Completada).await;
        assert!(matches!(result, Err(BookingError::InvalidTransition { .. })));

        f.service.change_status(r.id, f.admin, ReservationStatus::Confirmada).await.unwrap();
        let done = f.service.change_status(r.id, f.admin, ReservationStatus::Completada).await.unwrap();
        assert_eq!(done.status, ReservationStatus::Completada);
    }

    #[tokio::test]
    async fn test_reads_respect_ownership() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();
        let stranger = UserId::new();

        assert_eq!(f.service.get(r.id, f.customer).await.unwrap().id, r.id);
        assert_eq!(f.service.get(r.id, f.admin).await.unwrap().id, r.id);
        assert!(matches!(f.service.get(r.id, stranger).await, Err(BookingError::Forbidden(_))));

        assert_eq!(f.service.list_for_owner(f.customer, f.customer).await.unwrap().len(), 1);
        assert_eq!(f.service.list_for_owner(f.customer, f.admin).await.unwrap().len(), 1);
        assert!(f.service.list_for_owner(f.customer, stranger).await.is_err());

        let filter = ReservationFilter {
            status: Some(ReservationStatus::Pendiente),
            cabin_id: None,
        };
        assert_eq!(f.service.list_all(f.admin, &filter).await.unwrap().len(), 1);
        assert!(f.service.list_all(f.customer, &filter).await.is_err());
    }

    #[tokio::test]
    async fn test_history_records_each_change() {
        let f = fixture();
        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();
        f.service.amend(r.id, f.customer, ReservationChanges::default()).await.unwrap();
        f.service.change_status(r.id, f.admin, ReservationStatus::Confirmada).await.unwrap();
        f.service.cancel(r.id, f.admin).await.unwrap();

        let history = f.service.history(r.id, f.admin).await.unwrap();
        let kinds: Vec<ChangeKind> = history.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Created, ChangeKind::Amended, ChangeKind::StatusChanged, ChangeKind::Cancelled]
        );
        assert_eq!(history[2].actor, f.admin);
        assert_eq!(history[2].to, Some(serde_json::json!({ "status": "confirmada" })));

        assert!(f.service.history(r.id, f.customer).await.is_err());
    }

    /// Store whose audit log is down
    struct NoAuditStore(Arc<InMemoryReservationStore>);

    #[async_trait]
    impl ReservationStore for NoAuditStore {
        async fn find_by_cabin_and_status(
            &self,
            cabin_id: CabinId,
            statuses: &[ReservationStatus],
        ) -> BookingResult<Vec<Reservation>> {
            self.0.find_by_cabin_and_status(cabin_id, statuses).await
        }

        async fn find_by_id(&self, id: ReservationId) -> BookingResult<Reservation> {
            self.0.find_by_id(id).await
        }

        async fn find_by_owner(&self, owner_id: UserId) -> BookingResult<Vec<Reservation>> {
            self.0.find_by_owner(owner_id).await
        }

        async fn list(&self, filter: &ReservationFilter) -> BookingResult<Vec<Reservation>> {
            self.0.list(filter).await
        }

        async fn insert(&self, reservation: Reservation) -> BookingResult<Reservation> {
            self.0.insert(reservation).await
        }

        async fn update(&self, reservation: Reservation) -> BookingResult<Reservation> {
            self.0.update(reservation).await
        }

        async fn append_change(&self, _change: ReservationChange) -> BookingResult<()> {
            Err(BookingError::io("audit table unavailable"))
        }

        async fn changes_for(&self, id: ReservationId) -> BookingResult<Vec<ReservationChange>> {
            self.0.changes_for(id).await
        }
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_booking() {
        let raw = Arc::new(InMemoryReservationStore::new());
        let f = fixture_with(Arc::new(NoAuditStore(raw.clone())), raw);

        let r = f.service.create(request(&f, "2025-01-10", "2025-01-12")).await.unwrap();

        assert_eq!(f.store.find_by_id(r.id).await.unwrap().status, ReservationStatus::Pendiente);
        assert!(f.service.history(r.id, f.admin).await.unwrap().is_empty());
    }

    /// Catalog whose cabin price can change between calls
    struct RepricedCatalog {
        cabin: std::sync::RwLock<Cabin>,
    }

    #[async_trait]
    impl CatalogReader for RepricedCatalog {
        async fn get_cabin(&self, id: CabinId) -> BookingResult<Cabin> {
            let cabin = self.cabin.read().unwrap().clone();
            if cabin.id != id {
                return Err(BookingError::not_found("Cabin", id));
            }
            Ok(cabin)
        }

        async fn get_service(&self, id: ServiceId) -> BookingResult<Service> {
            Err(BookingError::not_found("Service", id))
        }

        async fn list_cabins(&self) -> BookingResult<Vec<Cabin>> {
            Ok(vec![self.cabin.read().unwrap().clone()])
        }
    }

    #[tokio::test]
    async fn test_amend_keeps_nightly_price_snapshot() {
        let cabin = Cabin::new("C1", 25000, 4);
        let catalog = Arc::new(RepricedCatalog {
            cabin: std::sync::RwLock::new(cabin.clone()),
        });
        let customer = UserId::new();
        let service = ReservationService::new(
            Arc::new(InMemoryReservationStore::new()),
            catalog.clone(),
            Arc::new(StaticAccessControl::default()),
            Arc::new(FixedClock::on(date("2025-01-01"))),
        );

        let r = service
            .create(NewReservation {
                cabin_id: cabin.id,
                owner_id: customer,
                checkin: date("2025-01-10"),
                checkout: date("2025-01-12"),
                adults: 2,
                children: 0,
                extras: vec![],
            })
            .await
            .unwrap();
        assert_eq!(r.total, 50000);

        catalog.cabin.write().unwrap().nightly_price = 40000;

        let untouched = service.amend(r.id, customer, ReservationChanges::default()).await.unwrap();
        assert_eq!(untouched.nightly_price, 25000);
        assert_eq!(untouched.total, 50000);

        let changes = ReservationChanges {
            children: Some(1),
            ..Default::default()
        };
        let more_guests = service.amend(r.id, customer, changes).await.unwrap();
        assert_eq!(more_guests.nightly_price, 25000);
        assert_eq!(more_guests.total, 50000);

        // new nights are still charged at the booked rate
        let changes = ReservationChanges {
            checkout: Some(date("2025-01-13")),
            ..Default::default()
        };
        let longer = service.amend(r.id, customer, changes).await.unwrap();
        assert_eq!(longer.total, 75000);
    }
}
