use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use rokadan_catalog::ExtraLine;
use rokadan_core::{
    BookingError, BookingResult, Reservation, ReservationFilter, ReservationStatus,
    ReservationStore,
};
use rokadan_shared::{CabinId, ChangeKind, ReservationChange, ReservationId, UserId};

use crate::db_err;

/// PostgreSQL reservation store.
///
/// Conditional writes lock the cabin row with `SELECT ... FOR UPDATE`, so two
/// writers on the same cabin serialize on that lock while writers on other
/// cabins proceed.
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    cabana_id: Uuid,
    usuario_id: Uuid,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
    adultos: i32,
    ninos: i32,
    extras: Json<Vec<ExtraLine>>,
    precio_noche: i64,
    estado: String,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = BookingError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: ReservationId(row.id),
            cabin_id: CabinId(row.cabana_id),
            owner_id: UserId(row.usuario_id),
            checkin: row.fecha_inicio,
            checkout: row.fecha_fin,
            adults: count(row.adultos),
            children: count(row.ninos),
            extras: row.extras.0,
            nightly_price: row.precio_noche,
            status: row.estado.parse()
                .map_err(|_| BookingError::io(format!("unknown reservation status {}", row.estado)))?,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChangeRow {
    reserva_id: Uuid,
    tipo: String,
    desde: Option<serde_json::Value>,
    hacia: Option<serde_json::Value>,
    actor: Uuid,
    ts: i64,
}

impl TryFrom<ChangeRow> for ReservationChange {
    type Error = BookingError;

    fn try_from(row: ChangeRow) -> Result<Self, Self::Error> {
        let kind = ChangeKind::parse(&row.tipo)
            .ok_or_else(|| BookingError::io(format!("unknown change kind {}", row.tipo)))?;

        Ok(ReservationChange {
            reservation_id: ReservationId(row.reserva_id),
            kind,
            from: row.desde,
            to: row.hacia,
            actor: UserId(row.actor),
            timestamp: row.ts,
        })
    }
}

fn count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn into_reservations(rows: Vec<ReservationRow>) -> BookingResult<Vec<Reservation>> {
    rows.into_iter().map(Reservation::try_from).collect()
}

fn status_names(statuses: &[ReservationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

const COLUMNS: &str = "id, cabana_id, usuario_id, fecha_inicio, fecha_fin, adultos, ninos, \
    extras, precio_noche, estado, total, created_at, updated_at";

/// Take the per-cabin write lock for the rest of the transaction
async fn lock_cabin(tx: &mut Transaction<'_, Postgres>, cabin_id: CabinId) -> BookingResult<()> {
    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM cabanas WHERE id = $1 FOR UPDATE")
        .bind(cabin_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

    locked
        .map(|_| ())
        .ok_or_else(|| BookingError::not_found("Cabin", cabin_id))
}

/// Same rule as `Reservation::collides_with`, evaluated under the cabin lock
async fn ensure_no_overlap(
    tx: &mut Transaction<'_, Postgres>,
    reservation: &Reservation,
) -> BookingResult<()> {
    if !reservation.is_active() {
        return Ok(());
    }

    let (overlaps,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM reservas
            WHERE cabana_id = $1
              AND id <> $2
              AND estado = ANY($3)
              AND fecha_inicio < $5
              AND $4 < fecha_fin
        )
        "#,
    )
    .bind(reservation.cabin_id.as_uuid())
    .bind(reservation.id.as_uuid())
    .bind(status_names(&ReservationStatus::ACTIVE))
    .bind(reservation.checkin)
    .bind(reservation.checkout)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_err)?;

    if overlaps {
        warn!(cabin_id = %reservation.cabin_id, reservation_id = %reservation.id, "Overlapping write rejected");
        return Err(BookingError::CabinUnavailable { cabin_id: reservation.cabin_id });
    }
    Ok(())
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn find_by_cabin_and_status(
        &self,
        cabin_id: CabinId,
        statuses: &[ReservationStatus],
    ) -> BookingResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM reservas WHERE cabana_id = $1 AND estado = ANY($2) ORDER BY created_at DESC"
        ))
        .bind(cabin_id.as_uuid())
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        into_reservations(rows)
    }

    async fn find_by_id(&self, id: ReservationId) -> BookingResult<Reservation> {
        let row: Option<ReservationRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM reservas WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.ok_or_else(|| BookingError::not_found("Reservation", id))?
            .try_into()
    }

    async fn find_by_owner(&self, owner_id: UserId) -> BookingResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM reservas WHERE usuario_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        into_reservations(rows)
    }

    async fn list(&self, filter: &ReservationFilter) -> BookingResult<Vec<Reservation>> {
        // NULL parameters disable their filter
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM reservas
            WHERE ($1::TEXT IS NULL OR estado = $1)
              AND ($2::UUID IS NULL OR cabana_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.cabin_id.map(|c| c.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        into_reservations(rows)
    }

    async fn insert(&self, reservation: Reservation) -> BookingResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        lock_cabin(&mut tx, reservation.cabin_id).await?;
        ensure_no_overlap(&mut tx, &reservation).await?;

        sqlx::query(
            r#"
            INSERT INTO reservas (id, cabana_id, usuario_id, fecha_inicio, fecha_fin, adultos, ninos,
                                  extras, precio_noche, estado, total, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.cabin_id.as_uuid())
        .bind(reservation.owner_id.as_uuid())
        .bind(reservation.checkin)
        .bind(reservation.checkout)
        .bind(reservation.adults as i32)
        .bind(reservation.children as i32)
        .bind(Json(&reservation.extras))
        .bind(reservation.nightly_price)
        .bind(reservation.status.as_str())
        .bind(reservation.total)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(reservation)
    }

    async fn update(&self, reservation: Reservation) -> BookingResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        lock_cabin(&mut tx, reservation.cabin_id).await?;
        ensure_no_overlap(&mut tx, &reservation).await?;

        let result = sqlx::query(
            r#"
            UPDATE reservas
            SET fecha_inicio = $2, fecha_fin = $3, adultos = $4, ninos = $5, extras = $6,
                estado = $7, total = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.checkin)
        .bind(reservation.checkout)
        .bind(reservation.adults as i32)
        .bind(reservation.children as i32)
        .bind(Json(&reservation.extras))
        .bind(reservation.status.as_str())
        .bind(reservation.total)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::not_found("Reservation", reservation.id));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(reservation)
    }

    async fn append_change(&self, change: ReservationChange) -> BookingResult<()> {
        sqlx::query(
            "INSERT INTO reserva_cambios (reserva_id, tipo, desde, hacia, actor, ts) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(change.reservation_id.as_uuid())
        .bind(change.kind.as_str())
        .bind(change.from)
        .bind(change.to)
        .bind(change.actor.as_uuid())
        .bind(change.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn changes_for(&self, id: ReservationId) -> BookingResult<Vec<ReservationChange>> {
        let rows: Vec<ChangeRow> = sqlx::query_as(
            "SELECT reserva_id, tipo, desde, hacia, actor, ts FROM reserva_cambios WHERE reserva_id = $1 ORDER BY id",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(ReservationChange::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(estado: &str) -> ReservationRow {
        ReservationRow {
            id: Uuid::new_v4(),
            cabana_id: Uuid::new_v4(),
            usuario_id: Uuid::new_v4(),
            fecha_inicio: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            fecha_fin: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            adultos: 2,
            ninos: -1,
            extras: Json(vec![]),
            precio_noche: 25000,
            estado: estado.to_string(),
            total: 50000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_maps_to_reservation() {
        let reservation = Reservation::try_from(row("confirmada")).unwrap();

        assert_eq!(reservation.status, ReservationStatus::Confirmada);
        assert_eq!(reservation.nights(), 2);
        assert_eq!(reservation.children, 0);
    }

    #[test]
    fn test_unknown_status_is_a_storage_error() {
        assert!(matches!(Reservation::try_from(row("borrada")), Err(BookingError::Io(_))));
    }

    #[test]
    fn test_change_row_kind() {
        let change = ChangeRow {
            reserva_id: Uuid::new_v4(),
            tipo: "STATUS_CHANGED".to_string(),
            desde: Some(serde_json::json!({ "status": "pendiente" })),
            hacia: Some(serde_json::json!({ "status": "confirmada" })),
            actor: Uuid::new_v4(),
            ts: 1_735_689_600,
        };
        assert_eq!(ReservationChange::try_from(change).unwrap().kind, ChangeKind::StatusChanged);
    }
}
