use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use rokadan_core::{ReservationFilter, ReservationStatus};
use rokadan_shared::{CabinId, ReservationChange, ReservationId, UserId};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::reservations::ReservationResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListReservationsQuery {
    pub estado: Option<String>,
    pub cabana_id: Option<CabinId>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub estado: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeResponse {
    pub tipo: String,
    pub desde: Option<serde_json::Value>,
    pub hacia: Option<serde_json::Value>,
    pub actor: UserId,
    pub timestamp: i64,
}

impl From<ReservationChange> for ChangeResponse {
    fn from(change: ReservationChange) -> Self {
        Self {
            tipo: change.kind.as_str().to_string(),
            desde: change.from,
            hacia: change.to,
            actor: change.actor,
            timestamp: change.timestamp,
        }
    }
}

fn parse_status(raw: &str) -> Result<ReservationStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::ValidationError(format!("Unknown reservation status: {}", raw)))
}

/// Parse a status sent by a supposed admin. A non-admin gets 403 even when
/// the status is also bad.
async fn admin_status(state: &AppState, admin_id: UserId, raw: &str) -> Result<ReservationStatus, AppError> {
    match parse_status(raw) {
        Ok(status) => Ok(status),
        Err(err) => {
            state.reservations.ensure_admin(admin_id).await?;
            Err(err)
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/reservas", get(list_reservations))
        .route("/api/admin/reservas/{id}/estado", patch(change_status))
        .route("/api/admin/reservas/{id}/historial", get(reservation_history))
}

async fn list_reservations(
    State(state): State<AppState>,
    Extension(AuthUser(admin_id)): Extension<AuthUser>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let status = match query.estado.as_deref() {
        Some(raw) => Some(admin_status(&state, admin_id, raw).await?),
        None => None,
    };
    let filter = ReservationFilter {
        status,
        cabin_id: query.cabana_id,
    };

    let reservations = state.reservations.list_all(admin_id, &filter).await?;
    Ok(Json(reservations.into_iter().map(ReservationResponse::from).collect()))
}

async fn change_status(
    State(state): State<AppState>,
    Extension(AuthUser(admin_id)): Extension<AuthUser>,
    Path(id): Path<ReservationId>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let status = admin_status(&state, admin_id, &req.estado).await?;
    let reservation = state.reservations.change_status(id, admin_id, status).await?;
    Ok(Json(reservation.into()))
}

async fn reservation_history(
    State(state): State<AppState>,
    Extension(AuthUser(admin_id)): Extension<AuthUser>,
    Path(id): Path<ReservationId>,
) -> Result<Json<Vec<ChangeResponse>>, AppError> {
    let history = state.reservations.history(id, admin_id).await?;
    Ok(Json(history.into_iter().map(ChangeResponse::from).collect()))
}
