use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use rokadan_catalog::ExtraLine;
use rokadan_core::Reservation;
use rokadan_reservation::{NewReservation, ReservationChanges, ServiceSelection};
use rokadan_shared::{CabinId, ReservationId, ServiceId, UserId};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectedService {
    pub id: ServiceId,
    #[serde(default = "one_day")]
    pub dias: i32,
}

fn one_day() -> i32 { 1 }

impl From<&SelectedService> for ServiceSelection {
    fn from(s: &SelectedService) -> Self {
        ServiceSelection {
            service_id: s.id,
            days: s.dias,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub cabana_id: CabinId,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub adultos: u32,
    #[serde(default)]
    pub ninos: u32,
    #[serde(default)]
    pub servicios: Vec<SelectedService>,
}

/// Absent fields are left unchanged; `servicios` replaces the whole list
#[derive(Debug, Default, Deserialize)]
pub struct AmendReservationRequest {
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub adultos: Option<u32>,
    pub ninos: Option<u32>,
    pub servicios: Option<Vec<SelectedService>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtraResponse {
    pub id: ServiceId,
    pub nombre: String,
    pub dias: u32,
    pub precio: i64,
    pub subtotal: i64,
}

impl From<ExtraLine> for ExtraResponse {
    fn from(line: ExtraLine) -> Self {
        Self {
            subtotal: line.subtotal(),
            id: line.service_id,
            nombre: line.name,
            dias: line.days,
            precio: line.unit_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub cabana_id: CabinId,
    pub usuario_id: UserId,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub noches: i64,
    pub adultos: u32,
    pub ninos: u32,
    pub servicios: Vec<ExtraResponse>,
    pub precio_noche: i64,
    pub estado: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            noches: r.nights(),
            id: r.id,
            cabana_id: r.cabin_id,
            usuario_id: r.owner_id,
            fecha_inicio: r.checkin,
            fecha_fin: r.checkout,
            adultos: r.adults,
            ninos: r.children,
            servicios: r.extras.into_iter().map(ExtraResponse::from).collect(),
            precio_noche: r.nightly_price,
            estado: r.status.to_string(),
            total: r.total,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reservas", post(create_reservation))
        .route(
            "/api/reservas/{id}",
            get(get_reservation).patch(amend_reservation).delete(cancel_reservation),
        )
        .route("/api/reservas/usuario/{user_id}", get(list_user_reservations))
}

async fn create_reservation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    let selections: Vec<ServiceSelection> = req.servicios.iter().map(ServiceSelection::from).collect();
    let cart = state.reservations.build_cart(&selections).await?;

    let reservation = state.reservations
        .create(NewReservation {
            cabin_id: req.cabana_id,
            owner_id: user_id,
            checkin: req.fecha_inicio,
            checkout: req.fecha_fin,
            adults: req.adultos,
            children: req.ninos,
            extras: cart.snapshot(),
        })
        .await?;

    info!(reservation_id = %reservation.id, "Reservation placed via API");
    Ok((StatusCode::CREATED, Json(reservation.into())))
}

async fn get_reservation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<ReservationId>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation = state.reservations.get(id, user_id).await?;
    Ok(Json(reservation.into()))
}

async fn amend_reservation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<ReservationId>,
    Json(req): Json<AmendReservationRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let extras = match &req.servicios {
        Some(servicios) => {
            let selections: Vec<ServiceSelection> = servicios.iter().map(ServiceSelection::from).collect();
            Some(state.reservations.build_cart(&selections).await?.snapshot())
        }
        None => None,
    };

    let changes = ReservationChanges {
        checkin: req.fecha_inicio,
        checkout: req.fecha_fin,
        adults: req.adultos,
        children: req.ninos,
        extras,
    };

    let reservation = state.reservations.amend(id, user_id, changes).await?;
    Ok(Json(reservation.into()))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<ReservationId>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation = state.reservations.cancel(id, user_id).await?;
    Ok(Json(reservation.into()))
}

async fn list_user_reservations(
    State(state): State<AppState>,
    Extension(AuthUser(requester_id)): Extension<AuthUser>,
    Path(owner_id): Path<UserId>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let reservations = state.reservations.list_for_owner(owner_id, requester_id).await?;
    Ok(Json(reservations.into_iter().map(ReservationResponse::from).collect()))
}
