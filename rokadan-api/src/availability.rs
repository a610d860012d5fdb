use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rokadan_catalog::Cabin;
use rokadan_shared::CabinId;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    #[serde(default = "one")]
    pub adultos: u32,
    #[serde(default)]
    pub ninos: u32,
}

fn one() -> u32 { 1 }

#[derive(Debug, Serialize, Deserialize)]
pub struct CabinResponse {
    pub id: CabinId,
    pub nombre: String,
    pub precio_noche: i64,
    pub capacidad: u32,
    pub descripcion: Option<String>,
    pub destacada: bool,
}

impl From<Cabin> for CabinResponse {
    fn from(cabin: Cabin) -> Self {
        Self {
            id: cabin.id,
            nombre: cabin.name,
            precio_noche: cabin.nightly_price,
            capacidad: cabin.capacity,
            descripcion: cabin.description,
            destacada: cabin.featured,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/cabanas/disponibles", get(available_cabins))
}

async fn available_cabins(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<CabinResponse>>, AppError> {
    let cabins = state.reservations
        .availability()
        .available_cabins(query.fecha_inicio, query.fecha_fin, query.adultos, query.ninos)
        .await?;

    Ok(Json(cabins.into_iter().map(CabinResponse::from).collect()))
}
