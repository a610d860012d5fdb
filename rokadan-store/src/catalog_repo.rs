use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rokadan_catalog::{Cabin, Service};
use rokadan_core::{BookingError, BookingResult, CatalogReader};
use rokadan_shared::{CabinId, ServiceId};

use crate::db_err;

pub struct PgCatalogReader {
    pool: PgPool,
}

impl PgCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CabinRow {
    id: Uuid,
    nombre: String,
    precio_noche: i64,
    capacidad: i32,
    descripcion: Option<String>,
    destacada: bool,
}

impl From<CabinRow> for Cabin {
    fn from(row: CabinRow) -> Self {
        Cabin {
            id: CabinId(row.id),
            name: row.nombre,
            nightly_price: row.precio_noche,
            capacity: u32::try_from(row.capacidad).unwrap_or(0),
            description: row.descripcion,
            featured: row.destacada,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    nombre: String,
    precio: i64,
    descripcion: Option<String>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: ServiceId(row.id),
            name: row.nombre,
            price: row.precio,
            description: row.descripcion,
        }
    }
}

const CABIN_COLUMNS: &str = "id, nombre, precio_noche, capacidad, descripcion, destacada";

#[async_trait]
impl CatalogReader for PgCatalogReader {
    async fn get_cabin(&self, id: CabinId) -> BookingResult<Cabin> {
        let row: Option<CabinRow> =
            sqlx::query_as(&format!("SELECT {CABIN_COLUMNS} FROM cabanas WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(Cabin::from)
            .ok_or_else(|| BookingError::not_found("Cabin", id))
    }

    async fn get_service(&self, id: ServiceId) -> BookingResult<Service> {
        let row: Option<ServiceRow> =
            sqlx::query_as("SELECT id, nombre, precio, descripcion FROM servicios WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(Service::from)
            .ok_or_else(|| BookingError::not_found("Service", id))
    }

    async fn list_cabins(&self) -> BookingResult<Vec<Cabin>> {
        let rows: Vec<CabinRow> = sqlx::query_as(&format!(
            "SELECT {CABIN_COLUMNS} FROM cabanas ORDER BY destacada DESC, nombre"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Cabin::from).collect())
    }
}
