pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod reservation_repo;
pub mod access_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use catalog_repo::PgCatalogReader;
pub use reservation_repo::PgReservationStore;
pub use access_repo::PgAccessControl;

use rokadan_core::BookingError;

/// Any sqlx failure is a storage failure; it is passed up without retry
pub(crate) fn db_err(err: sqlx::Error) -> BookingError {
    tracing::error!(error = %err, "Database error");
    BookingError::io(err)
}
