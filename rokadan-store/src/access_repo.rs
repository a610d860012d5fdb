use async_trait::async_trait;
use sqlx::PgPool;

use rokadan_core::{AccessControl, BookingResult};
use rokadan_shared::UserId;

use crate::db_err;

/// Admin capability read from `usuarios.rol`. Unknown users are not admins.
pub struct PgAccessControl {
    pool: PgPool,
}

impl PgAccessControl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessControl for PgAccessControl {
    async fn is_admin(&self, user_id: UserId) -> BookingResult<bool> {
        let role: Option<(String,)> = sqlx::query_as("SELECT rol FROM usuarios WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let admin = matches!(role, Some((rol,)) if rol == "admin");
        tracing::debug!(%user_id, admin, "Resolved admin capability");
        Ok(admin)
    }
}
