use async_trait::async_trait;
use std::collections::HashSet;

use rokadan_shared::UserId;

use crate::BookingResult;

/// Auth collaborator: answers whether a user holds the administrator role.
/// The requester id itself is trusted as given.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn is_admin(&self, user_id: UserId) -> BookingResult<bool>;
}

/// Fixed set of administrators, for tests and single-admin deployments
#[derive(Debug, Clone, Default)]
pub struct StaticAccessControl {
    admins: HashSet<UserId>,
}

impl StaticAccessControl {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AccessControl for StaticAccessControl {
    async fn is_admin(&self, user_id: UserId) -> BookingResult<bool> {
        let admin = self.admins.contains(&user_id);
        tracing::debug!(%user_id, admin, "Resolved admin capability");
        Ok(admin)
    }
}
