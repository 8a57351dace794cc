//! Activity Log Use Case

use std::sync::Arc;

use kernel::access::{Actor, Permission};

use crate::domain::entities::ActivityLogEntry;
use crate::domain::repository::ActivityLogRepository;
use crate::error::InventoryResult;

pub struct ActivityLogUseCase<A>
where
    A: ActivityLogRepository,
{
    activity_repo: Arc<A>,
}

impl<A> ActivityLogUseCase<A>
where
    A: ActivityLogRepository,
{
    pub fn new(activity_repo: Arc<A>) -> Self {
        Self { activity_repo }
    }

    /// Every entry, admins only
    pub async fn list_all(&self, actor: &Actor) -> InventoryResult<Vec<ActivityLogEntry>> {
        actor.authorize(Permission::ViewAllActivity)?;
        self.activity_repo.list_activity(None).await
    }

    /// The caller's own entries
    pub async fn list_own(&self, actor: &Actor) -> InventoryResult<Vec<ActivityLogEntry>> {
        actor.authorize(Permission::ViewOwnActivity)?;
        self.activity_repo.list_activity(Some(&actor.user_id)).await
    }
}
