//! Branch-scoped authorization checks

use shared::models::Branch;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::store::InventoryStore;

pub use crate::middleware::Access;

/// Load `branch_id` and check that `user` may perform `access` on it
pub async fn authorize_branch(
    store: &dyn InventoryStore,
    user: &AuthUser,
    branch_id: Uuid,
    access: Access,
) -> AppResult<Branch> {
    let branch = store
        .find_branch(branch_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;

    if !user.can_access(&branch, access) {
        tracing::debug!(
            user_id = %user.user_id,
            branch_id = %branch_id,
            ?access,
            "branch access denied"
        );
        return Err(AppError::InsufficientPermissions);
    }

    Ok(branch)
}
