//! Hook for releasing per-user bookkeeping held outside the hub.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::UserId;

/// Releases resources tied to a user (rate-limit buckets, caches) when the
/// account is deleted. Must be idempotent.
#[async_trait]
pub trait UserResourceRelease: Send + Sync + std::fmt::Debug + 'static {
    /// Drop everything held for `user_id`.
    async fn release(&self, user_id: UserId) -> AppResult<()>;
}
