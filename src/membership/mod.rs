use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("Membership query failed: {0}")]
    QueryFailed(String),
}

/// Answers whether a user currently belongs to every required channel.
/// The engine treats a query error the same as non-membership.
#[async_trait]
pub trait MembershipGate: Send + Sync {
    async fn is_member_of_all(&self, user_id: i64) -> Result<bool, MembershipError>;
}
