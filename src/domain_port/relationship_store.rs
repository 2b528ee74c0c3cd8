use crate::domain_model::*;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("value does not fit field {0}")]
    InvalidValue(String),
    #[error("store error: {0}")]
    Backend(String),
}

/// Per-user relationship documents with single-document atomic field updates.
///
/// There is no cross-document primitive: every call touches exactly one record.
/// Failed calls are reported, never retried here.
#[async_trait::async_trait]
pub trait RelationshipStore: Send + Sync {
    /// `Ok(None)` when the user has no record yet.
    async fn get(&self, user_id: UserId) -> Result<Option<UserRelationshipRecord>, StoreError>;

    /// Creates the record on first write.
    async fn set_field(
        &self,
        user_id: UserId,
        path: FieldPath,
        value: FieldValue,
    ) -> Result<(), StoreError>;

    /// Deleting an absent entry (or from an absent record) succeeds.
    async fn delete_field(&self, user_id: UserId, path: FieldPath) -> Result<(), StoreError>;
}
