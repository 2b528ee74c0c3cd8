use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// In-process relationship store. Each call locks only the touched user's entry.
#[derive(Debug, Default)]
pub struct MemoryRelationshipStore {
    records: DashMap<UserId, UserRelationshipRecord>,
}

impl MemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl RelationshipStore for MemoryRelationshipStore {
    async fn get(&self, user_id: UserId) -> Result<Option<UserRelationshipRecord>, StoreError> {
        Ok(self.records.get(&user_id).map(|r| r.value().clone()))
    }

    async fn set_field(
        &self,
        user_id: UserId,
        path: FieldPath,
        value: FieldValue,
    ) -> Result<(), StoreError> {
        if !path.accepts(&value) {
            return Err(StoreError::InvalidValue(path.to_string()));
        }
        let mut record = self.records.entry(user_id).or_default();
        record.set(&path, value);
        Ok(())
    }

    async fn delete_field(&self, user_id: UserId, path: FieldPath) -> Result<(), StoreError> {
        if let Some(mut record) = self.records.get_mut(&user_id) {
            record.delete(&path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (UserId, UserId) {
        (UserId::from_username("ada"), UserId::from_username("bob"))
    }

    #[tokio::test]
    async fn absent_record_reads_as_none() {
        let store = MemoryRelationshipStore::new();
        let (a, _) = ids();
        assert_eq!(store.get(a).await.unwrap(), None);
    }

    #[tokio::test]
    async fn first_write_creates_the_record() {
        let store = MemoryRelationshipStore::new();
        let (a, b) = ids();
        store
            .set_field(a, FieldPath::own_request(b), FieldValue::Member)
            .await
            .unwrap();
        let record = store.get(a).await.unwrap().unwrap();
        assert!(record.own_requests.contains(&b));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn deleting_absent_entries_succeeds() {
        let store = MemoryRelationshipStore::new();
        let (a, b) = ids();
        store.delete_field(a, FieldPath::link(b)).await.unwrap();
        assert!(store.is_empty());

        store
            .set_field(a, FieldPath::link(b), FieldValue::Link(LinkMeta::linked()))
            .await
            .unwrap();
        store.delete_field(a, FieldPath::own_request(b)).await.unwrap();
        store.delete_field(a, FieldPath::link(b)).await.unwrap();
        store.delete_field(a, FieldPath::link(b)).await.unwrap();
        assert!(store.get(a).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_value_is_rejected() {
        let store = MemoryRelationshipStore::new();
        let (a, b) = ids();
        let err = store
            .set_field(a, FieldPath::link(b), FieldValue::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue(_)));
        assert!(store.is_empty());
    }
}
