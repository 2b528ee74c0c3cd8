use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ErrorKind, RedisError};
use std::collections::HashMap;

const MEMBER_MARKER: &str = "1";

/// One redis hash per user; hash fields are dotted paths like `links.<id>`.
pub struct RedisRelationshipStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRelationshipStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRelationshipStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, user_id: UserId) -> String {
        format!("{}:{}", self.prefix, user_id)
    }
}

fn store_error(e: RedisError) -> StoreError {
    match e.kind() {
        ErrorKind::AuthenticationFailed => StoreError::PermissionDenied(e.to_string()),
        ErrorKind::IoError => StoreError::Unavailable(e.to_string()),
        _ if e.is_connection_dropped() || e.is_timeout() => StoreError::Unavailable(e.to_string()),
        _ => StoreError::Backend(e.to_string()),
    }
}

fn encode_value(value: &FieldValue) -> Result<String, StoreError> {
    match value {
        FieldValue::Member => Ok(MEMBER_MARKER.to_string()),
        FieldValue::Link(meta) => {
            serde_json::to_string(meta).map_err(|e| StoreError::Backend(e.to_string()))
        }
    }
}

/// Rebuilds a record from raw hash entries, skipping entries that do not decode.
fn decode_record(user_id: UserId, raw: HashMap<String, String>) -> UserRelationshipRecord {
    let mut record = UserRelationshipRecord::default();
    for (field, value) in raw {
        let Some(path) = FieldPath::parse(&field) else {
            tracing::warn!(%user_id, field = %field, "skipping unknown record field");
            continue;
        };
        let value = match path.field {
            RecordField::Links => match serde_json::from_str::<LinkMeta>(&value) {
                Ok(meta) => FieldValue::Link(meta),
                Err(e) => {
                    tracing::warn!(%user_id, field = %field, "skipping undecodable link: {e}");
                    continue;
                }
            },
            RecordField::OwnRequests | RecordField::IncomingRequests => FieldValue::Member,
        };
        record.set(&path, value);
    }
    record
}

#[async_trait::async_trait]
impl RelationshipStore for RedisRelationshipStore {
    async fn get(&self, user_id: UserId) -> Result<Option<UserRelationshipRecord>, StoreError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(&key).await.map_err(store_error)?;
        // redis drops empty hashes, so an emptied record reads as absent too
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode_record(user_id, raw)))
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
        let key = self.key(user_id);
        let encoded = encode_value(&value)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(&key, path.to_string(), encoded)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn delete_field(&self, user_id: UserId, path: FieldPath) -> Result<(), StoreError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .hdel(&key, path.to_string())
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_skips_garbage_and_keeps_valid_entries() {
        let owner = UserId::from_username("ada");
        let friend = UserId::from_username("bob");
        let requester = UserId::from_username("cy");
        let raw = HashMap::from([
            (format!("links.{friend}"), r#"{"status":"linked"}"#.to_string()),
            (format!("incomingRequests.{requester}"), "1".to_string()),
            ("links.not-a-uuid".to_string(), "1".to_string()),
            (format!("links.{requester}"), "oops".to_string()),
            ("nickname".to_string(), "ada".to_string()),
        ]);
        let record = decode_record(owner, raw);
        assert_eq!(record.link_ids(), vec![friend]);
        assert!(record.incoming_requests.contains(&requester));
        assert!(record.own_requests.is_empty());
    }

    #[test]
    fn link_value_encodes_as_status_json() {
        let encoded = encode_value(&FieldValue::Link(LinkMeta::linked())).unwrap();
        assert_eq!(encoded, r#"{"status":"linked"}"#);
        assert_eq!(encode_value(&FieldValue::Member).unwrap(), MEMBER_MARKER);
    }
}
