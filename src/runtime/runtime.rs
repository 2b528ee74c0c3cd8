use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;

/// Store and repository built from settings.
pub struct Runtime {
    pub store: Arc<dyn RelationshipStore>,
    pub repository: Arc<dyn RelationshipRepository>,
}

impl Runtime {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn RelationshipStore> = match settings.store.backend.as_str() {
            "memory" => {
                warn!("memory store selected, relationships are not persisted");
                Arc::new(MemoryRelationshipStore::new())
            }
            "redis" => {
                let url = settings
                    .store
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.redis_url is required for the redis backend"))?;
                let client = redis::Client::open(url)?;
                let manager = client.get_connection_manager().await?;
                Arc::new(RedisRelationshipStore::new(
                    manager,
                    settings.store.key_prefix.clone(),
                ))
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let repository: Arc<dyn RelationshipRepository> =
            Arc::new(RealRelationshipRepository::new(store.clone()));

        info!(backend = %settings.store.backend, "relationship runtime ready");

        Ok(Self { store, repository })
    }
}
