mod relationship_store_redis;

pub use relationship_store_redis::*;
