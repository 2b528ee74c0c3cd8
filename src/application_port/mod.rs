mod relationship_repository;

pub use relationship_repository::*;
