// store

mod relationship_store;

pub use relationship_store::*;

// identity

mod identity;

pub use identity::*;
