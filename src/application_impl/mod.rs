mod relationship_repository_impl;
mod write_sequence;

pub use relationship_repository_impl::*;
pub use write_sequence::*;
