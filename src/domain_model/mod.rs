mod relationship;
mod user;

pub use relationship::*;
pub use user::*;
