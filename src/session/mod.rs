mod relationship_controller;

pub use relationship_controller::*;
