pub mod diff;
pub mod schema;
pub mod smoothing;
pub mod snapshot;
