pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use math::{GeoPoint, InvalidAnchorError, MercatorCoordinate};
