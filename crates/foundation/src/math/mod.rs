pub mod geodesy;
pub mod geo_point;
pub mod mercator;

pub use geo_point::*;
pub use geodesy::*;
pub use mercator::*;
