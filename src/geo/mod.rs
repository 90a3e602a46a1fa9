mod coordinate;
mod error;
mod geofence;

pub use coordinate::Coordinate;
pub use geofence::Geofence;
