use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("expected \"lat,lng\", got {0:?}")]
    InvalidFormat(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is not finite")]
    InvalidLongitude(f64),
}
