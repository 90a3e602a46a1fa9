use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("routing service unavailable: {0}")]
    Unavailable(String),
    #[error("no route found")]
    NoRouteFound,
}
