use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("step {0}: {1}")]
    Step(usize, String),
}
