use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Projection error: {0}")]
    Projection(#[from] ProjError),

    #[error(transparent)]
    Coordinates(#[from] CoordinateError),

    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjError {
    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("Transform failed: {0}")]
    TransformFailed(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Rejected coordinate input. Raised before any projection math runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Coordinates are not valid")]
    NotValid,

    #[error("Invalid coordinates")]
    Invalid,

    #[error("Invalid coordinates. Requires two or three components per element")]
    ComponentsPerElement,

    #[error("Number of components should be two or three, got {0}")]
    ComponentCount(usize),
}

/// Failure to resolve a CRS code through the remote lookup service.
///
/// `Clone` so a single in-flight request can hand the same outcome to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unsupported projection scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Projection not found: {0}")]
    NotFound(String),

    #[error("Lookup request failed: {0}")]
    Http(String),

    #[error("Malformed lookup response: {0}")]
    Decode(String),

    #[error("Lookup task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache capacity must be at least 1")]
    ZeroCapacity,

    #[error("{0}")]
    Parse(String),
}
