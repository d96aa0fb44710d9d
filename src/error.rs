//! Error types for the lookup and directions collaborators.
//!
//! None of these escape the router: the resolver and day router catch them
//! at the call site, log a warning and carry on with the remaining rows.

/// Failure to turn a place id, map link or query into a coordinate.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// HTTP request failed (network error, timeout, redirect loop)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-OK status
    #[error("lookup service returned {status}: {message}")]
    Status { status: String, message: String },

    /// The query matched nothing
    #[error("no result for {0:?}")]
    NoResult(String),

    /// A result came back without usable coordinates
    #[error("result for {0:?} has no geometry")]
    MissingGeometry(String),

    /// The map link could not be parsed as a URL
    #[error("invalid map link {0:?}")]
    InvalidLink(String),
}

/// Failure to compute a walking path.
#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-OK status
    #[error("directions service returned {status}: {message}")]
    Status { status: String, message: String },

    /// The service found no walkable route between the stops
    #[error("no walking route between {0} stops")]
    NoRoute(usize),

    /// Fewer than two stops were supplied
    #[error("a route needs at least two stops, got {0}")]
    TooFewStops(usize),
}
