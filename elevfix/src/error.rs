use thiserror::Error;

/// Result type for elevation resolution.
pub type Result<T> = std::result::Result<T, ElevfixError>;

#[derive(Error, Debug)]
pub enum ElevfixError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Invalid caller-supplied configuration or input shape.
    #[error("configuration: {0}")]
    Config(String),

    #[error("invalid smoothing window {window}: {reason}")]
    InvalidWindow { window: usize, reason: &'static str },

    #[error("polynomial degree {degree} must be less than window {window}")]
    InvalidDegree { degree: usize, window: usize },

    /// A tile file exists but does not hold a valid raster.
    #[error("malformed tile: {0}")]
    MalformedTile(String),

    /// Smoothing needs a dense altitude sequence.
    #[error("no altitude for coordinate at index {index}")]
    UnresolvedAltitude { index: usize },

    #[error("ASCII raster is not well formed: {0}")]
    AscFormat(String),

    #[error("least squares fit failed: {0}")]
    LeastSquares(&'static str),
}
