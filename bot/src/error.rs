use std::path::PathBuf;

/// Errors raised while setting a driver up. Per-tick driving never fails.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("steering lock must be positive, got {0}")]
    InvalidSteerLock(f32),

    #[error("invalid car: {0}")]
    InvalidCar(String),

    #[error("invalid driver config: {0}")]
    InvalidConfig(String),

    #[error("race started before a track was assigned")]
    MissingTrack,

    #[error("failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse driver config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("track has no segments")]
    Empty,

    #[error("segment {index}: {reason}")]
    InvalidSegment { index: usize, reason: String },
}
