use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("invalid radius: {0} km")]
    InvalidRadius(f64),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("routing failed: {0}")]
    Routing(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "osrm")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_coordinate(latitude: f64, longitude: f64) -> Self {
        Self::InvalidCoordinate {
            latitude,
            longitude,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn routing(message: impl Into<String>) -> Self {
        Self::Routing(message.into())
    }
}
