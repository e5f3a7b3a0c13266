pub type PlatenResult<T> = Result<T, PlatenError>;

#[derive(thiserror::Error, Debug)]
pub enum PlatenError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("scene structure error: {0}")]
    Structure(String),

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlatenError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }
}
