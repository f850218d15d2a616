use crate::scheduler::DelayError;

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the pipeline can
/// report failures to the submitter consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid delay: {0}")]
    InvalidDelay(#[from] DelayError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
