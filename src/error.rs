use thiserror::Error;

/// Failure of a single console command. Neither kind ends the session.
#[derive(Debug, Error)]
pub enum Error {
    /// An operand could not be parsed or resolved.
    #[error("{0}")]
    Format(String),
    /// The host call failed; the connection may be unusable afterwards.
    #[error(transparent)]
    Remote(#[from] zbus::Error),
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
