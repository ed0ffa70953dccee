use thiserror::Error;

/// Failures surfaced by [`NewsClient`](super::NewsClient).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsError {
    #[error("access error")]
    AccessError,

    #[error("page not found")]
    PageNotFound,

    #[error("server error")]
    ServerError,

    #[error("unknown error")]
    UnknownError,
}

impl NewsError {
    /// Map a non-200 HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            403 => NewsError::AccessError,
            404 => NewsError::PageNotFound,
            500 => NewsError::ServerError,
            _ => NewsError::UnknownError,
        }
    }
}
