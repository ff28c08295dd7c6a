#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

/// Failures a backend reports in a form callers can branch on.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("No API key has been configured")]
    MissingCredential,

    #[error("Rate limited by the backend: {0}")]
    RateLimited(String),

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_rate_limit(&self) -> bool {
        return matches!(self, BackendError::RateLimited(_));
    }

    pub fn is_missing_credential(&self) -> bool {
        return matches!(self, BackendError::MissingCredential);
    }

    /// Looks through an `anyhow` chain for a rate limit.
    pub fn is_rate_limit_err(err: &anyhow::Error) -> bool {
        return err
            .downcast_ref::<BackendError>()
            .map_or(false, |e| return e.is_rate_limit());
    }

    pub fn is_missing_credential_err(err: &anyhow::Error) -> bool {
        return err
            .downcast_ref::<BackendError>()
            .map_or(false, |e| return e.is_missing_credential());
    }
}
