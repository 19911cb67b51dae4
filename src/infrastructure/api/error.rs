use std::time::Duration;

use thiserror::Error;

/// Failure taxonomy for backend calls. `RateLimited` is the only variant the
/// worker retries (once, for the chat endpoint); everything else surfaces as
/// an error bubble with the display text below.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limited")]
    RateLimited { retry_after: Duration },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Server error")]
    Transport(#[from] reqwest::Error),

    #[error("Could not read attachment")]
    Attachment(#[from] std::io::Error),
}
