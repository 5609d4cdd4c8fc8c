//! The external price estimation seam
//!
//! A `PriceSource` is anything that can be asked for the benchmark VLSFO price
//! of a calendar month and answers with raw, untrusted text. Validation of
//! that text happens in the estimator, never in the source.

use async_trait::async_trait;
use thiserror::Error;

use super::Period;

/// Errors that can occur when asking a price source for an estimate
#[derive(Debug, Error)]
pub enum SourceError {
    /// No API credential is configured for the source
    #[error("API credential is not configured")]
    MissingCredential,

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response carried no assistant message content
    #[error("Response contained no message content")]
    MissingContent,
}

/// A third-party capability that estimates a monthly fuel price
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Whether an access credential is available
    ///
    /// The estimator never calls [`PriceSource::request_price`] when this
    /// returns `false`.
    fn has_credential(&self) -> bool;

    /// Asks for the monthly average VLSFO price of `period`
    ///
    /// Returns the raw response text, expected to hold a JSON object with a
    /// numeric `price` field.
    async fn request_price(&self, period: &Period) -> Result<String, SourceError>;
}
