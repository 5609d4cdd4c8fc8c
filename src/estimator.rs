//! Cache-or-fetch estimation of last month's VLSFO price
//!
//! The estimator answers "what was the benchmark fuel price last month" by
//! consulting the price cache first and asking the external price source only
//! on a miss. Whatever the source says is treated as untrusted: it must parse
//! as a JSON object with a numeric `price` inside the plausible range before
//! it is cached or returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::cache::PriceCacheStore;
use crate::data::{
    CachedPrice, Period, PriceOrigin, PriceQueryResult, PriceQuote, PriceSource, SourceError,
    MAX_PLAUSIBLE_PRICE, MIN_PLAUSIBLE_PRICE,
};

/// User-facing message when no credential is configured
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Price estimation credential missing";

/// User-facing message for every other failure
pub const UNAVAILABLE_MESSAGE: &str = "Unable to fetch current price";

/// Reasons an estimate's content was rejected
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The content is not a JSON object
    #[error("Response is not a JSON object: {0}")]
    Malformed(String),

    /// The object has no numeric `price` field
    #[error("Response has no numeric price field")]
    MissingPrice,

    /// The rounded price falls outside the plausible range
    #[error("Price {0} is outside the expected range 400-999")]
    OutOfRange(f64),
}

/// Why a price could not be produced
#[derive(Debug, Error)]
pub enum PriceErrorKind {
    /// No credential for the price source; the source was not called
    #[error("Price estimation credential missing")]
    MissingCredential,

    /// The source failed to answer
    #[error("Unable to fetch current price: {0}")]
    Source(#[source] SourceError),

    /// The source answered with unusable content
    #[error("Unable to fetch current price: {0}")]
    Validation(#[source] ValidationError),
}

/// A failed price lookup for a specific period
#[derive(Debug, Error)]
#[error("{kind} ({period})")]
pub struct PriceError {
    /// The month the lookup was for
    pub period: Period,
    /// What went wrong
    #[source]
    pub kind: PriceErrorKind,
}

impl PriceError {
    /// Message suitable for showing to end users
    ///
    /// Source and validation failures share one generic message; the detail
    /// is only logged.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            PriceErrorKind::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            PriceErrorKind::Source(_) | PriceErrorKind::Validation(_) => UNAVAILABLE_MESSAGE,
        }
    }
}

impl From<Result<PriceQuote, PriceError>> for PriceQueryResult {
    fn from(result: Result<PriceQuote, PriceError>) -> Self {
        match result {
            Ok(quote) => PriceQueryResult {
                price: Some(quote.price),
                month: quote.period.month_name().to_string(),
                year: quote.period.year(),
                is_error: false,
                error_message: None,
            },
            Err(err) => PriceQueryResult {
                price: None,
                month: err.period.month_name().to_string(),
                year: err.period.year(),
                is_error: true,
                error_message: Some(err.user_message().to_string()),
            },
        }
    }
}

/// Produces last month's VLSFO price using cache-or-fetch semantics
pub struct PriceEstimator {
    cache: PriceCacheStore,
    source: Arc<dyn PriceSource>,
}

impl PriceEstimator {
    /// Creates an estimator that owns `cache` and asks `source` on misses
    pub fn new(cache: PriceCacheStore, source: Arc<dyn PriceSource>) -> Self {
        Self { cache, source }
    }

    /// The cache this estimator reads and writes
    pub fn cache(&self) -> &PriceCacheStore {
        &self.cache
    }

    /// Price for the calendar month before the current UTC month
    pub async fn current_price(&self) -> Result<PriceQuote, PriceError> {
        self.current_price_at(Utc::now()).await
    }

    /// Price for the calendar month before `now`'s month
    ///
    /// Never panics; every failure is returned as a [`PriceError`]. Cache read
    /// and write failures are logged and do not fail the lookup.
    #[instrument(skip(self), fields(period = tracing::field::Empty))]
    pub async fn current_price_at(&self, now: DateTime<Utc>) -> Result<PriceQuote, PriceError> {
        let period = Period::preceding(now);
        let key = period.key();
        tracing::Span::current().record("period", key.as_str());

        match self.cache.get(&key) {
            Ok(Some(cached)) => {
                info!(price = cached.price, "fuel price cache hit");
                return Ok(PriceQuote {
                    price: cached.price,
                    period,
                    origin: PriceOrigin::Cache,
                });
            }
            Ok(None) => info!("fuel price cache miss"),
            Err(e) => warn!(error = %e, "fuel price cache unreadable, treating as miss"),
        }

        let price = self.estimate(period).await.map_err(|kind| {
            error!(error = %kind, "fuel price estimation failed");
            PriceError { period, kind }
        })?;

        let cached = CachedPrice {
            price,
            captured_at: now,
        };
        if let Err(e) = self.cache.put(&key, cached) {
            warn!(error = %e, "failed to persist fuel price");
        }

        info!(price, "fuel price estimated");
        Ok(PriceQuote {
            price,
            period,
            origin: PriceOrigin::Estimate,
        })
    }

    async fn estimate(&self, period: Period) -> Result<u32, PriceErrorKind> {
        if !self.source.has_credential() {
            return Err(PriceErrorKind::MissingCredential);
        }

        let content = self
            .source
            .request_price(&period)
            .await
            .map_err(|e| match e {
                SourceError::MissingCredential => PriceErrorKind::MissingCredential,
                other => PriceErrorKind::Source(other),
            })?;

        validate_price(&content).map_err(PriceErrorKind::Validation)
    }
}

/// Parses and sanity-checks a price estimate
///
/// Accepts a JSON object with a numeric `price` field, optionally surrounded
/// by prose or a code fence. The price is rounded to the nearest whole dollar
/// (halves away from zero) and must fall within
/// [`MIN_PLAUSIBLE_PRICE`]..=[`MAX_PLAUSIBLE_PRICE`].
pub fn validate_price(content: &str) -> Result<u32, ValidationError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json_str = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => return Err(ValidationError::Malformed("no JSON object found".to_string())),
    };

    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let raw = value
        .as_object()
        .ok_or_else(|| ValidationError::Malformed("top-level value is not an object".to_string()))?
        .get("price")
        .and_then(serde_json::Value::as_f64)
        .ok_or(ValidationError::MissingPrice)?;

    let rounded = raw.round();
    if rounded < f64::from(MIN_PLAUSIBLE_PRICE) || rounded > f64::from(MAX_PLAUSIBLE_PRICE) {
        return Err(ValidationError::OutOfRange(rounded));
    }

    // In range, so the conversion is exact
    Ok(rounded as u32)
}
