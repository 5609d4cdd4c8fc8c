//! Core data models for the fuel price service
//!
//! This module contains the types shared by the price cache, the estimator
//! and the HTTP layer, plus the external price source seam and its OpenAI
//! implementation.

pub mod openai;
pub mod period;
pub mod source;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use period::Period;
pub use source::{PriceSource, SourceError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest plausible VLSFO price in USD/MT
pub const MIN_PLAUSIBLE_PRICE: u32 = 400;

/// Highest plausible VLSFO price in USD/MT
pub const MAX_PLAUSIBLE_PRICE: u32 = 999;

/// A price stored in the durable cache
///
/// Serialized as `{"price": 512, "timestamp": 1744704000000}` with the
/// timestamp in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPrice {
    /// Price in USD/MT
    pub price: u32,
    /// When the price was obtained
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

/// Where a successful price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrigin {
    /// Read from the price cache
    Cache,
    /// Freshly estimated by the external price source
    Estimate,
}

/// A validated VLSFO price for a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    /// Price in USD/MT, always within the plausible range
    pub price: u32,
    /// The month the price pertains to
    pub period: Period,
    /// Whether the price came from cache or a fresh estimate
    pub origin: PriceOrigin,
}

/// JSON body returned by `GET /api/vlsfo-price`
///
/// `price` is `null` exactly when `is_error` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQueryResult {
    /// Price in USD/MT, absent on failure
    pub price: Option<u32>,
    /// English month name
    pub month: String,
    /// Four-digit year
    pub year: i32,
    /// Whether the lookup failed
    pub is_error: bool,
    /// User-facing failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
