//! Cache module for storing estimated fuel prices on disk
//!
//! This module provides a store that persists one price per calendar month to
//! a JSON file, so the external estimation service is asked at most once per
//! month across process restarts.

mod manager;

pub use manager::{CacheError, PriceCacheStore};
