//! Fleetfuel library
//!
//! This module exposes the price cache, estimator, calculator and HTTP API for
//! use by the binary and integration tests.

pub mod cache;
pub mod calculator;
pub mod cli;
pub mod data;
pub mod estimator;
pub mod server;
