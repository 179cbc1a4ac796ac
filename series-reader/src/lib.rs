//! Remote-read adapter: answers batch read requests by querying a time-series store one
//! query at a time, and reports the store's health.

pub mod config;
pub mod memory;
pub mod prompb;
pub mod read;
pub mod reader;
pub mod remote;
pub mod routes;
pub mod state;

pub use reader::{DbReader, HealthChecker, Querier, QueryHealthChecker, Reader};
