//! aerospike-info-exporter library
//!
//! Polls an Aerospike node over the info protocol and republishes its
//! statistics as labeled gauge/counter series.

pub mod client;
pub mod config;
pub mod metrics;
pub mod observer;
pub mod utils;
pub mod watchers;
