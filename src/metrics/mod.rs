//! Stat parsing, classification and export
//!
//! This module provides:
//! - A token scanner over raw info responses
//! - Flat `key=value` record parsing and numeric coercion
//! - Per-context allow/block filtering and gauge/counter typing
//! - Decomposition of indexed device/mount stats
//! - Latency histogram decoding (legacy and current formats)
//! - The metric sink and an in-memory exposition store

pub mod array_stats;
pub mod gauges;
pub mod latency;
pub mod record;
pub mod registry;
pub mod scanner;
pub mod sink;

pub use array_stats::{ArrayMatch, ArrayStat, ArrayStatExtractor};
pub use latency::{LatencyBucket, LatencyFormat, LatencyHistogram};
pub use record::{coerce_numeric, parse_list, parse_record, parse_records, StatRecord};
pub use registry::{ClassifiedStat, MetricType, StatContext, StatFilter, StatRegistry};
pub use scanner::{InfoScanner, Token};
pub use sink::{help_text, normalize_name, Labels, MetricSample, MetricsSink, MetricsStore};
