//! Latency histograms
//!
//! Builds from 5.1 serve `latencies:`, plus one `latencies:hist=` command
//! per benchmark histogram a namespace has switched on. Older builds only
//! know the legacy `latency:` command. Benchmark switches are read from the
//! namespace records of the current cycle and take effect on the next one.

use std::collections::BTreeSet;

use tracing::debug;

use super::{Emitter, Round};
use crate::metrics::latency::{decode, LatencyHistogram};
use crate::metrics::{parse_record, LatencyFormat, MetricType, StatContext};
use crate::utils::BuildVersion;

const LATENCIES_MIN_BUILD: BuildVersion = BuildVersion::new(5, 1, 0, 0);

const CURRENT_KEY: &str = "latencies:";
const LEGACY_KEY: &str = "latency:";

/// Namespace flag and the histogram it enables
const BENCHMARK_FLAGS: &[(&str, &str)] = &[
    ("enable-benchmarks-read", "benchmark-read"),
    ("enable-benchmarks-write", "benchmark-write"),
    ("enable-benchmarks-udf", "benchmark-udf"),
    ("enable-benchmarks-batch-sub", "benchmark-batch-sub"),
    ("enable-benchmarks-udf-sub", "benchmark-udf-sub"),
    ("enable-benchmarks-ops-sub", "benchmark-ops-sub"),
    ("enable-hist-proxy", "proxy"),
];

pub struct LatencyWatcher {
    max_buckets: usize,
    disabled: bool,
    /// (namespace, histogram) pairs seen enabled last cycle
    enabled: BTreeSet<(String, String)>,
    commands: Vec<String>,
}

impl LatencyWatcher {
    pub fn new(max_buckets: usize, disabled: bool) -> Self {
        Self {
            max_buckets,
            disabled,
            enabled: BTreeSet::new(),
            commands: Vec::new(),
        }
    }

    pub fn detail(&mut self, round1: &Round<'_>) -> Vec<String> {
        self.commands.clear();
        if self.disabled {
            return Vec::new();
        }

        match round1.build {
            Some(build) if build.at_least(&LATENCIES_MIN_BUILD) => {
                self.commands.push(CURRENT_KEY.to_string());
                for (ns, hist) in &self.enabled {
                    self.commands
                        .push(format!("{}hist={{{}}}-{}", CURRENT_KEY, ns, hist));
                }
            }
            Some(_) => self.commands.push(LEGACY_KEY.to_string()),
            None => debug!("Build unknown, skipping latency request"),
        }
        self.commands.clone()
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        if self.disabled {
            return;
        }
        self.track_benchmarks(round2);

        for command in &self.commands {
            let Some(format) = LatencyFormat::for_command(command) else {
                continue;
            };
            let Some(raw) = round2.get(command) else {
                continue;
            };
            for histogram in decode(format, raw, self.max_buckets) {
                if emitter
                    .registry()
                    .classify(StatContext::Latencies, &histogram.operation)
                    .allowed
                {
                    emit_histogram(&histogram, emitter);
                }
            }
        }
    }

    fn track_benchmarks(&mut self, round2: &Round<'_>) {
        self.enabled.clear();
        for (key, raw) in round2.responses {
            let Some(ns) = key.strip_prefix("namespace/") else {
                continue;
            };
            let record = parse_record(raw, ';');
            for &(flag, hist) in BENCHMARK_FLAGS {
                if record.get(flag) == Some("true") {
                    self.enabled.insert((ns.to_string(), hist.to_string()));
                }
            }
        }
    }
}

fn emit_histogram(histogram: &LatencyHistogram, emitter: &Emitter<'_>) {
    let base = format!("{}_{}", histogram.operation, histogram.unit);
    let bucket_name = format!("{}_bucket", base);

    let mut labels: Vec<(&str, &str)> = Vec::with_capacity(2);
    if !histogram.namespace.is_empty() {
        labels.push(("ns", histogram.namespace.as_str()));
    }

    for bucket in &histogram.buckets {
        let mut bucket_labels = labels.clone();
        bucket_labels.push(("le", bucket.label.as_str()));
        emitter.value(
            StatContext::Latencies,
            &bucket_name,
            MetricType::Gauge,
            bucket.value,
            &bucket_labels,
        );
    }

    emitter.value(
        StatContext::Latencies,
        &format!("{}_count", base),
        MetricType::Gauge,
        histogram.throughput(),
        &labels,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsStore, StatRegistry};
    use crate::watchers::testing::{info, labels};

    #[test]
    fn test_legacy_command_for_old_build() {
        let mut w = LatencyWatcher::new(0, false);
        let round1 = info(&[("build", "4.9.0.3")]);
        assert_eq!(w.detail(&Round::new(&round1)), vec!["latency:"]);
    }

    #[test]
    fn test_disabled_requests_nothing() {
        let mut w = LatencyWatcher::new(0, true);
        let round1 = info(&[("build", "6.0.0.0")]);
        assert!(w.detail(&Round::new(&round1)).is_empty());
    }

    #[test]
    fn test_current_format_emits_buckets_and_count() {
        let mut w = LatencyWatcher::new(0, false);
        let round1 = info(&[("build", "6.3.0.0")]);
        assert_eq!(w.detail(&Round::new(&round1)), vec!["latencies:"]);

        let round2 = info(&[("latencies:", "{test}-write:msec,100,5,0;batch-index:;")]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        let inf = labels(&[("ns", "test"), ("le", "+Inf")]);
        let one = labels(&[("ns", "test"), ("le", "1")]);
        assert_eq!(store.get("aerospike_latencies_write_ms_bucket", &inf), Some(100.0));
        assert_eq!(store.get("aerospike_latencies_write_ms_bucket", &one), Some(95.0));
        assert_eq!(
            store.get("aerospike_latencies_write_ms_count", &labels(&[("ns", "test")])),
            Some(100.0)
        );
        assert_eq!(store.series_count(), 3);
    }

    #[test]
    fn test_benchmarks_feed_next_cycle() {
        let mut w = LatencyWatcher::new(0, false);
        let round1 = info(&[("build", "6.3.0.0")]);
        w.detail(&Round::new(&round1));

        let round2 = info(&[
            (
                "namespace/test",
                "objects=1;enable-benchmarks-read=true;enable-benchmarks-write=false;\
                 enable-hist-proxy=true",
            ),
            ("latencies:", ""),
        ]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        assert_eq!(
            w.detail(&Round::new(&round1)),
            vec![
                "latencies:",
                "latencies:hist={test}-benchmark-read",
                "latencies:hist={test}-proxy",
            ]
        );
    }

    #[test]
    fn test_operation_filter() {
        let mut w = LatencyWatcher::new(0, false);
        let round1 = info(&[("build", "4.8.0.0")]);
        w.detail(&Round::new(&round1));

        let round2 = info(&[(
            "latency:",
            "{test}-read:10:17:37-GMT,ops/sec,>1ms,>8ms;10:17:47,1000,10,1;\
             {test}-write:10:17:37-GMT,ops/sec,>1ms;10:17:47,50,2;",
        )]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new()
            .with_filter(StatContext::Latencies, &[] as &[&str], &["write"])
            .unwrap();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        let eight = labels(&[("ns", "test"), ("le", "8")]);
        assert_eq!(store.get("aerospike_latencies_read_ms_bucket", &eight), Some(990.0));
        assert!(store.samples_with_prefix("aerospike_latencies_write").is_empty());
    }
}
