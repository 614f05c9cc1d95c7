//! Set statistics
//!
//! `sets` returns one `:`-joined record per set. Only a small fixed table of
//! stats is exported, all as gauges.

use super::{Emitter, Round};
use crate::metrics::{parse_records, MetricType, StatContext};

const SETS_KEY: &str = "sets";

const SET_METRICS: &[(&str, MetricType)] = &[
    ("objects", MetricType::Gauge),
    ("tombstones", MetricType::Gauge),
    ("memory_data_bytes", MetricType::Gauge),
    ("device_data_bytes", MetricType::Gauge),
    ("truncate_lut", MetricType::Gauge),
    ("stop-writes-count", MetricType::Gauge),
    ("disable-eviction", MetricType::Gauge),
];

#[derive(Default)]
pub struct SetWatcher;

impl SetWatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn detail(&self) -> Vec<String> {
        vec![SETS_KEY.to_string()]
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        let Some(raw) = round2.get(SETS_KEY) else {
            return;
        };

        for record in parse_records(raw, ';', ':') {
            // Older builds spell the identity fields ns_name/set_name
            let ns = record.get("ns").or_else(|| record.get("ns_name")).unwrap_or("");
            let set = record.get("set").or_else(|| record.get("set_name")).unwrap_or("");
            let labels = [("ns", ns), ("set", set)];

            for &(stat, metric_type) in SET_METRICS {
                if let Some(value) = record.get(stat) {
                    emitter.fixed_stat(StatContext::Set, stat, value, metric_type, &labels);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsStore, StatRegistry};
    use crate::watchers::testing::{info, labels};

    #[test]
    fn test_fixed_table_only() {
        let round2 = info(&[(
            "sets",
            "ns=test:set=demo:objects=10:tombstones=0:memory_data_bytes=2048:\
             truncate_lut=0:stop-writes-count=0:disable-eviction=false:sindexes=1;\
             ns=bar:set=users:objects=3;",
        )]);

        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        SetWatcher::new().refresh(&Round::new(&round2), &emitter);

        let demo = labels(&[("ns", "test"), ("set", "demo")]);
        assert_eq!(store.get("aerospike_sets_objects", &demo), Some(10.0));
        assert_eq!(store.get("aerospike_sets_disable_eviction", &demo), Some(0.0));
        assert_eq!(store.get("aerospike_sets_sindexes", &demo), None);

        let users = labels(&[("ns", "bar"), ("set", "users")]);
        assert_eq!(store.get("aerospike_sets_objects", &users), Some(3.0));
        assert_eq!(store.series_count(), 7);
    }

    #[test]
    fn test_blocklist_applies() {
        let round2 = info(&[("sets", "ns=test:set=demo:objects=10:tombstones=4")]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new()
            .with_filter(StatContext::Set, &[] as &[&str], &["tomb*"])
            .unwrap();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        SetWatcher::new().refresh(&Round::new(&round2), &emitter);
        assert_eq!(store.series_count(), 1);
    }
}
