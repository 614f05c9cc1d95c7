//! Namespace statistics

use super::{Emitter, Round};
use crate::metrics::{parse_list, parse_record, ArrayMatch, ArrayStatExtractor, StatContext};

pub struct NamespaceWatcher {
    extractor: ArrayStatExtractor,
    namespaces: Vec<String>,
}

impl NamespaceWatcher {
    pub fn new(extractor: ArrayStatExtractor) -> Self {
        Self {
            extractor,
            namespaces: Vec::new(),
        }
    }

    pub fn discover(&self) -> Vec<String> {
        vec!["namespaces".to_string()]
    }

    pub fn detail(&mut self, round1: &Round<'_>) -> Vec<String> {
        self.namespaces = round1
            .get("namespaces")
            .map(|list| parse_list(list, ';'))
            .unwrap_or_default();
        self.namespaces.iter().map(|ns| detail_key(ns)).collect()
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        for ns in &self.namespaces {
            let Some(raw) = round2.get(&detail_key(ns)) else {
                continue;
            };
            let record = parse_record(raw, ';');

            for (key, value) in record.iter() {
                match self.extractor.extract(key, value, &record) {
                    ArrayMatch::Plain => {
                        emitter.stat(StatContext::Namespace, key, value, &[("ns", ns.as_str())]);
                    }
                    ArrayMatch::Stat(stat) => {
                        let mut labels: Vec<(&str, &str)> = vec![("ns", ns.as_str())];
                        labels.extend(stat.labels.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                        emitter.stat(StatContext::Namespace, &stat.name, &stat.value, &labels);
                    }
                    ArrayMatch::Identifier | ArrayMatch::Dropped => {}
                }
            }
        }
    }
}

pub(crate) fn detail_key(ns: &str) -> String {
    format!("namespace/{}", ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricType, MetricsStore, StatRegistry};
    use crate::watchers::testing::{info, labels};

    fn watcher() -> NamespaceWatcher {
        NamespaceWatcher::new(ArrayStatExtractor::new().unwrap())
    }

    #[test]
    fn test_detail_keys_per_namespace() {
        let mut w = watcher();
        let round1 = info(&[("namespaces", "test;bar")]);
        assert_eq!(
            w.detail(&Round::new(&round1)),
            vec!["namespace/test", "namespace/bar"]
        );
        assert_eq!(w.discover(), vec!["namespaces"]);
    }

    #[test]
    fn test_refresh_plain_and_array_stats() {
        let mut w = watcher();
        let round1 = info(&[("namespaces", "test")]);
        w.detail(&Round::new(&round1));

        let round2 = info(&[(
            "namespace/test",
            "master_objects=500;client_write_error=3;storage-engine.file[0]=/opt/test.dat;\
             storage-engine.file[0].defrag_q=12;storage-engine.file[1].free_wblocks=9;\
             ns_cluster_size=x",
        )]);

        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        let ns = labels(&[("ns", "test")]);
        assert_eq!(store.get("aerospike_namespace_master_objects", &ns), Some(500.0));
        assert_eq!(store.get("aerospike_namespace_client_write_error", &ns), Some(3.0));

        let file = labels(&[("ns", "test"), ("file_index", "0"), ("file", "/opt/test.dat")]);
        assert_eq!(
            store.get("aerospike_namespace_storage_engine_file_defrag_q", &file),
            Some(12.0)
        );

        // Identifier consumed, orphan dropped, non-numeric skipped
        assert_eq!(store.series_count(), 3);

        let samples = store.samples_with_prefix("aerospike_namespace_master_objects");
        assert_eq!(samples[0].metric_type, MetricType::Gauge);
        let samples = store.samples_with_prefix("aerospike_namespace_client_write_error");
        assert_eq!(samples[0].metric_type, MetricType::Counter);
    }

    #[test]
    fn test_missing_namespace_response_skipped() {
        let mut w = watcher();
        let round1 = info(&[("namespaces", "test")]);
        w.detail(&Round::new(&round1));

        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&info(&[])), &emitter);
        assert_eq!(store.series_count(), 0);
    }
}
