//! Cross-datacenter replication statistics
//!
//! Round 1 reads the XDR config to list the destination DCs; round 2
//! fetches one stats record per DC. The stat vocabulary is server-defined,
//! so only a fixed table is exported.

use super::{Emitter, Round};
use crate::metrics::{parse_list, parse_record, MetricType, StatContext};

const XDR_CONFIG_KEY: &str = "get-config:context=xdr";

const XDR_METRICS: &[(&str, MetricType)] = &[
    ("throughput", MetricType::Gauge),
    ("latency_ms", MetricType::Gauge),
    ("lap_us", MetricType::Gauge),
    ("lag", MetricType::Gauge),
    ("in_queue", MetricType::Gauge),
    ("in_progress", MetricType::Gauge),
    ("recoveries_pending", MetricType::Gauge),
    ("uncompressed_pct", MetricType::Gauge),
    ("compression_ratio", MetricType::Gauge),
    ("nodes", MetricType::Gauge),
    ("success", MetricType::Counter),
    ("abandoned", MetricType::Counter),
    ("not_found", MetricType::Counter),
    ("filtered_out", MetricType::Counter),
    ("retry_no_node", MetricType::Counter),
    ("retry_conn_reset", MetricType::Counter),
    ("retry_dest", MetricType::Counter),
    ("recoveries", MetricType::Counter),
    ("hot_keys", MetricType::Counter),
];

#[derive(Default)]
pub struct XdrWatcher {
    dcs: Vec<String>,
}

impl XdrWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discover(&self) -> Vec<String> {
        vec![XDR_CONFIG_KEY.to_string()]
    }

    pub fn detail(&mut self, round1: &Round<'_>) -> Vec<String> {
        self.dcs = round1
            .get(XDR_CONFIG_KEY)
            .and_then(|raw| parse_record(raw, ';').get("dcs").map(|dcs| parse_list(dcs, ',')))
            .unwrap_or_default();
        self.dcs.iter().map(|dc| detail_key(dc)).collect()
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        for dc in &self.dcs {
            let Some(raw) = round2.get(&detail_key(dc)) else {
                continue;
            };
            let record = parse_record(raw, ';');
            for &(stat, metric_type) in XDR_METRICS {
                if let Some(value) = record.get(stat) {
                    let labels = [("dc", dc.as_str())];
                    emitter.fixed_stat(StatContext::Xdr, stat, value, metric_type, &labels);
                }
            }
        }
    }
}

fn detail_key(dc: &str) -> String {
    format!("get-stats:context=xdr;dc={}", dc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsStore, StatRegistry};
    use crate::watchers::testing::{info, labels};

    #[test]
    fn test_dcs_to_detail_keys() {
        let mut w = XdrWatcher::new();
        let round1 = info(&[(
            "get-config:context=xdr",
            "dcs=dc-west,dc-east;src-id=0;trace-sample=0",
        )]);
        assert_eq!(
            w.detail(&Round::new(&round1)),
            vec![
                "get-stats:context=xdr;dc=dc-west",
                "get-stats:context=xdr;dc=dc-east"
            ]
        );
    }

    #[test]
    fn test_no_dcs_configured() {
        let mut w = XdrWatcher::new();
        let round1 = info(&[("get-config:context=xdr", "dcs=;src-id=0")]);
        assert!(w.detail(&Round::new(&round1)).is_empty());
        assert!(w.detail(&Round::new(&info(&[]))).is_empty());
    }

    #[test]
    fn test_refresh_types_from_table() {
        let mut w = XdrWatcher::new();
        let round1 = info(&[("get-config:context=xdr", "dcs=dc1")]);
        w.detail(&Round::new(&round1));

        let round2 = info(&[(
            "get-stats:context=xdr;dc=dc1",
            "lag=3;in_queue=12;success=9000;hot_keys=2;unlisted_stat=5",
        )]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        let dc = labels(&[("dc", "dc1")]);
        assert_eq!(store.get("aerospike_xdr_lag", &dc), Some(3.0));
        assert_eq!(store.get("aerospike_xdr_success", &dc), Some(9000.0));
        assert_eq!(store.series_count(), 4);

        let success = store.samples_with_prefix("aerospike_xdr_success");
        assert_eq!(success[0].metric_type, MetricType::Counter);
        let lag = store.samples_with_prefix("aerospike_xdr_lag");
        assert_eq!(lag[0].metric_type, MetricType::Gauge);
    }
}
