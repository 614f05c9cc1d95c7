//! Background query/scan job statistics

use super::{Emitter, Round};
use crate::metrics::{parse_records, MetricType, StatContext};
use crate::utils::BuildVersion;

/// Scans were folded into queries
const QUERY_ONLY_BUILD: BuildVersion = BuildVersion::new(6, 0, 0, 0);
/// `query-show`/`scan-show` replaced `jobs:`
const SHOW_BUILD: BuildVersion = BuildVersion::new(5, 7, 0, 0);

const QUERY_SHOW: &str = "query-show";
const SCAN_SHOW: &str = "scan-show";
const LEGACY_JOBS: &str = "jobs:";

const JOB_METRICS: &[(&str, MetricType)] = &[
    ("run-time", MetricType::Gauge),
    ("time-since-done", MetricType::Gauge),
    ("active-threads", MetricType::Gauge),
    ("socket-timeout", MetricType::Gauge),
    ("udf-active", MetricType::Gauge),
    ("recs-throttled", MetricType::Counter),
    ("recs-filtered-meta", MetricType::Counter),
    ("recs-filtered-bins", MetricType::Counter),
    ("recs-succeeded", MetricType::Counter),
    ("recs-failed", MetricType::Counter),
    ("net-io-bytes", MetricType::Counter),
];

pub struct JobsWatcher {
    disabled: bool,
    commands: Vec<&'static str>,
}

impl JobsWatcher {
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled,
            commands: Vec::new(),
        }
    }

    pub fn detail(&mut self, round1: &Round<'_>) -> Vec<String> {
        self.commands = if self.disabled {
            Vec::new()
        } else if round1.build_at_least(&QUERY_ONLY_BUILD) {
            vec![QUERY_SHOW]
        } else if round1.build_at_least(&SHOW_BUILD) {
            vec![QUERY_SHOW, SCAN_SHOW]
        } else if round1.build.is_some() {
            vec![LEGACY_JOBS]
        } else {
            Vec::new()
        };
        self.commands.iter().map(|c| c.to_string()).collect()
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        for &command in &self.commands {
            let Some(raw) = round2.get(command) else {
                continue;
            };
            for job in parse_records(raw, ';', ':') {
                let module = job.get("module").unwrap_or_else(|| default_module(command));
                let trid = job
                    .get("trid")
                    .or_else(|| job.get("transaction-id"))
                    .unwrap_or("");
                let labels = [
                    ("ns", job.get("ns").unwrap_or("")),
                    ("set", job.get("set").unwrap_or("")),
                    ("module", module),
                    ("trid", trid),
                ];

                for &(stat, metric_type) in JOB_METRICS {
                    if let Some(value) = job.get(stat) {
                        emitter.fixed_stat(StatContext::Jobs, stat, value, metric_type, &labels);
                    }
                }
            }
        }
    }
}

fn default_module(command: &str) -> &'static str {
    match command {
        QUERY_SHOW => "query",
        SCAN_SHOW => "scan",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsStore, StatRegistry};
    use crate::watchers::testing::{info, labels};

    fn detail_for(build: &str) -> Vec<String> {
        let round1 = info(&[("build", build)]);
        JobsWatcher::new(false).detail(&Round::new(&round1))
    }

    #[test]
    fn test_version_gates() {
        assert_eq!(detail_for("6.0.0.0-0"), vec!["query-show"]);
        assert_eq!(detail_for("6.4.0.2"), vec!["query-show"]);
        assert_eq!(detail_for("5.7.0.11"), vec!["query-show", "scan-show"]);
        assert_eq!(detail_for("5.6.0.4"), vec!["jobs:"]);
        assert!(JobsWatcher::new(false).detail(&Round::new(&info(&[]))).is_empty());
        assert!(JobsWatcher::new(true)
            .detail(&Round::new(&info(&[("build", "6.1.0.0")])))
            .is_empty());
    }

    #[test]
    fn test_refresh_labels_and_types() {
        let mut w = JobsWatcher::new(false);
        w.detail(&Round::new(&info(&[("build", "5.7.0.0")])));

        let round2 = info(&[
            (
                "scan-show",
                "trid=77:ns=test:set=demo:run-time=1200:recs-succeeded=40:status=active(ok);",
            ),
            ("query-show", ""),
        ]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        let job = labels(&[
            ("ns", "test"),
            ("set", "demo"),
            ("module", "scan"),
            ("trid", "77"),
        ]);
        assert_eq!(store.get("aerospike_jobs_run_time", &job), Some(1200.0));
        assert_eq!(store.get("aerospike_jobs_recs_succeeded", &job), Some(40.0));
        assert_eq!(store.series_count(), 2);

        let succeeded = store.samples_with_prefix("aerospike_jobs_recs_succeeded");
        assert_eq!(succeeded[0].metric_type, MetricType::Counter);
    }

    #[test]
    fn test_legacy_module_from_record() {
        let mut w = JobsWatcher::new(false);
        w.detail(&Round::new(&info(&[("build", "5.2.0.0")])));

        let round2 = info(&[("jobs:", "module=query:trid=9:ns=bar:set=:net-io-bytes=512")]);
        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let emitter = Emitter::new(&store, &registry, "aerospike", labels(&[]));
        w.refresh(&Round::new(&round2), &emitter);

        let job = labels(&[("ns", "bar"), ("set", ""), ("module", "query"), ("trid", "9")]);
        assert_eq!(store.get("aerospike_jobs_net_io_bytes", &job), Some(512.0));
    }
}
