//! Per-entity watchers
//!
//! Each watcher takes part in the observer's two-round protocol:
//! - `discover()` names the keys it needs to enumerate its entities (round 1)
//! - `detail()` turns round-1 results into the per-entity keys (round 2)
//! - `refresh()` parses round-2 results and emits samples
//!
//! The set of watchers and their refresh order are fixed; see
//! [`build_watchers`].

pub mod jobs;
pub mod latency;
pub mod namespace;
pub mod node;
pub mod sets;
pub mod sindex;
pub mod users;
pub mod xdr;

use tracing::debug;

use crate::config::StatSettings;
use crate::metrics::{
    coerce_numeric, help_text, normalize_name, ArrayStatExtractor, Labels, MetricSample,
    MetricType, MetricsSink, StatContext, StatRegistry,
};
use crate::utils::{BuildVersion, ConfigError, InfoMap};

pub use jobs::JobsWatcher;
pub use latency::LatencyWatcher;
pub use namespace::NamespaceWatcher;
pub use node::NodeWatcher;
pub use sets::SetWatcher;
pub use sindex::SindexWatcher;
pub use users::{UserStatsState, UserWatcher};
pub use xdr::XdrWatcher;

/// Responses of one round plus the build they report
#[derive(Debug, Clone, Copy)]
pub struct Round<'a> {
    pub responses: &'a InfoMap,
    pub build: Option<BuildVersion>,
}

impl<'a> Round<'a> {
    pub fn new(responses: &'a InfoMap) -> Self {
        Self {
            responses,
            build: responses.get("build").and_then(|b| BuildVersion::parse(b)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.responses.get(key).map(String::as_str)
    }

    /// True when the build is known and at least `min`
    pub fn build_at_least(&self, min: &BuildVersion) -> bool {
        self.build.map(|b| b.at_least(min)).unwrap_or(false)
    }
}

/// Names, labels and forwards samples to the sink
pub struct Emitter<'a> {
    sink: &'a dyn MetricsSink,
    registry: &'a StatRegistry,
    prefix: &'a str,
    base_labels: Labels,
}

impl<'a> Emitter<'a> {
    /// `base_labels` are attached to every sample (identity and constants)
    pub fn new(
        sink: &'a dyn MetricsSink,
        registry: &'a StatRegistry,
        prefix: &'a str,
        base_labels: Labels,
    ) -> Self {
        Self {
            sink,
            registry,
            prefix,
            base_labels,
        }
    }

    pub fn registry(&self) -> &StatRegistry {
        self.registry
    }

    /// Emit a raw stat typed by the context's gauge set, if allowed
    pub fn stat(&self, context: StatContext, stat: &str, raw: &str, labels: &[(&str, &str)]) {
        let class = self.registry.classify(context, stat);
        if class.allowed {
            self.coerce(context, stat, raw, class.metric_type, labels);
        }
    }

    /// Emit a raw stat from a fixed type table, if allowed
    pub fn fixed_stat(
        &self,
        context: StatContext,
        stat: &str,
        raw: &str,
        metric_type: MetricType,
        labels: &[(&str, &str)],
    ) {
        let class = self.registry.classify_fixed(context, stat, metric_type);
        if class.allowed {
            self.coerce(context, stat, raw, class.metric_type, labels);
        }
    }

    fn coerce(
        &self,
        context: StatContext,
        stat: &str,
        raw: &str,
        metric_type: MetricType,
        labels: &[(&str, &str)],
    ) {
        match coerce_numeric(raw) {
            Ok(value) => self.value(context, stat, metric_type, value, labels),
            Err(e) => debug!("Skipping {} stat {}: {}", context, stat, e),
        }
    }

    /// Emit an already numeric value without filtering
    pub fn value(
        &self,
        context: StatContext,
        stat: &str,
        metric_type: MetricType,
        value: f64,
        labels: &[(&str, &str)],
    ) {
        let name = format!(
            "{}_{}_{}",
            self.prefix,
            context.metric_segment(),
            normalize_name(stat)
        );
        self.emit_named(name, help_text(stat), metric_type, value, labels);
    }

    /// Liveness gauge, `<prefix>_node_up`
    pub fn liveness(&self, up: bool, build: &str) {
        let name = format!("{}_node_up", self.prefix);
        let value = if up { 1.0 } else { 0.0 };
        self.emit_named(
            name,
            "node up".to_string(),
            MetricType::Gauge,
            value,
            &[("build", build)],
        );
    }

    fn emit_named(
        &self,
        name: String,
        help: String,
        metric_type: MetricType,
        value: f64,
        labels: &[(&str, &str)],
    ) {
        let mut all = self.base_labels.clone();
        for (k, v) in labels {
            all.insert(k.to_string(), v.to_string());
        }
        self.sink.emit(MetricSample {
            name,
            help,
            labels: all,
            metric_type,
            value,
        });
    }
}

/// Closed set of watchers
pub enum Watcher {
    Namespace(NamespaceWatcher),
    Set(SetWatcher),
    Latency(LatencyWatcher),
    Node(NodeWatcher),
    Sindex(SindexWatcher),
    Xdr(XdrWatcher),
    Jobs(JobsWatcher),
    Users(UserWatcher),
}

impl Watcher {
    pub fn name(&self) -> &'static str {
        match self {
            Watcher::Namespace(_) => "namespace",
            Watcher::Set(_) => "set",
            Watcher::Latency(_) => "latency",
            Watcher::Node(_) => "node",
            Watcher::Sindex(_) => "sindex",
            Watcher::Xdr(_) => "xdr",
            Watcher::Jobs(_) => "jobs",
            Watcher::Users(_) => "users",
        }
    }

    /// Round-1 keys
    pub fn discover(&self) -> Vec<String> {
        match self {
            Watcher::Namespace(w) => w.discover(),
            Watcher::Sindex(w) => w.discover(),
            Watcher::Xdr(w) => w.discover(),
            Watcher::Set(_)
            | Watcher::Latency(_)
            | Watcher::Node(_)
            | Watcher::Jobs(_)
            | Watcher::Users(_) => Vec::new(),
        }
    }

    /// Round-2 keys derived from round-1 results
    pub fn detail(&mut self, round1: &Round<'_>) -> Vec<String> {
        match self {
            Watcher::Namespace(w) => w.detail(round1),
            Watcher::Set(w) => w.detail(),
            Watcher::Latency(w) => w.detail(round1),
            Watcher::Node(w) => w.detail(),
            Watcher::Sindex(w) => w.detail(round1),
            Watcher::Xdr(w) => w.detail(round1),
            Watcher::Jobs(w) => w.detail(round1),
            Watcher::Users(_) => Vec::new(),
        }
    }

    /// Parse round-2 results and emit
    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        match self {
            Watcher::Namespace(w) => w.refresh(round2, emitter),
            Watcher::Set(w) => w.refresh(round2, emitter),
            Watcher::Latency(w) => w.refresh(round2, emitter),
            Watcher::Node(w) => w.refresh(round2, emitter),
            Watcher::Sindex(w) => w.refresh(round2, emitter),
            Watcher::Xdr(w) => w.refresh(round2, emitter),
            Watcher::Jobs(w) => w.refresh(round2, emitter),
            Watcher::Users(w) => w.refresh(round2, emitter),
        }
    }
}

/// Build the info watchers in refresh order
///
/// Namespace, set, latency and node come first since later watchers read
/// identity fields populated by round 2. The user watcher is appended
/// separately once an admin client is available.
pub fn build_watchers(settings: &StatSettings) -> Result<Vec<Watcher>, ConfigError> {
    let extractor = ArrayStatExtractor::new()
        .map_err(|e| ConfigError::Invalid(format!("array stat pattern: {}", e)))?;

    Ok(vec![
        Watcher::Namespace(NamespaceWatcher::new(extractor)),
        Watcher::Set(SetWatcher::new()),
        Watcher::Latency(LatencyWatcher::new(
            settings.latency_buckets_count,
            settings.disable_latencies,
        )),
        Watcher::Node(NodeWatcher::new()),
        Watcher::Sindex(SindexWatcher::new(settings.disable_sindex)),
        Watcher::Xdr(XdrWatcher::new()),
        Watcher::Jobs(JobsWatcher::new(settings.disable_jobs)),
    ])
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::metrics::MetricsStore;

    #[test]
    fn test_emitter_names_and_labels() {
        let store = MetricsStore::new();
        let registry = StatRegistry::new();
        let base = labels(&[("cluster_name", "c1"), ("service", "10.0.0.1:3000")]);
        let emitter = Emitter::new(&store, &registry, "aerospike", base);

        emitter.stat(StatContext::Node, "client_connections", "7", &[]);
        emitter.stat(StatContext::Node, "system-free.mem pct", "true", &[]);
        emitter.stat(StatContext::Node, "paxos_principal", "BB9", &[]);

        let l = labels(&[("cluster_name", "c1"), ("service", "10.0.0.1:3000")]);
        assert_eq!(store.get("aerospike_node_stats_client_connections", &l), Some(7.0));
        assert_eq!(store.get("aerospike_node_stats_system_free_mem_pct", &l), Some(1.0));
        assert_eq!(store.series_count(), 2);
    }

    #[test]
    fn test_emitter_respects_filters() {
        let store = MetricsStore::new();
        let registry = StatRegistry::new()
            .with_filter(StatContext::Node, &[] as &[&str], &["uptime"])
            .unwrap();
        let emitter = Emitter::new(&store, &registry, "aerospike", Labels::new());

        emitter.stat(StatContext::Node, "uptime", "100", &[]);
        emitter.fixed_stat(StatContext::Node, "uptime", "100", MetricType::Gauge, &[]);
        emitter.stat(StatContext::Node, "batch_index_error", "3", &[]);
        assert_eq!(store.series_count(), 1);
    }

    #[test]
    fn test_round_build_gate() {
        let map = info(&[("build", "5.7.0.11")]);
        let round = Round::new(&map);
        assert!(round.build_at_least(&BuildVersion::new(5, 7, 0, 0)));
        assert!(!round.build_at_least(&BuildVersion::new(6, 0, 0, 0)));

        let empty = InfoMap::new();
        assert!(!Round::new(&empty).build_at_least(&BuildVersion::new(1, 0, 0, 0)));
    }

    #[test]
    fn test_watcher_order() {
        let watchers = build_watchers(&StatSettings::default()).unwrap();
        let names: Vec<&str> = watchers.iter().map(Watcher::name).collect();
        assert_eq!(
            names,
            vec!["namespace", "set", "latency", "node", "sindex", "xdr", "jobs"]
        );
    }
}
