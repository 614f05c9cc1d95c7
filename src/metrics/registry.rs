//! Stat classification and allow/block filtering
//!
//! Every stat the watchers see is classified once per (context, name):
//! whether it may be exported, and whether it is a gauge or a counter.
//! Glob matching is comparatively expensive, so decisions are memoized for
//! the life of the process. The registry is owned by the observer and shared
//! by reference; the cache sits behind a lock so a metrics reader can run
//! while a poll cycle is classifying.

use std::collections::{HashMap, HashSet};
use std::fmt;

use glob::Pattern;
use parking_lot::RwLock;

use super::gauges::{NAMESPACE_GAUGES, NODE_GAUGES, SINDEX_GAUGES};
use crate::utils::ConfigError;

/// Statistic domain a stat belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatContext {
    Namespace,
    Node,
    Set,
    Sindex,
    Xdr,
    Latencies,
    Users,
    Jobs,
}

impl StatContext {
    pub const ALL: [StatContext; 8] = [
        StatContext::Namespace,
        StatContext::Node,
        StatContext::Set,
        StatContext::Sindex,
        StatContext::Xdr,
        StatContext::Latencies,
        StatContext::Users,
        StatContext::Jobs,
    ];

    /// Name used in configuration files
    pub fn config_name(&self) -> &'static str {
        match self {
            StatContext::Namespace => "namespace",
            StatContext::Node => "node",
            StatContext::Set => "set",
            StatContext::Sindex => "sindex",
            StatContext::Xdr => "xdr",
            StatContext::Latencies => "latencies",
            StatContext::Users => "users",
            StatContext::Jobs => "jobs",
        }
    }

    /// Segment used in exported metric names
    pub fn metric_segment(&self) -> &'static str {
        match self {
            StatContext::Namespace => "namespace",
            StatContext::Node => "node_stats",
            StatContext::Set => "sets",
            StatContext::Sindex => "sindex",
            StatContext::Xdr => "xdr",
            StatContext::Latencies => "latencies",
            StatContext::Users => "users",
            StatContext::Jobs => "jobs",
        }
    }

    pub fn from_config_name(name: &str) -> Result<Self, ConfigError> {
        StatContext::ALL
            .iter()
            .copied()
            .find(|c| c.config_name() == name)
            .ok_or_else(|| ConfigError::UnknownContext(name.to_string()))
    }
}

impl fmt::Display for StatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

/// Exported metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

/// Cached decision for one (context, stat) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedStat {
    pub allowed: bool,
    pub metric_type: MetricType,
}

/// Allow/block glob lists for one context
#[derive(Debug, Clone, Default)]
pub struct StatFilter {
    allow: Vec<Pattern>,
    block: Vec<Pattern>,
}

impl StatFilter {
    /// Compile pattern lists; a malformed glob is a startup error
    pub fn compile<S: AsRef<str>>(
        context: StatContext,
        allow: &[S],
        block: &[S],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            allow: compile_patterns(context, allow)?,
            block: compile_patterns(context, block)?,
        })
    }

    /// Block list wins; an empty allow list allows everything
    pub fn is_allowed(&self, name: &str) -> bool {
        if self.block.iter().any(|p| p.matches(name)) {
            return false;
        }
        self.allow.is_empty() || self.allow.iter().any(|p| p.matches(name))
    }
}

fn compile_patterns<S: AsRef<str>>(
    context: StatContext,
    patterns: &[S],
) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p.as_ref()).map_err(|e| ConfigError::InvalidPattern {
                context: context.to_string(),
                pattern: p.as_ref().to_string(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}

/// Per-context filters, gauge sets and the memoized decisions
#[derive(Debug)]
pub struct StatRegistry {
    filters: HashMap<StatContext, StatFilter>,
    gauges: HashMap<StatContext, HashSet<String>>,
    cache: RwLock<HashMap<(StatContext, String), ClassifiedStat>>,
}

impl Default for StatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatRegistry {
    /// Registry with the built-in gauge sets and no filters
    pub fn new() -> Self {
        let mut gauges: HashMap<StatContext, HashSet<String>> = HashMap::new();
        let builtin: [(StatContext, &[&str]); 3] = [
            (StatContext::Namespace, NAMESPACE_GAUGES),
            (StatContext::Node, NODE_GAUGES),
            (StatContext::Sindex, SINDEX_GAUGES),
        ];
        for (ctx, names) in builtin {
            gauges.insert(ctx, names.iter().map(|s| s.to_string()).collect());
        }

        Self {
            filters: HashMap::new(),
            gauges,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the allow/block lists for a context
    pub fn with_filter<S: AsRef<str>>(
        mut self,
        context: StatContext,
        allow: &[S],
        block: &[S],
    ) -> Result<Self, ConfigError> {
        self.filters
            .insert(context, StatFilter::compile(context, allow, block)?);
        Ok(self)
    }

    /// Add names to a context's gauge set
    pub fn with_gauges<S: AsRef<str>>(mut self, context: StatContext, names: &[S]) -> Self {
        self.gauges
            .entry(context)
            .or_default()
            .extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    /// Whether `name` may be exported in `context`
    pub fn is_allowed(&self, context: StatContext, name: &str) -> bool {
        self.classify(context, name).allowed
    }

    /// Gauge if listed in the context's gauge set, counter otherwise
    pub fn type_of(&self, context: StatContext, name: &str) -> MetricType {
        self.classify(context, name).metric_type
    }

    /// Memoized classification using the shared gauge sets
    pub fn classify(&self, context: StatContext, name: &str) -> ClassifiedStat {
        self.classify_with(context, name, || self.lookup_type(context, name))
    }

    /// Memoized classification for contexts with their own fixed type table
    pub fn classify_fixed(
        &self,
        context: StatContext,
        name: &str,
        metric_type: MetricType,
    ) -> ClassifiedStat {
        self.classify_with(context, name, || metric_type)
    }

    fn classify_with(
        &self,
        context: StatContext,
        name: &str,
        metric_type: impl FnOnce() -> MetricType,
    ) -> ClassifiedStat {
        // Fast path: read lock
        {
            let cache = self.cache.read();
            if let Some(stat) = cache.get(&(context, name.to_string())) {
                return *stat;
            }
        }

        let computed = ClassifiedStat {
            allowed: self.matches_filter(context, name),
            metric_type: metric_type(),
        };

        // First writer wins so concurrent callers agree
        *self
            .cache
            .write()
            .entry((context, name.to_string()))
            .or_insert(computed)
    }

    fn matches_filter(&self, context: StatContext, name: &str) -> bool {
        self.filters
            .get(&context)
            .map(|f| f.is_allowed(name))
            .unwrap_or(true)
    }

    fn lookup_type(&self, context: StatContext, name: &str) -> MetricType {
        match self.gauges.get(&context) {
            Some(set) if set.contains(name) => MetricType::Gauge,
            _ => MetricType::Counter,
        }
    }

    /// Number of memoized decisions
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Forget every memoized decision
    #[cfg(test)]
    pub fn reset(&self) {
        self.cache.write().clear();
    }
}
