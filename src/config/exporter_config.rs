//! Exporter configuration derived from CLI arguments and the YAML file

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::cli::{CliArgs, OutputFormat};
use super::tls_config::TlsConfig;
use crate::metrics::{StatContext, StatRegistry};
use crate::utils::ConfigError;

pub const DEFAULT_METRIC_PREFIX: &str = "aerospike";

/// Resolved node address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Allow/block lists for one context as written in the file
///
/// `whitelist`/`blacklist` are the older spellings and may not be combined
/// with the new ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterLists {
    pub allowlist: Option<Vec<String>>,
    pub blocklist: Option<Vec<String>>,
    pub whitelist: Option<Vec<String>>,
    pub blacklist: Option<Vec<String>>,
}

impl FilterLists {
    /// Merge new and legacy spellings, rejecting ambiguous definitions
    fn resolve(&self, context: StatContext) -> Result<(Vec<String>, Vec<String>), ConfigError> {
        let allow = pick(
            context,
            &self.allowlist,
            &self.whitelist,
            "allowlist",
            "whitelist",
        )?;
        let block = pick(
            context,
            &self.blocklist,
            &self.blacklist,
            "blocklist",
            "blacklist",
        )?;
        Ok((allow, block))
    }
}

fn pick(
    context: StatContext,
    new: &Option<Vec<String>>,
    legacy: &Option<Vec<String>>,
    new_name: &'static str,
    legacy_name: &'static str,
) -> Result<Vec<String>, ConfigError> {
    match (new, legacy) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingLists {
            context: context.to_string(),
            new: new_name,
            legacy: legacy_name,
        }),
        (Some(list), None) | (None, Some(list)) => Ok(list.clone()),
        (None, None) => Ok(Vec::new()),
    }
}

/// YAML file layout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExporterFile {
    pub metric_prefix: Option<String>,
    pub constant_labels: BTreeMap<String, String>,
    pub latency_buckets_count: usize,
    pub disable_sindex_metrics: bool,
    pub disable_job_metrics: bool,
    pub disable_latency_metrics: bool,
    pub filters: BTreeMap<String, FilterLists>,
    pub gauges: BTreeMap<String, Vec<String>>,
}

/// Stat selection settings shared by the watchers
#[derive(Debug, Clone, PartialEq)]
pub struct StatSettings {
    pub metric_prefix: String,
    pub constant_labels: BTreeMap<String, String>,
    /// Buckets kept per histogram including `+Inf`; 0 keeps all
    pub latency_buckets_count: usize,
    pub disable_sindex: bool,
    pub disable_jobs: bool,
    pub disable_latencies: bool,
    pub filters: HashMap<StatContext, (Vec<String>, Vec<String>)>,
    pub gauges: HashMap<StatContext, Vec<String>>,
}

impl Default for StatSettings {
    fn default() -> Self {
        Self {
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
            constant_labels: BTreeMap::new(),
            latency_buckets_count: 0,
            disable_sindex: false,
            disable_jobs: false,
            disable_latencies: false,
            filters: HashMap::new(),
            gauges: HashMap::new(),
        }
    }
}

impl StatSettings {
    /// Parse and validate the YAML file contents
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: ExporterFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_file_layout(file)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn from_file_layout(file: ExporterFile) -> Result<Self, ConfigError> {
        let metric_prefix = file
            .metric_prefix
            .unwrap_or_else(|| DEFAULT_METRIC_PREFIX.to_string());
        if !is_valid_metric_name(&metric_prefix) {
            return Err(ConfigError::Invalid(format!(
                "invalid metric_prefix {:?}",
                metric_prefix
            )));
        }

        for name in file.constant_labels.keys() {
            if !is_valid_metric_name(name) {
                return Err(ConfigError::Invalid(format!(
                    "invalid constant label name {:?}",
                    name
                )));
            }
        }

        let mut filters = HashMap::new();
        for (name, lists) in &file.filters {
            let context = StatContext::from_config_name(name)?;
            filters.insert(context, lists.resolve(context)?);
        }

        let mut gauges = HashMap::new();
        for (name, list) in file.gauges {
            gauges.insert(StatContext::from_config_name(&name)?, list);
        }

        Ok(Self {
            metric_prefix,
            constant_labels: file.constant_labels,
            latency_buckets_count: file.latency_buckets_count,
            disable_sindex: file.disable_sindex_metrics,
            disable_jobs: file.disable_job_metrics,
            disable_latencies: file.disable_latency_metrics,
            filters,
            gauges,
        })
    }

    /// Compile the filters into a registry; fails on malformed globs
    pub fn build_registry(&self) -> Result<StatRegistry, ConfigError> {
        let mut registry = StatRegistry::new();
        for (context, (allow, block)) in &self.filters {
            registry = registry.with_filter(*context, allow, block)?;
        }
        for (context, names) in &self.gauges {
            registry = registry.with_gauges(*context, names);
        }
        Ok(registry)
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Complete exporter configuration
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    // Connection
    pub address: ServerAddress,
    pub tls: Option<TlsConfig>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,

    // Polling
    pub interval_secs: u64,
    pub once: bool,

    // Stats
    pub stats: StatSettings,

    // Output
    pub output_path: Option<std::path::PathBuf>,
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}

impl ExporterConfig {
    /// Create configuration from CLI arguments, loading the YAML file if given
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        args.validate().map_err(ConfigError::Invalid)?;

        let tls = if args.tls {
            Some(TlsConfig {
                skip_verify: args.tls_skip_verify,
                ca_cert: args.tls_ca_cert.clone(),
                client_cert: args.tls_cert.clone(),
                client_key: args.tls_key.clone(),
                tls_name: args.tls_name.clone(),
            })
        } else {
            None
        };

        let stats = match &args.config {
            Some(path) => StatSettings::from_path(path)?,
            None => StatSettings::default(),
        };

        Ok(Self {
            address: ServerAddress {
                host: args.host.clone(),
                port: args.port,
            },
            tls,
            connect_timeout_ms: args.connect_timeout_ms,
            request_timeout_ms: args.request_timeout_ms,

            interval_secs: args.interval_secs,
            once: args.once,

            stats,

            output_path: args.output.clone(),
            output_format: args.output_format,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricType;
    use clap::Parser;

    #[test]
    fn test_parse_full_file() {
        let yaml = r#"
metric_prefix: asd
constant_labels:
  env: prod
latency_buckets_count: 5
disable_job_metrics: true
filters:
  namespace:
    allowlist: ["client_*", "objects"]
    blocklist: ["*_tombstones"]
  node:
    blacklist: ["uptime"]
gauges:
  users:
    - conns_in_use
"#;
        let settings = StatSettings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.metric_prefix, "asd");
        assert_eq!(settings.constant_labels.get("env").map(String::as_str), Some("prod"));
        assert_eq!(settings.latency_buckets_count, 5);
        assert!(settings.disable_jobs);
        assert!(!settings.disable_sindex);

        let registry = settings.build_registry().unwrap();
        assert!(registry.is_allowed(StatContext::Namespace, "objects"));
        assert!(!registry.is_allowed(StatContext::Namespace, "master_tombstones"));
        assert!(!registry.is_allowed(StatContext::Namespace, "stop_writes"));
        assert!(!registry.is_allowed(StatContext::Node, "uptime"));
        assert_eq!(
            registry.type_of(StatContext::Users, "conns_in_use"),
            MetricType::Gauge
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = StatSettings::from_yaml_str("{}").unwrap();
        assert_eq!(settings, StatSettings::default());
    }

    #[test]
    fn test_conflicting_legacy_lists() {
        let yaml = r#"
filters:
  set:
    allowlist: ["objects"]
    whitelist: ["tombstones"]
"#;
        let err = StatSettings::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingLists { .. }));
    }

    #[test]
    fn test_unknown_context_rejected() {
        let yaml = "filters:\n  bogus:\n    allowlist: [\"x\"]\n";
        assert!(matches!(
            StatSettings::from_yaml_str(yaml),
            Err(ConfigError::UnknownContext(_))
        ));
    }

    #[test]
    fn test_malformed_glob_fails_registry_build() {
        let yaml = "filters:\n  xdr:\n    blocklist: [\"[lag\"]\n";
        let settings = StatSettings::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            settings.build_registry(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        assert!(StatSettings::from_yaml_str("metric_prefix: \"9bad-name\"\n").is_err());
    }

    #[test]
    fn test_from_cli_without_file() {
        let args = CliArgs::parse_from(["test", "-h", "db1", "--tls", "--tls-name", "db1.local"]);
        let config = ExporterConfig::from_cli(&args).unwrap();
        assert_eq!(config.address.to_string(), "db1:3000");
        assert_eq!(
            config.tls.as_ref().and_then(|t| t.tls_name.as_deref()),
            Some("db1.local")
        );
        assert_eq!(config.stats.metric_prefix, DEFAULT_METRIC_PREFIX);
    }
}
