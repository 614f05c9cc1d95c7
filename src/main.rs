//! aerospike-info-exporter - Aerospike info-protocol metrics exporter
//!
//! Polls one node on a fixed interval and writes its statistics in the
//! Prometheus text format (or JSON) to a file or stdout.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use aerospike_info_exporter::client::ConnectionFactory;
use aerospike_info_exporter::config::{CliArgs, ExporterConfig, OutputFormat};
use aerospike_info_exporter::metrics::MetricsStore;
use aerospike_info_exporter::observer::Observer;

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn log_banner(config: &ExporterConfig) {
    info!("aerospike-info-exporter v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Node: {}{}, interval: {}s",
        config.address,
        if config.tls.is_some() { " (TLS)" } else { "" },
        config.interval_secs
    );
    match &config.output_path {
        Some(path) => info!("Writing {:?} output to {:?}", config.output_format, path),
        None => info!("Writing {:?} output to stdout", config.output_format),
    }
}

fn render(store: &MetricsStore, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Prometheus => store.render().context("Failed to encode metrics"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&store.to_json()).context("Failed to serialize metrics")
        }
    }
}

/// Replace `path` atomically so readers never see a partial file
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Output path {:?} has no file name", path))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp, content).with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {:?} to {:?}", tmp, path))
}

fn write_output(config: &ExporterConfig, store: &MetricsStore) -> Result<()> {
    let content = render(store, config.output_format)?;
    match &config.output_path {
        Some(path) => write_atomic(path, &content),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Write this cycle's output; outside `--once` a failure is logged and polling goes on
fn publish(config: &ExporterConfig, store: &MetricsStore) -> Result<()> {
    match write_output(config, store) {
        Err(e) if !config.once => {
            error!("Failed to write metrics: {:#}", e);
            Ok(())
        }
        written => written,
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet)?;

    // Build configuration
    let config = ExporterConfig::from_cli(&args).context("Configuration error")?;
    log_banner(&config);

    let factory = ConnectionFactory {
        address: config.address.clone(),
        connect_timeout: std::time::Duration::from_millis(config.connect_timeout_ms),
        request_timeout: std::time::Duration::from_millis(config.request_timeout_ms),
        tls_config: config.tls.clone(),
    };

    let store = Arc::new(MetricsStore::new());
    let mut observer =
        Observer::new(factory, &config.stats, store.clone()).context("Configuration error")?;

    loop {
        let started = Instant::now();
        let outcome = observer.refresh();
        match &outcome {
            Ok(()) => debug!(
                "Cycle finished in {:?}, {} series",
                started.elapsed(),
                store.series_count()
            ),
            Err(e) => warn!("Poll cycle failed: {}", e),
        }

        publish(&config, &store)?;

        if config.once {
            return outcome.context("Poll cycle failed");
        }

        if let Some(rest) = config.interval().checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerospike_info_exporter::metrics::{help_text, MetricSample, MetricType, MetricsSink};
    use clap::Parser;

    fn config(args: &[&str]) -> ExporterConfig {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        ExporterConfig::from_cli(&CliArgs::parse_from(argv)).unwrap()
    }

    fn store() -> MetricsStore {
        let store = MetricsStore::new();
        store.emit(MetricSample {
            name: "aerospike_node_up".to_string(),
            help: help_text("node_up"),
            labels: Default::default(),
            metric_type: MetricType::Gauge,
            value: 1.0,
        });
        store
    }

    #[test]
    fn test_write_failure_is_not_fatal_when_polling() {
        let missing = std::env::temp_dir()
            .join(format!("aerospike-exporter-missing-{}", std::process::id()))
            .join("metrics.prom");
        let path = missing.to_string_lossy().to_string();

        assert!(publish(&config(&["-o", path.as_str()]), &store()).is_ok());
        assert!(publish(&config(&["-o", path.as_str(), "--once"]), &store()).is_err());
    }

    #[test]
    fn test_write_replaces_file() {
        let dir = std::env::temp_dir().join(format!("aerospike-exporter-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("metrics.prom");
        fs::write(&path, "stale").unwrap();
        let arg = path.to_string_lossy().to_string();

        publish(&config(&["-o", arg.as_str(), "--once"]), &store()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("aerospike_node_up 1\n"));
        assert!(!dir.join(".metrics.prom.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
