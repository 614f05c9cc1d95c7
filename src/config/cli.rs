//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Polls an Aerospike node over the info protocol and exports its statistics
#[derive(Parser, Debug, Clone)]
#[command(name = "aerospike-info-exporter")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
#[allow(clippy::manual_non_exhaustive)]
pub struct CliArgs {
    /// Print help information
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: (),

    // ===== Connection Options =====
    /// Node hostname
    #[arg(short = 'h', long = "host", default_value = "127.0.0.1")]
    pub host: String,

    /// Node info port
    #[arg(short = 'p', long = "port", default_value_t = 3000)]
    pub port: u16,

    /// Connection timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds
    #[arg(long = "request-timeout", default_value_t = 10000)]
    pub request_timeout_ms: u64,

    // ===== TLS Options =====
    /// Enable TLS connection
    #[arg(long = "tls")]
    pub tls: bool,

    /// Skip TLS certificate verification (insecure)
    #[arg(long = "tls-skip-verify")]
    pub tls_skip_verify: bool,

    /// CA certificate file for TLS
    #[arg(long = "tls-ca-cert")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Client certificate file for TLS
    #[arg(long = "tls-cert")]
    pub tls_cert: Option<PathBuf>,

    /// Client private key file for TLS
    #[arg(long = "tls-key")]
    pub tls_key: Option<PathBuf>,

    /// TLS name expected on the node certificate
    #[arg(long = "tls-name")]
    pub tls_name: Option<String>,

    // ===== Exporter Options =====
    /// YAML file with filters, gauges and labels
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Seconds between poll cycles
    #[arg(short = 'i', long = "interval", default_value_t = 15)]
    pub interval_secs: u64,

    /// Run a single poll cycle and exit
    #[arg(long = "once")]
    pub once: bool,

    // ===== Output Options =====
    /// Output file path (stdout if unset)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Prometheus)]
    pub output_format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format for exported metrics
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Prometheus,
    Json,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err("--tls-cert and --tls-key must both be specified".to_string());
        }

        if !self.tls
            && (self.tls_ca_cert.is_some() || self.tls_cert.is_some() || self.tls_name.is_some())
        {
            return Err("TLS options require --tls".to_string());
        }

        if self.interval_secs == 0 {
            return Err("--interval must be at least 1".to_string());
        }

        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err("timeouts must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["test"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 3000);
        assert_eq!(args.interval_secs, 15);
        assert_eq!(args.output_format, OutputFormat::Prometheus);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_host_short_flag() {
        let args = CliArgs::parse_from(["test", "-h", "10.0.0.5", "-p", "4000", "--once"]);
        assert_eq!(args.host, "10.0.0.5");
        assert_eq!(args.port, 4000);
        assert!(args.once);
    }

    #[test]
    fn test_validation_tls_cert_without_key() {
        let args = CliArgs::parse_from(["test", "--tls", "--tls-cert", "cert.pem"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_tls_options_without_tls() {
        let args = CliArgs::parse_from(["test", "--tls-name", "node1"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_json_output_format() {
        let args = CliArgs::parse_from(["test", "--output-format", "json"]);
        assert_eq!(args.output_format, OutputFormat::Json);
    }
}
