//! Configuration module

pub mod cli;
pub mod exporter_config;
pub mod tls_config;

pub use cli::{CliArgs, OutputFormat};
pub use exporter_config::{ExporterConfig, FilterLists, ServerAddress, StatSettings};
pub use tls_config::TlsConfig;
