//! TLS settings for the info connection

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Accept any node certificate and host name
    pub skip_verify: bool,
    /// Extra PEM root used to verify the node
    pub ca_cert: Option<PathBuf>,
    /// PEM client certificate for mutual TLS
    pub client_cert: Option<PathBuf>,
    /// PKCS8 key matching `client_cert`
    pub client_key: Option<PathBuf>,
    /// Name checked against the node certificate (defaults to the host)
    pub tls_name: Option<String>,
}

impl TlsConfig {
    /// Certificate and key paths, only when both are set
    pub fn client_identity(&self) -> Option<(&Path, &Path)> {
        match (&self.client_cert, &self.client_key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }

    /// Name the handshake verifies against
    pub fn server_name<'a>(&'a self, host: &'a str) -> &'a str {
        self.tls_name.as_deref().unwrap_or(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_identity_needs_both_halves() {
        let mut tls = TlsConfig {
            client_cert: Some(PathBuf::from("/etc/as/client.pem")),
            ..TlsConfig::default()
        };
        assert!(tls.client_identity().is_none());

        tls.client_key = Some(PathBuf::from("/etc/as/client.key"));
        let (cert, key) = tls.client_identity().unwrap();
        assert_eq!(cert, Path::new("/etc/as/client.pem"));
        assert_eq!(key, Path::new("/etc/as/client.key"));
    }

    #[test]
    fn test_server_name_falls_back_to_host() {
        let mut tls = TlsConfig::default();
        assert_eq!(tls.server_name("10.0.0.1"), "10.0.0.1");
        tls.tls_name = Some("node1.cluster".to_string());
        assert_eq!(tls.server_name("10.0.0.1"), "node1.cluster");
    }
}
