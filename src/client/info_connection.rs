//! Blocking info connection
//!
//! This module provides direct TCP (and TLS) connections to a node's info
//! port with buffered reader/writer halves and the info frame codec.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::info_client::{InfoClient, InfoConnector};
use crate::config::{ServerAddress, TlsConfig};
use crate::utils::{ConnectionError, InfoDecoder, InfoEncoder, InfoMap, ProtocolError};

/// Info connection wrapper (TCP or TLS)
///
/// For TCP, we split into separate reader/writer.
/// For TLS, we use a single stream since native-tls doesn't support cloning.
pub enum InfoConnection {
    Tcp {
        writer: BufWriter<TcpStream>,
        reader: BufReader<TcpStream>,
        encoder: InfoEncoder,
        request_timeout_ms: u64,
    },
    #[cfg(feature = "native-tls-backend")]
    NativeTls {
        stream: native_tls::TlsStream<TcpStream>,
        encoder: InfoEncoder,
        request_timeout_ms: u64,
    },
}

fn resolve(address: &ServerAddress) -> Result<SocketAddr, ConnectionError> {
    let connect_failed = |source| ConnectionError::ConnectFailed {
        host: address.host.clone(),
        port: address.port,
        source,
    };

    (address.host.as_str(), address.port)
        .to_socket_addrs()
        .map_err(connect_failed)?
        .next()
        .ok_or_else(|| {
            connect_failed(io::Error::new(
                io::ErrorKind::NotFound,
                "No addresses found",
            ))
        })
}

fn open_stream(
    address: &ServerAddress,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<TcpStream, ConnectionError> {
    let addr = resolve(address)?;
    let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| {
        ConnectionError::ConnectFailed {
            host: address.host.clone(),
            port: address.port,
            source: e,
        }
    })?;

    stream.set_nodelay(true).ok();
    stream.set_read_timeout(Some(request_timeout)).ok();
    stream.set_write_timeout(Some(request_timeout)).ok();
    Ok(stream)
}

impl InfoConnection {
    /// Create new TCP connection
    pub fn connect_tcp(
        address: &ServerAddress,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let stream = open_stream(address, connect_timeout, request_timeout)?;

        let writer = BufWriter::with_capacity(
            4096,
            stream
                .try_clone()
                .map_err(|e| ConnectionError::ConnectFailed {
                    host: address.host.clone(),
                    port: address.port,
                    source: e,
                })?,
        );
        let reader = BufReader::with_capacity(65536, stream);

        Ok(InfoConnection::Tcp {
            writer,
            reader,
            encoder: InfoEncoder::with_capacity(1024),
            request_timeout_ms: request_timeout.as_millis() as u64,
        })
    }

    /// Create new TLS connection
    #[cfg(feature = "native-tls-backend")]
    pub fn connect_tls(
        address: &ServerAddress,
        connect_timeout: Duration,
        request_timeout: Duration,
        tls_config: &TlsConfig,
    ) -> Result<Self, ConnectionError> {
        use native_tls::{Certificate, Identity, TlsConnector};

        let mut builder = TlsConnector::builder();

        if tls_config.skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }

        if let Some(ref ca_path) = tls_config.ca_cert {
            let ca_data = std::fs::read(ca_path).map_err(|e| {
                ConnectionError::TlsFailed(format!("Failed to read CA cert: {}", e))
            })?;
            let cert = Certificate::from_pem(&ca_data)
                .map_err(|e| ConnectionError::TlsFailed(format!("Invalid CA cert: {}", e)))?;
            builder.add_root_certificate(cert);
        }

        if let Some((cert_path, key_path)) = tls_config.client_identity() {
            let cert_data = std::fs::read(cert_path).map_err(|e| {
                ConnectionError::TlsFailed(format!("Failed to read client cert: {}", e))
            })?;
            let key_data = std::fs::read(key_path).map_err(|e| {
                ConnectionError::TlsFailed(format!("Failed to read client key: {}", e))
            })?;

            // native-tls wants PKCS8 key material
            let identity = Identity::from_pkcs8(&cert_data, &key_data).map_err(|e| {
                ConnectionError::TlsFailed(format!("Invalid client identity: {}", e))
            })?;
            builder.identity(identity);
        }

        let connector = builder.build().map_err(|e| {
            ConnectionError::TlsFailed(format!("Failed to build TLS connector: {}", e))
        })?;

        let tcp_stream = open_stream(address, connect_timeout, request_timeout)?;

        let tls_name = tls_config.server_name(&address.host);
        let stream = connector
            .connect(tls_name, tcp_stream)
            .map_err(|e| ConnectionError::TlsFailed(format!("TLS handshake failed: {}", e)))?;

        Ok(InfoConnection::NativeTls {
            stream,
            encoder: InfoEncoder::with_capacity(1024),
            request_timeout_ms: request_timeout.as_millis() as u64,
        })
    }

    fn exchange(&mut self, commands: &[String]) -> io::Result<InfoMap> {
        match self {
            InfoConnection::Tcp {
                writer,
                reader,
                encoder,
                ..
            } => {
                encoder.encode_commands(commands);
                writer.write_all(encoder.as_bytes())?;
                writer.flush()?;
                InfoDecoder::new(reader).decode()
            }
            #[cfg(feature = "native-tls-backend")]
            InfoConnection::NativeTls {
                stream, encoder, ..
            } => {
                encoder.encode_commands(commands);
                stream.write_all(encoder.as_bytes())?;
                stream.flush()?;
                InfoDecoder::new(BufReader::new(stream)).decode()
            }
        }
    }

    fn request_timeout_ms(&self) -> u64 {
        match self {
            InfoConnection::Tcp {
                request_timeout_ms, ..
            } => *request_timeout_ms,
            #[cfg(feature = "native-tls-backend")]
            InfoConnection::NativeTls {
                request_timeout_ms, ..
            } => *request_timeout_ms,
        }
    }
}

impl InfoClient for InfoConnection {
    fn request_info(&mut self, commands: &[String]) -> Result<InfoMap, ConnectionError> {
        let timeout_ms = self.request_timeout_ms();
        self.exchange(commands).map_err(|e| {
            // Framing errors travel wrapped in io::Error out of the decoder
            let protocol = e
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<ProtocolError>())
                .cloned();
            match protocol {
                Some(p) => ConnectionError::Protocol(p),
                None => ConnectionError::from_request(e, timeout_ms),
            }
        })
    }
}

/// Connection factory for creating connections with common config
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    pub address: ServerAddress,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub tls_config: Option<TlsConfig>,
}

impl ConnectionFactory {
    /// Create a new connection to the configured node
    pub fn create(&self) -> Result<InfoConnection, ConnectionError> {
        debug!("Connecting to {}", self.address);
        match &self.tls_config {
            #[cfg(feature = "native-tls-backend")]
            Some(tls) => InfoConnection::connect_tls(
                &self.address,
                self.connect_timeout,
                self.request_timeout,
                tls,
            ),
            #[cfg(not(feature = "native-tls-backend"))]
            Some(_) => Err(ConnectionError::TlsFailed(
                "TLS support not compiled in".to_string(),
            )),
            None => InfoConnection::connect_tcp(
                &self.address,
                self.connect_timeout,
                self.request_timeout,
            ),
        }
    }
}

impl InfoConnector for ConnectionFactory {
    type Conn = InfoConnection;

    fn connect(&self) -> Result<InfoConnection, ConnectionError> {
        self.create()
    }

    fn uses_tls(&self) -> bool {
        self.tls_config.is_some()
    }
}
