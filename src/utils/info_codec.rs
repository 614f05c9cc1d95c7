//! Info protocol framing
//!
//! Every message is an 8-byte header followed by a body:
//! - byte 0: protocol version (2)
//! - byte 1: message type (1 = info)
//! - bytes 2..8: body length, 48-bit big-endian
//!
//! A request body is a list of commands, each terminated by `\n`.
//! A response body has one `<command>\t<value>\n` line per command.

use std::collections::HashMap;
use std::io::{self, Read};

use super::error::ProtocolError;

pub const PROTO_VERSION: u8 = 2;
pub const MSG_TYPE_INFO: u8 = 1;
pub const HEADER_LEN: usize = 8;

/// Largest response body accepted (128 MiB)
pub const MAX_BODY_LEN: u64 = 128 * 1024 * 1024;

/// Command name -> raw response value
pub type InfoMap = HashMap<String, String>;

/// Info request encoder with reusable buffer
pub struct InfoEncoder {
    buf: Vec<u8>,
}

impl InfoEncoder {
    /// Create new encoder with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Clear buffer for reuse
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Get encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Encode a batch of commands as a single info request
    pub fn encode_commands<S: AsRef<str>>(&mut self, commands: &[S]) {
        self.buf.clear();
        self.buf.extend_from_slice(&[0u8; HEADER_LEN]);
        for cmd in commands {
            self.buf.extend_from_slice(cmd.as_ref().as_bytes());
            self.buf.push(b'\n');
        }

        let body_len = (self.buf.len() - HEADER_LEN) as u64;
        let header = encode_header(body_len);
        self.buf[..HEADER_LEN].copy_from_slice(&header);
    }
}

/// Build a protocol header for a body of `body_len` bytes
pub fn encode_header(body_len: u64) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = PROTO_VERSION;
    header[1] = MSG_TYPE_INFO;
    let len_bytes = body_len.to_be_bytes();
    header[2..].copy_from_slice(&len_bytes[2..]);
    header
}

/// Validate a header and return the body length
pub fn decode_header(header: &[u8; HEADER_LEN]) -> Result<u64, ProtocolError> {
    if header[0] != PROTO_VERSION || header[1] != MSG_TYPE_INFO {
        return Err(ProtocolError::UnsupportedHeader {
            version: header[0],
            msg_type: header[1],
        });
    }

    let mut len_bytes = [0u8; 8];
    len_bytes[2..].copy_from_slice(&header[2..]);
    let len = u64::from_be_bytes(len_bytes);
    if len > MAX_BODY_LEN {
        return Err(ProtocolError::TooLarge(len));
    }
    Ok(len)
}

/// Info response decoder for blocking reads
pub struct InfoDecoder<R> {
    reader: R,
}

impl<R: Read> InfoDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read one framed response and split it into command -> value pairs
    pub fn decode(&mut self) -> io::Result<InfoMap> {
        let mut header = [0u8; HEADER_LEN];
        self.reader.read_exact(&mut header)?;

        let len = decode_header(&header)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut body = vec![0u8; len as usize];
        self.reader.read_exact(&mut body)?;

        let text = String::from_utf8_lossy(&body);
        Ok(parse_info_body(&text))
    }
}

/// Split a response body into command -> value pairs
///
/// Lines without a tab are commands the server answered with nothing.
pub fn parse_info_body(body: &str) -> InfoMap {
    let mut map = InfoMap::new();
    for line in body.split('\n') {
        if line.is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((name, value)) => map.insert(name.to_string(), value.to_string()),
            None => map.insert(line.to_string(), String::new()),
        };
    }
    map
}
