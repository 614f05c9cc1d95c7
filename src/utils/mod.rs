//! Utility modules

pub mod error;
pub mod info_codec;
pub mod version;

pub use error::{
    AdminError, ConfigError, ConnectionError, ConversionError, ExporterError, ProtocolError,
    Result,
};
pub use info_codec::{InfoDecoder, InfoEncoder, InfoMap};
pub use version::BuildVersion;
