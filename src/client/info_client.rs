//! Info client traits
//!
//! `InfoClient` abstracts one batched info round trip: send commands, get a
//! command → value map back. `InfoConnector` creates fresh clients so the
//! observer can drop a broken link and build a new one lazily.
//!
//! Implementations:
//! - `InfoConnection`: direct TCP/TLS with the info frame codec
//! - test mocks returning canned responses

use crate::utils::{ConnectionError, InfoMap};

/// One connection able to serve info requests
pub trait InfoClient {
    /// Send every command in a single frame and return the parsed response
    ///
    /// Commands missing from the response are simply absent from the map.
    fn request_info(&mut self, commands: &[String]) -> Result<InfoMap, ConnectionError>;
}

impl<T: InfoClient + ?Sized> InfoClient for Box<T> {
    fn request_info(&mut self, commands: &[String]) -> Result<InfoMap, ConnectionError> {
        (**self).request_info(commands)
    }
}

/// Factory for info connections
pub trait InfoConnector {
    type Conn: InfoClient;

    fn connect(&self) -> Result<Self::Conn, ConnectionError>;

    /// Whether connections are TLS (selects the advertised service key)
    fn uses_tls(&self) -> bool {
        false
    }
}


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    #[test]
    fn test_mock_replays_in_order() {
        let connector = MockConnector::default();
        connector.reply(&[("build", "6.1.0.0")]);
        connector.fail();

        let mut client = connector.connect().unwrap();
        let first = client.request_info(&["build".to_string()]).unwrap();
        assert_eq!(first.get("build").map(String::as_str), Some("6.1.0.0"));
        assert!(client.request_info(&["build".to_string()]).is_err());
        assert_eq!(connector.script.borrow().requests.len(), 2);
    }

    #[test]
    fn test_boxed_client() {
        let connector = MockConnector::default();
        connector.reply(&[("statistics", "uptime=5")]);
        let mut boxed: Box<dyn InfoClient> = Box::new(connector.connect().unwrap());
        let map = boxed.request_info(&["statistics".to_string()]).unwrap();
        assert_eq!(map["statistics"], "uptime=5");
    }
}
