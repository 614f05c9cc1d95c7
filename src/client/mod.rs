//! Client connection layer

pub mod admin;
pub mod info_client;
pub mod info_connection;

pub use admin::{UserAdmin, UserRecord};
pub use info_client::{InfoClient, InfoConnector};
pub use info_connection::{ConnectionFactory, InfoConnection};
