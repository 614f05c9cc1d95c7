//! Administrative user query
//!
//! The privileged admin RPC is served by an external client; the exporter
//! only needs the per-user records it returns.

use crate::utils::AdminError;

/// Quota and usage figures for one user
///
/// `read_info` and `write_info` hold, in order: quota, single-record TPS,
/// scan/query RPS, limitless scan/query count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserRecord {
    pub user: String,
    pub conns_in_use: f64,
    pub read_info: [f64; 4],
    pub write_info: [f64; 4],
}

/// Black-box admin client
pub trait UserAdmin: Send {
    fn query_users(&mut self) -> Result<Vec<UserRecord>, AdminError>;

    /// Re-establish the admin session after a failed query
    fn reconnect(&mut self) -> Result<(), AdminError>;
}

impl<T: UserAdmin + ?Sized> UserAdmin for Box<T> {
    fn query_users(&mut self) -> Result<Vec<UserRecord>, AdminError> {
        (**self).query_users()
    }

    fn reconnect(&mut self) -> Result<(), AdminError> {
        (**self).reconnect()
    }
}
