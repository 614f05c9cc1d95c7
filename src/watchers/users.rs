//! Per-user connection and quota statistics
//!
//! Served by the privileged admin API rather than info commands, so this
//! watcher adds no keys to either round. It needs build 5.6 or newer and
//! turns itself off for good on older builds or when the configured user
//! lacks permission to read user statistics.

use tracing::{debug, error, info, warn};

use super::{Emitter, Round};
use crate::client::{UserAdmin, UserRecord};
use crate::metrics::{MetricType, StatContext};
use crate::utils::BuildVersion;

const USER_STATS_BUILD: BuildVersion = BuildVersion::new(5, 6, 0, 0);

const MAX_ATTEMPTS: usize = 3;

const READ_STATS: [&str; 4] = [
    "read_quota",
    "read_single_record_tps",
    "read_scan_query_rps",
    "limitless_read_scan_query",
];

const WRITE_STATS: [&str; 4] = [
    "write_quota",
    "write_single_record_tps",
    "write_scan_query_rps",
    "limitless_write_scan_query",
];

/// One-way latch for user statistics support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatsState {
    Unknown,
    Enabled,
    Disabled,
}

pub struct UserWatcher {
    admin: Box<dyn UserAdmin>,
    state: UserStatsState,
}

impl UserWatcher {
    pub fn new(admin: Box<dyn UserAdmin>) -> Self {
        Self {
            admin,
            state: UserStatsState::Unknown,
        }
    }

    pub fn state(&self) -> UserStatsState {
        self.state
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        if self.state == UserStatsState::Unknown {
            match round2.build {
                Some(build) if build.at_least(&USER_STATS_BUILD) => {
                    self.state = UserStatsState::Enabled;
                }
                Some(build) => {
                    info!(
                        "User statistics need build {} or newer, node runs {}",
                        USER_STATS_BUILD, build
                    );
                    self.state = UserStatsState::Disabled;
                }
                None => {
                    debug!("Build unknown, deferring user statistics");
                    return;
                }
            }
        }
        if self.state == UserStatsState::Disabled {
            return;
        }

        if let Some(users) = self.query_with_retry() {
            for user in &users {
                if emitter
                    .registry()
                    .classify_fixed(StatContext::Users, &user.user, MetricType::Gauge)
                    .allowed
                {
                    emit_user(user, emitter);
                }
            }
        }
    }

    fn query_with_retry(&mut self) -> Option<Vec<UserRecord>> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.admin.query_users() {
                Ok(users) => return Some(users),
                Err(e) if e.is_permission_denied() => {
                    warn!("Disabling user statistics: {}", e);
                    self.state = UserStatsState::Disabled;
                    return None;
                }
                Err(e) => {
                    warn!("User query attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    if attempt < MAX_ATTEMPTS {
                        if let Err(e) = self.admin.reconnect() {
                            warn!("Admin reconnect failed: {}", e);
                        }
                    }
                }
            }
        }
        error!("Giving up on user statistics this cycle");
        None
    }
}

fn emit_user(user: &UserRecord, emitter: &Emitter<'_>) {
    let labels = [("user", user.user.as_str())];
    emitter.value(
        StatContext::Users,
        "conns_in_use",
        MetricType::Gauge,
        user.conns_in_use,
        &labels,
    );
    for (stat, value) in READ_STATS.iter().zip(user.read_info) {
        emitter.value(StatContext::Users, stat, MetricType::Gauge, value, &labels);
    }
    for (stat, value) in WRITE_STATS.iter().zip(user.write_info) {
        emitter.value(StatContext::Users, stat, MetricType::Gauge, value, &labels);
    }
}
