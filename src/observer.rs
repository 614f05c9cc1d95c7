//! Poll cycle orchestration
//!
//! One cycle is exactly two info round trips against a single node:
//!
//! 1. every watcher's discovery keys plus `build`
//! 2. every watcher's detail keys plus the identity keys
//!
//! Watchers then refresh in their fixed order against the round-2 results
//! into a per-cycle buffer, which replaces the sink's contents once the
//! cycle completes. A liveness gauge is emitted every cycle. When a round
//! fails after all retries the gauge drops to 0 and the cycle ends; the
//! previous cycle's samples stay in the sink.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::{InfoClient, InfoConnector, UserAdmin};
use crate::config::StatSettings;
use crate::metrics::{Labels, MetricsSink, MetricsStore, StatRegistry};
use crate::utils::{ConfigError, ConnectionError, InfoMap, Result};
use crate::watchers::{build_watchers, Emitter, Round, UserWatcher, Watcher};

/// Attempts per round before the cycle is abandoned
const MAX_ATTEMPTS: usize = 3;

const BUILD_KEY: &str = "build";
const CLUSTER_NAME_KEY: &str = "cluster-name";
const SERVICE_CLEAR_KEY: &str = "service-clear-std";
const SERVICE_TLS_KEY: &str = "service-tls-std";

/// Node identity as last reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeIdentity {
    pub cluster_name: String,
    pub service: String,
    pub build: String,
}

pub struct Observer<C: InfoConnector> {
    connector: C,
    conn: Option<C::Conn>,
    watchers: Vec<Watcher>,
    registry: StatRegistry,
    sink: Arc<dyn MetricsSink>,
    prefix: String,
    constant_labels: Labels,
    service_key: &'static str,
    identity: NodeIdentity,
}

impl<C: InfoConnector> Observer<C> {
    /// Compile filters and build the watcher set; fails on invalid settings
    pub fn new(
        connector: C,
        settings: &StatSettings,
        sink: Arc<dyn MetricsSink>,
    ) -> std::result::Result<Self, ConfigError> {
        let service_key = if connector.uses_tls() {
            SERVICE_TLS_KEY
        } else {
            SERVICE_CLEAR_KEY
        };

        Ok(Self {
            connector,
            conn: None,
            watchers: build_watchers(settings)?,
            registry: settings.build_registry()?,
            sink,
            prefix: settings.metric_prefix.clone(),
            constant_labels: settings.constant_labels.clone(),
            service_key,
            identity: NodeIdentity::default(),
        })
    }

    /// Enable per-user statistics through an admin client
    pub fn with_user_admin(mut self, admin: Box<dyn UserAdmin>) -> Self {
        self.watchers.retain(|w| !matches!(w, Watcher::Users(_)));
        self.watchers.push(Watcher::Users(UserWatcher::new(admin)));
        self
    }

    pub fn registry(&self) -> &StatRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn watcher_names(&self) -> Vec<&'static str> {
        self.watchers.iter().map(Watcher::name).collect()
    }

    /// Run one poll cycle
    pub fn refresh(&mut self) -> Result<()> {
        let mut round1_keys: Vec<String> =
            self.watchers.iter().flat_map(Watcher::discover).collect();
        round1_keys.push(BUILD_KEY.to_string());
        let round1 = self.request_round(dedup(round1_keys))?;
        let round1 = Round::new(&round1);

        let mut round2_keys = Vec::new();
        for watcher in &mut self.watchers {
            round2_keys.extend(watcher.detail(&round1));
        }
        round2_keys.extend([
            CLUSTER_NAME_KEY.to_string(),
            self.service_key.to_string(),
            BUILD_KEY.to_string(),
        ]);
        let round2 = self.request_round(dedup(round2_keys))?;
        let round2 = Round::new(&round2);

        self.identity = NodeIdentity {
            cluster_name: round2.get(CLUSTER_NAME_KEY).unwrap_or_default().to_string(),
            service: round2.get(self.service_key).unwrap_or_default().to_string(),
            build: round2.get(BUILD_KEY).unwrap_or_default().to_string(),
        };

        let cycle = MetricsStore::new();
        let emitter = Emitter::new(
            &cycle,
            &self.registry,
            &self.prefix,
            base_labels(&self.identity, &self.constant_labels),
        );
        emitter.liveness(true, &self.identity.build);

        for watcher in &mut self.watchers {
            debug!("Refreshing {} watcher", watcher.name());
            watcher.refresh(&round2, &emitter);
        }

        self.sink.replace(cycle.into_samples());
        Ok(())
    }

    /// Send one round, reconnecting between attempts
    ///
    /// On final failure the node is reported down before the error returns.
    fn request_round(&mut self, keys: Vec<String>) -> Result<InfoMap> {
        let mut last_error = ConnectionError::Closed;

        for attempt in 1..=MAX_ATTEMPTS {
            if self.conn.is_none() {
                match self.connector.connect() {
                    Ok(conn) => self.conn = Some(conn),
                    Err(e) => {
                        warn!("Connect attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                        last_error = e;
                        continue;
                    }
                }
            }
            let Some(conn) = self.conn.as_mut() else {
                continue;
            };

            match conn.request_info(&keys) {
                Ok(responses) => return Ok(responses),
                Err(e) => {
                    warn!("Info request attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    self.conn = None;
                    last_error = e;
                }
            }
        }

        self.mark_down();
        Err(last_error.into())
    }

    fn mark_down(&self) {
        let emitter = Emitter::new(
            &*self.sink,
            &self.registry,
            &self.prefix,
            base_labels(&self.identity, &self.constant_labels),
        );
        emitter.liveness(false, &self.identity.build);
    }
}

fn base_labels(identity: &NodeIdentity, constant_labels: &Labels) -> Labels {
    let mut labels = constant_labels.clone();
    labels.insert("cluster_name".to_string(), identity.cluster_name.clone());
    labels.insert("service".to_string(), identity.service.clone());
    labels
}

/// Drop repeated keys, keeping first-seen order
fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}
