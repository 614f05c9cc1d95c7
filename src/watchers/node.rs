//! Node-wide statistics

use super::{Emitter, Round};
use crate::metrics::{parse_record, StatContext};

const STATISTICS_KEY: &str = "statistics";

#[derive(Default)]
pub struct NodeWatcher;

impl NodeWatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn detail(&self) -> Vec<String> {
        vec![STATISTICS_KEY.to_string()]
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        let Some(raw) = round2.get(STATISTICS_KEY) else {
            return;
        };
        for (stat, value) in parse_record(raw, ';').iter() {
            emitter.stat(StatContext::Node, stat, value, &[]);
        }
    }
}
