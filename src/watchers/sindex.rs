//! Secondary index statistics

use tracing::debug;

use super::{Emitter, Round};
use crate::metrics::{parse_record, parse_records, StatContext};

const SINDEX_KEY: &str = "sindex";

pub struct SindexWatcher {
    disabled: bool,
    /// (namespace, index name) found in round 1
    indexes: Vec<(String, String)>,
}

impl SindexWatcher {
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled,
            indexes: Vec::new(),
        }
    }

    pub fn discover(&self) -> Vec<String> {
        if self.disabled {
            return Vec::new();
        }
        vec![SINDEX_KEY.to_string()]
    }

    pub fn detail(&mut self, round1: &Round<'_>) -> Vec<String> {
        self.indexes.clear();
        if self.disabled {
            return Vec::new();
        }
        let Some(raw) = round1.get(SINDEX_KEY) else {
            return Vec::new();
        };

        for record in parse_records(raw, ';', ':') {
            match (record.get("ns"), record.get("indexname")) {
                (Some(ns), Some(index)) => self.indexes.push((ns.to_string(), index.to_string())),
                _ => debug!("Ignoring sindex entry without ns/indexname"),
            }
        }

        self.indexes
            .iter()
            .map(|(ns, index)| detail_key(ns, index))
            .collect()
    }

    pub fn refresh(&mut self, round2: &Round<'_>, emitter: &Emitter<'_>) {
        for (ns, index) in &self.indexes {
            let Some(raw) = round2.get(&detail_key(ns, index)) else {
                continue;
            };
            let labels = [("ns", ns.as_str()), ("sindex", index.as_str())];
            for (stat, value) in parse_record(raw, ';').iter() {
                emitter.stat(StatContext::Sindex, stat, value, &labels);
            }
        }
    }
}

fn detail_key(ns: &str, index: &str) -> String {
    format!("sindex/{}/{}", ns, index)
}
