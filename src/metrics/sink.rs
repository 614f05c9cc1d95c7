//! Metric sink and the in-memory store behind the exposition output
//!
//! Watchers hand fully named, labeled samples to a [`MetricsSink`]. The
//! bundled [`MetricsStore`] holds the last complete cycle: the observer
//! collects a cycle into its own buffer and swaps it in with
//! [`MetricsSink::replace`], so series the node stopped reporting disappear
//! and a reader never sees a half-refreshed cycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use prometheus::proto::{self, LabelPair, Metric, MetricFamily};
use prometheus::{Encoder, TextEncoder};

use super::registry::MetricType;

pub type Labels = BTreeMap<String, String>;

/// One exported series value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub help: String,
    pub labels: Labels,
    pub metric_type: MetricType,
    pub value: f64,
}

/// Receiver of exported samples
pub trait MetricsSink: Send + Sync {
    /// Upsert one series, leaving every other series in place
    fn emit(&self, sample: MetricSample);

    /// Drop every series and keep only `samples`
    fn replace(&self, samples: Vec<MetricSample>);
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn emit(&self, sample: MetricSample) {
        (**self).emit(sample)
    }

    fn replace(&self, samples: Vec<MetricSample>) {
        (**self).replace(samples)
    }
}

/// `.`, `-` and spaces become `_`
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | '-' | ' ' => '_',
            other => other,
        })
        .collect()
}

/// `_`, `-` and `.` become spaces
pub fn help_text(stat: &str) -> String {
    stat.chars()
        .map(|c| match c {
            '_' | '-' | '.' => ' ',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Family {
    help: String,
    metric_type: MetricType,
    series: BTreeMap<Labels, f64>,
}

impl Family {
    fn to_proto(&self, name: &str) -> MetricFamily {
        let mut family = MetricFamily::default();
        family.set_name(name.to_string());
        family.set_help(self.help.clone());
        family.set_field_type(match self.metric_type {
            MetricType::Gauge => proto::MetricType::GAUGE,
            MetricType::Counter => proto::MetricType::COUNTER,
        });

        for (labels, value) in &self.series {
            let mut metric = Metric::default();
            for (k, v) in labels {
                let mut pair = LabelPair::default();
                pair.set_name(k.clone());
                pair.set_value(v.clone());
                metric.mut_label().push(pair);
            }
            match self.metric_type {
                MetricType::Gauge => {
                    let mut gauge = proto::Gauge::default();
                    gauge.set_value(*value);
                    metric.set_gauge(gauge);
                }
                MetricType::Counter => {
                    let mut counter = proto::Counter::default();
                    counter.set_value(*value);
                    metric.set_counter(counter);
                }
            }
            family.mut_metric().push(metric);
        }
        family
    }
}

type Families = BTreeMap<String, Family>;

fn upsert(families: &mut Families, sample: MetricSample) {
    let family = families.entry(sample.name).or_insert_with(|| Family {
        help: sample.help,
        metric_type: sample.metric_type,
        series: BTreeMap::new(),
    });
    family.series.insert(sample.labels, sample.value);
}

fn flatten(families: &Families) -> Vec<MetricSample> {
    let mut out = Vec::new();
    for (name, family) in families {
        for (labels, value) in &family.series {
            out.push(MetricSample {
                name: name.clone(),
                help: family.help.clone(),
                labels: labels.clone(),
                metric_type: family.metric_type,
                value: *value,
            });
        }
    }
    out
}

/// Latest value per (name, labels), safe to read while a cycle writes
#[derive(Debug, Default)]
pub struct MetricsStore {
    families: RwLock<Families>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of one series
    pub fn get(&self, name: &str, labels: &Labels) -> Option<f64> {
        self.families
            .read()
            .get(name)
            .and_then(|f| f.series.get(labels).copied())
    }

    /// Every stored sample, sorted by name then labels
    pub fn samples(&self) -> Vec<MetricSample> {
        flatten(&self.families.read())
    }

    pub fn into_samples(self) -> Vec<MetricSample> {
        flatten(&self.families.into_inner())
    }

    /// Samples whose name starts with `prefix`
    pub fn samples_with_prefix(&self, prefix: &str) -> Vec<MetricSample> {
        self.samples()
            .into_iter()
            .filter(|s| s.name.starts_with(prefix))
            .collect()
    }

    pub fn series_count(&self) -> usize {
        self.families.read().values().map(|f| f.series.len()).sum()
    }

    /// Metric families sorted by name
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.families
            .read()
            .iter()
            .map(|(name, family)| family.to_proto(name))
            .collect()
    }

    /// Render in the Prometheus text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// JSON snapshot of every series
    pub fn to_json(&self) -> serde_json::Value {
        let samples: Vec<serde_json::Value> = self
            .samples()
            .into_iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "type": s.metric_type.as_str(),
                    "labels": s.labels,
                    "value": s.value,
                })
            })
            .collect();
        serde_json::json!({ "metrics": samples })
    }
}

impl MetricsSink for MetricsStore {
    fn emit(&self, sample: MetricSample) {
        upsert(&mut self.families.write(), sample);
    }

    fn replace(&self, samples: Vec<MetricSample>) {
        let mut next = Families::new();
        for sample in samples {
            upsert(&mut next, sample);
        }
        *self.families.write() = next;
    }
}
