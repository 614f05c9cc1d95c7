//! Latency histogram decoding
//!
//! Two wire generations exist, both reported per `{namespace}-operation`:
//!
//! Legacy `latency:`
//! ```text
//! {test}-read:10:17:37-GMT,ops/sec,>1ms,>8ms;10:17:47,1000,10,1;
//! ```
//! Current `latencies:`
//! ```text
//! {test}-write:msec,100,5,0;
//! ```
//!
//! Both carry a throughput followed by the percentage of operations slower
//! than each threshold. They are converted into cumulative "at or below"
//! buckets: `bucket[i] = ops - pct[i] * ops / 100`, with the throughput itself
//! as the `+Inf` bucket.

use tracing::{debug, error, warn};

use super::scanner::{parse_float, InfoScanner, Token};
use crate::utils::ProtocolError;

/// Marker the legacy format uses for histograms without data yet
const LEGACY_ERROR_PREFIX: &str = "error";

/// Label every legacy header carries as its first column
const LEGACY_THROUGHPUT_LABEL: &str = "ops/sec";

pub const INF_LABEL: &str = "+Inf";

/// Which `latenc*` command produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyFormat {
    Legacy,
    Current,
}

impl LatencyFormat {
    /// Pick the format from the info command that produced the response
    pub fn for_command(command: &str) -> Option<Self> {
        if command.starts_with("latencies:") {
            Some(LatencyFormat::Current)
        } else if command.starts_with("latency:") {
            Some(LatencyFormat::Legacy)
        } else {
            None
        }
    }
}

/// One cumulative bucket
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyBucket {
    /// Upper bound in `unit`, or `+Inf`
    pub label: String,
    pub value: f64,
}

/// Decoded histogram for one namespace/operation
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyHistogram {
    /// Empty for node-wide histograms such as `batch-index`
    pub namespace: String,
    pub operation: String,
    /// `ms` or `us`
    pub unit: String,
    /// First bucket is always `+Inf`
    pub buckets: Vec<LatencyBucket>,
}

impl LatencyHistogram {
    /// Total operations per second (the `+Inf` bucket)
    pub fn throughput(&self) -> f64 {
        self.buckets.first().map(|b| b.value).unwrap_or(0.0)
    }
}

/// Decode a response in the given format
///
/// `max_buckets` limits buckets per histogram including `+Inf`; 0 means all.
pub fn decode(format: LatencyFormat, response: &str, max_buckets: usize) -> Vec<LatencyHistogram> {
    match format {
        LatencyFormat::Legacy => decode_legacy(response, max_buckets),
        LatencyFormat::Current => decode_current(response, max_buckets),
    }
}

/// Decode a `latencies:` response
pub fn decode_current(response: &str, max_buckets: usize) -> Vec<LatencyHistogram> {
    let mut histograms = Vec::new();
    let mut scanner = InfoScanner::new(response);

    while !scanner.is_empty() {
        let section = scanner.read_until(';').as_str().trim();
        if section.is_empty() {
            continue;
        }

        match parse_current_section(section, max_buckets) {
            Ok(Some(hist)) => histograms.push(hist),
            Ok(None) => debug!("No latency data in {:?}", section),
            Err(e) => warn!("Skipping latency section {:?}: {}", section, e),
        }
    }

    histograms
}

fn parse_current_section(
    section: &str,
    max_buckets: usize,
) -> Result<Option<LatencyHistogram>, ProtocolError> {
    let mut scanner = InfoScanner::new(section);
    let (namespace, operation) = read_histogram_name(&mut scanner)?;

    let unit = match scanner.read_until(',') {
        Token::Found(unit) => normalize_unit(unit),
        // Only a unit (or nothing) after the name
        Token::End(_) => return Ok(None),
    };

    let mut raw = Vec::new();
    loop {
        let token = scanner.read_until(',');
        raw.push(parse_float(token.as_str())?);
        if !token.is_found() {
            break;
        }
    }

    // Trailing zero percentages add nothing over the +Inf bucket
    let mut len = raw.len();
    while len > 1 && raw[len - 1] == 0.0 {
        len -= 1;
    }
    raw.truncate(len);

    let mut labels = vec![INF_LABEL.to_string()];
    for i in 1..raw.len() {
        match 1u64.checked_shl((i - 1) as u32) {
            Some(bound) => labels.push(bound.to_string()),
            None => break,
        }
    }
    raw.truncate(labels.len());

    Ok(Some(LatencyHistogram {
        namespace,
        operation,
        unit,
        buckets: cumulative_buckets(labels, &raw, max_buckets),
    }))
}

/// Decode a legacy `latency:` response
pub fn decode_legacy(response: &str, max_buckets: usize) -> Vec<LatencyHistogram> {
    let mut histograms = Vec::new();
    let mut scanner = InfoScanner::new(response);

    while !scanner.is_empty() {
        if scanner.peek_and_expect(LEGACY_ERROR_PREFIX).is_ok() {
            let sentinel = scanner.read_until(';');
            debug!("Skipping legacy latency sentinel {:?}", sentinel.as_str());
            continue;
        }

        let header = scanner.read_until(';').as_str().trim();
        if header.is_empty() {
            continue;
        }
        if !header.contains(LEGACY_THROUGHPUT_LABEL) {
            warn!("Skipping unexpected legacy latency section {:?}", header);
            continue;
        }

        let values = scanner.read_until(';').as_str().trim();
        match parse_legacy_record(header, values, max_buckets) {
            Ok(hist) => histograms.push(hist),
            Err(e @ ProtocolError::BucketMismatch { .. }) => {
                error!("Discarding latency histogram: {}", e)
            }
            Err(e) => warn!("Skipping legacy latency record {:?}: {}", header, e),
        }
    }

    histograms
}

fn parse_legacy_record(
    header: &str,
    values: &str,
    max_buckets: usize,
) -> Result<LatencyHistogram, ProtocolError> {
    let mut scanner = InfoScanner::new(header);
    let (namespace, operation) = read_histogram_name(&mut scanner)?;

    // Column header: timestamp, then ops/sec and the thresholds
    scanner.read_field(',')?;
    let labels: Vec<String> = scanner
        .remaining()
        .split(',')
        .enumerate()
        .map(|(i, label)| {
            if i == 0 {
                INF_LABEL.to_string()
            } else {
                label.chars().filter(|c| !"><=ms".contains(*c)).collect()
            }
        })
        .collect();

    let mut scanner = InfoScanner::new(values);
    scanner.read_field(',')?;
    let mut raw = Vec::new();
    loop {
        let token = scanner.read_until(',');
        raw.push(parse_float(token.as_str())?);
        if !token.is_found() {
            break;
        }
    }

    if labels.len() != raw.len() {
        return Err(ProtocolError::BucketMismatch {
            key: format_key(&namespace, &operation),
            labels: labels.len(),
            values: raw.len(),
        });
    }

    Ok(LatencyHistogram {
        namespace,
        operation,
        unit: "ms".to_string(),
        buckets: cumulative_buckets(labels, &raw, max_buckets),
    })
}

/// Read `{ns}-op:` or `op:` up to and including the colon
fn read_histogram_name(scanner: &mut InfoScanner<'_>) -> Result<(String, String), ProtocolError> {
    let namespace = if scanner.peek_and_expect("{").is_ok() {
        scanner.expect_literal("{")?;
        let ns = scanner.read_field('}')?;
        scanner.expect_literal("-")?;
        ns.to_string()
    } else {
        String::new()
    };

    let operation = scanner.read_field(':')?.trim();
    if operation.is_empty() {
        return Err(ProtocolError::Mismatch {
            expected: "operation name".to_string(),
            actual: String::new(),
        });
    }
    Ok((namespace, operation.to_string()))
}

/// `msec` -> `ms`, `usec` -> `us`
fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim();
    unit.strip_suffix("ec").unwrap_or(unit).to_string()
}

fn cumulative_buckets(labels: Vec<String>, raw: &[f64], max_buckets: usize) -> Vec<LatencyBucket> {
    let ops = raw.first().copied().unwrap_or(0.0);
    labels
        .into_iter()
        .zip(raw.iter())
        .enumerate()
        .take(if max_buckets == 0 { usize::MAX } else { max_buckets })
        .map(|(i, (label, pct))| LatencyBucket {
            label,
            value: if i == 0 { ops } else { ops - (pct * ops / 100.0) },
        })
        .collect()
}

fn format_key(namespace: &str, operation: &str) -> String {
    if namespace.is_empty() {
        operation.to_string()
    } else {
        format!("{{{}}}-{}", namespace, operation)
    }
}
