//! Flat stat record parsing and numeric coercion
//!
//! Info responses carry stats as `key=value` tokens joined by a field
//! separator (`;` for namespace/node/xdr stats, `:` for set and sindex
//! entries). Values stay as text until a watcher asks for a number.

use crate::utils::ConversionError;

/// Ordered key/value pairs from one record; duplicate keys keep the last value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatRecord {
    pairs: Vec<(String, String)>,
}

impl StatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key, keeping its first position
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split `s` on `separator` into key/value pairs
///
/// Tokens without `=` are dropped; everything after the first `=` is the value.
pub fn parse_record(s: &str, separator: char) -> StatRecord {
    let mut record = StatRecord::new();
    for token in s.split(separator) {
        if let Some((key, value)) = token.split_once('=') {
            record.insert(key.trim(), value);
        }
    }
    record
}

/// Split a multi-entity response into records, skipping empty entries
pub fn parse_records(s: &str, record_separator: char, field_separator: char) -> Vec<StatRecord> {
    s.split(record_separator)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| parse_record(r, field_separator))
        .filter(|r| !r.is_empty())
        .collect()
}

/// Coerce a raw stat value to a number
///
/// Floats parse as-is; `true`/`false` (any case) map to 1.0/0.0.
pub fn coerce_numeric(s: &str) -> Result<f64, ConversionError> {
    let trimmed = s.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return Ok(v);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(1.0);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(0.0);
    }
    Err(ConversionError::InvalidValue(s.to_string()))
}

/// Split a plain list response (`test;bar;` or `dc1,dc2`), skipping blanks
pub fn parse_list(s: &str, separator: char) -> Vec<String> {
    s.split(separator)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
