//! Indexed sub-resource stats in namespace records
//!
//! Device, file and mount stats arrive as
//! `<prefix>.<subtype>[<index>].<stat>=<value>` next to an identifier key
//! `<prefix>.<subtype>[<index>]=<device or path>`. They are exported as one
//! metric per `<prefix>_<subtype>_<stat>` carrying the index and identifier
//! as labels.

use regex::Regex;
use tracing::warn;

use super::record::StatRecord;

/// Label rule for one indexed prefix
#[derive(Debug)]
struct ArrayPrefix {
    prefix: &'static str,
    pattern: Regex,
    /// Top-level field whose value becomes an extra label, and that label's name
    type_label: Option<(&'static str, &'static str)>,
}

/// Indexed prefixes and how their labels are built
const ARRAY_PREFIXES: &[(&str, Option<(&str, &str)>)] = &[
    ("storage-engine", None),
    ("index-type", Some(("index-type", "index"))),
    ("sindex-type", Some(("sindex-type", "sindex"))),
];

/// One stat decomposed from an indexed key
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayStat {
    /// Composite name, e.g. `storage-engine_file_defrag_q`
    pub name: String,
    pub value: String,
    pub labels: Vec<(String, String)>,
}

/// How a namespace record key should be handled
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayMatch {
    /// Not an indexed key; classify as a plain stat
    Plain,
    /// Identifier key such as `storage-engine.file[0]`; consumed as a label
    Identifier,
    /// Indexed stat, decomposed
    Stat(ArrayStat),
    /// Looks indexed but could not be decomposed
    Dropped,
}

/// Compiled prefix table
#[derive(Debug)]
pub struct ArrayStatExtractor {
    prefixes: Vec<ArrayPrefix>,
    identifier: Regex,
}

impl ArrayStatExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let prefixes = ARRAY_PREFIXES
            .iter()
            .map(|&(prefix, type_label)| -> Result<ArrayPrefix, regex::Error> {
                let pattern = Regex::new(&format!(
                    r"^{}\.(\w+)\[(\d+)\]\.(.+)$",
                    regex::escape(prefix)
                ))?;
                Ok(ArrayPrefix {
                    prefix,
                    pattern,
                    type_label,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            prefixes,
            identifier: Regex::new(r"^[\w.-]+\.\w+\[\d+\]$")?,
        })
    }

    /// Classify one key of `record`
    pub fn extract(&self, key: &str, value: &str, record: &StatRecord) -> ArrayMatch {
        if !key.contains('[') {
            return ArrayMatch::Plain;
        }
        if self.identifier.is_match(key) {
            return ArrayMatch::Identifier;
        }

        for rule in &self.prefixes {
            let Some(caps) = rule.pattern.captures(key) else {
                continue;
            };
            let (subtype, index, sub_metric) = (&caps[1], &caps[2], &caps[3]);

            let id_key = format!("{}.{}[{}]", rule.prefix, subtype, index);
            let Some(identifier) = record.get(&id_key) else {
                warn!("Dropping {}: no identifier key {}", key, id_key);
                return ArrayMatch::Dropped;
            };

            let mut labels = vec![
                (format!("{}_index", subtype), index.to_string()),
                (subtype.to_string(), identifier.to_string()),
            ];
            if let Some((field, label)) = rule.type_label {
                if let Some(kind) = record.get(field) {
                    labels.push((label.to_string(), kind.to_string()));
                }
            }

            return ArrayMatch::Stat(ArrayStat {
                name: format!("{}_{}_{}", rule.prefix, subtype, sub_metric),
                value: value.to_string(),
                labels,
            });
        }

        warn!("Dropping unrecognized indexed stat {}", key);
        ArrayMatch::Dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::record::parse_record;

    #[test]
    fn test_storage_engine_file() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = parse_record(
            "storage-engine.file[0]=/dev/sda;storage-engine.file[0].defrag_q=12",
            ';',
        );

        let result = extractor.extract("storage-engine.file[0].defrag_q", "12", &record);
        assert_eq!(
            result,
            ArrayMatch::Stat(ArrayStat {
                name: "storage-engine_file_defrag_q".to_string(),
                value: "12".to_string(),
                labels: vec![
                    ("file_index".to_string(), "0".to_string()),
                    ("file".to_string(), "/dev/sda".to_string()),
                ],
            })
        );
    }

    #[test]
    fn test_identifier_key_is_consumed() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = parse_record("storage-engine.device[3]=/dev/nvme0n1", ';');
        assert_eq!(
            extractor.extract("storage-engine.device[3]", "/dev/nvme0n1", &record),
            ArrayMatch::Identifier
        );
    }

    #[test]
    fn test_index_type_label() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = parse_record(
            "index-type=flash;index-type.mount[1]=/mnt/idx;index-type.mount[1].age=4",
            ';',
        );

        let ArrayMatch::Stat(stat) = extractor.extract("index-type.mount[1].age", "4", &record)
        else {
            panic!("expected indexed stat");
        };
        assert_eq!(stat.name, "index-type_mount_age");
        assert!(stat
            .labels
            .contains(&("mount_index".to_string(), "1".to_string())));
        assert!(stat
            .labels
            .contains(&("mount".to_string(), "/mnt/idx".to_string())));
        assert!(stat.labels.contains(&("index".to_string(), "flash".to_string())));
    }

    #[test]
    fn test_sindex_type_label() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = parse_record(
            "sindex-type=pmem;sindex-type.mount[0]=/mnt/si;sindex-type.mount[0].x=9",
            ';',
        );

        let ArrayMatch::Stat(stat) = extractor.extract("sindex-type.mount[0].x", "9", &record)
        else {
            panic!("expected indexed stat");
        };
        assert_eq!(stat.name, "sindex-type_mount_x");
        assert_eq!(
            stat.labels,
            vec![
                ("mount_index".to_string(), "0".to_string()),
                ("mount".to_string(), "/mnt/si".to_string()),
                ("sindex".to_string(), "pmem".to_string()),
            ]
        );
    }

    #[test]
    fn test_storage_engine_has_no_type_label() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = parse_record(
            "index-type=flash;storage-engine.file[0]=/f;storage-engine.file[0].age=1",
            ';',
        );
        let ArrayMatch::Stat(stat) = extractor.extract("storage-engine.file[0].age", "1", &record)
        else {
            panic!("expected indexed stat");
        };
        assert_eq!(stat.labels.len(), 2);
    }

    #[test]
    fn test_missing_identifier_is_dropped() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = parse_record("storage-engine.file[2].used_bytes=10", ';');
        assert_eq!(
            extractor.extract("storage-engine.file[2].used_bytes", "10", &record),
            ArrayMatch::Dropped
        );
    }

    #[test]
    fn test_malformed_indexed_key_is_dropped() {
        let extractor = ArrayStatExtractor::new().unwrap();
        let record = StatRecord::new();
        assert_eq!(
            extractor.extract("storage-engine.file[x].age", "1", &record),
            ArrayMatch::Dropped
        );
        assert_eq!(
            extractor.extract("unknown.thing[0].age", "1", &record),
            ArrayMatch::Dropped
        );
        assert_eq!(extractor.extract("objects", "1", &record), ArrayMatch::Plain);
    }
}
