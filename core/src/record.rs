//! Compact query-string encoding of a measurement set.
//!
//! Each record is one `key=value` pair; the value is a comma-joined field
//! list, percent-encoded:
//! - `d`: direct measurement, `name,unit[,typeB1][,typeB2]`
//! - `c`: composite measurement, `name,formula`
//! - `o`: output, `u,name[,displayUnit]`
//!
//! Pair order is display order. Unknown keys are skipped on decode.

use crate::measurement::MAX_UNCERTAINTY_B;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("Malformed record: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Direct {
        name: String,
        unit: String,
        /// Non-blank type-B values, at most two
        uncertainty_b: Vec<String>,
    },
    Composite {
        name: String,
        formula: String,
    },
    Output {
        name: String,
        display_unit: Option<String>,
    },
}

impl Record {
    fn key(&self) -> &'static str {
        match self {
            Record::Direct { .. } => "d",
            Record::Composite { .. } => "c",
            Record::Output { .. } => "o",
        }
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            Record::Direct {
                name,
                unit,
                uncertainty_b,
            } => {
                let mut fields = vec![name.as_str(), unit.as_str()];
                fields.extend(
                    uncertainty_b
                        .iter()
                        .map(String::as_str)
                        .filter(|v| !v.is_empty())
                        .take(MAX_UNCERTAINTY_B),
                );
                fields
            }
            Record::Composite { name, formula } => vec![name.as_str(), formula.as_str()],
            Record::Output { name, display_unit } => {
                let mut fields = vec!["u", name.as_str()];
                if let Some(unit) = display_unit.as_deref().filter(|u| !u.is_empty()) {
                    fields.push(unit);
                }
                fields
            }
        }
    }

    fn from_pair(key: &str, value: &str) -> Option<Record> {
        let fields: Vec<&str> = value.split(',').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("").to_string();

        match key {
            "d" => Some(Record::Direct {
                name: field(0),
                unit: field(1),
                uncertainty_b: fields
                    .iter()
                    .skip(2)
                    .filter(|v| !v.is_empty())
                    .take(MAX_UNCERTAINTY_B)
                    .map(|v| v.to_string())
                    .collect(),
            }),
            "c" => Some(Record::Composite {
                name: field(0),
                formula: fields.get(1..).map(|rest| rest.join(",")).unwrap_or_default(),
            }),
            "o" if fields.first() == Some(&"u") => Some(Record::Output {
                name: field(1),
                display_unit: fields
                    .get(2)
                    .filter(|u| !u.is_empty())
                    .map(|u| u.to_string()),
            }),
            _ => None,
        }
    }
}

/// Encode records as `key=value&...` in order.
pub fn encode(records: &[Record]) -> String {
    records
        .iter()
        .map(|r| format!("{}={}", r.key(), urlencoding::encode(&r.fields().join(","))))
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(text: &str) -> Result<String, RecordError> {
    let spaced = text.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| RecordError::Malformed(format!("{}: {}", text, e)))
}

/// Decode a query string, with or without its leading `?`.
pub fn decode(query: &str) -> Result<Vec<Record>, RecordError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut records = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;
        if let Some(record) = Record::from_pair(&key, &value) {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_direct_and_output() {
        let records = vec![
            Record::Direct {
                name: "m".to_string(),
                unit: "cm".to_string(),
                uncertainty_b: vec!["0.5".to_string(), String::new()],
            },
            Record::Output {
                name: "m".to_string(),
                display_unit: None,
            },
        ];
        assert_eq!(encode(&records), "d=m%2Ccm%2C0.5&o=u%2Cm");
        assert_eq!(decode(&encode(&records)).unwrap()[1], records[1]);
    }

    #[test]
    fn test_decode_browser_form() {
        let records = decode("?d=l%2Ccm%2C0.1+cm&c=v%2Cl+%2F+t&o=u%2Cv%2Cm%2Fs").unwrap();
        assert_eq!(
            records,
            vec![
                Record::Direct {
                    name: "l".to_string(),
                    unit: "cm".to_string(),
                    uncertainty_b: vec!["0.1 cm".to_string()],
                },
                Record::Composite {
                    name: "v".to_string(),
                    formula: "l / t".to_string(),
                },
                Record::Output {
                    name: "v".to_string(),
                    display_unit: Some("m/s".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_decode_skips_unknown_and_caps_type_b() {
        let records = decode("x=1&o=z%2Cq&d=t%2Cs%2C1%2C2%2C3").unwrap();
        assert_eq!(records.len(), 1);
        match &records[0] {
            Record::Direct { uncertainty_b, .. } => assert_eq!(uncertainty_b, &["1", "2"]),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode("d=%FF"), Err(RecordError::Malformed(_))));
        assert_eq!(decode("").unwrap(), vec![]);
    }

    #[test]
    fn test_round_trip_keeps_order() {
        let records = vec![
            Record::Composite {
                name: "g".to_string(),
                formula: "4 pi^2 l / T^2".to_string(),
            },
            Record::Direct {
                name: "T".to_string(),
                unit: "s".to_string(),
                uncertainty_b: vec![],
            },
            Record::Output {
                name: "g".to_string(),
                display_unit: Some("m/s^2".to_string()),
            },
        ];
        assert_eq!(decode(&encode(&records)).unwrap(), records);
    }
}
