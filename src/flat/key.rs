//! Flat record values and the tagged key scheme

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The raw flat namespace as the metadata store hands it to us. Keys arrive
/// in inconsistent case from two independent writers; values may be strings,
/// numbers, or booleans.
pub type FlatRecord = BTreeMap<String, FlatValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FlatValue {
    pub fn text<S: Into<String>>(value: S) -> Self {
        FlatValue::Text(value.into())
    }
}

impl From<&str> for FlatValue {
    fn from(value: &str) -> Self {
        FlatValue::Text(value.to_string())
    }
}

impl From<String> for FlatValue {
    fn from(value: String) -> Self {
        FlatValue::Text(value)
    }
}

impl From<f64> for FlatValue {
    fn from(value: f64) -> Self {
        FlatValue::Number(value)
    }
}

impl From<bool> for FlatValue {
    fn from(value: bool) -> Self {
        FlatValue::Bool(value)
    }
}

/// A parsed flat key. Keys are canonicalized and classified once at the
/// boundary; section logic never touches raw strings again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatKey {
    /// `summary`, `contact_email`, ...
    Scalar { name: String },
    /// `experience_count`
    Count { section: String },
    /// `experience_0_company`
    Indexed {
        section: String,
        index: usize,
        field: String,
    },
}

impl FlatKey {
    /// Parse an already-canonical key.
    pub fn parse(canonical: &str) -> FlatKey {
        let segments: Vec<&str> = canonical.split('_').filter(|s| !s.is_empty()).collect();

        if segments.len() >= 2 && segments[segments.len() - 1] == "count" {
            return FlatKey::Count {
                section: segments[..segments.len() - 1].join("_"),
            };
        }

        // First numeric segment splits section from field.
        for (i, segment) in segments.iter().enumerate() {
            if i == 0 || i == segments.len() - 1 {
                continue;
            }
            if let Ok(index) = segment.parse::<usize>() {
                return FlatKey::Indexed {
                    section: segments[..i].join("_"),
                    index,
                    field: segments[i + 1..].join("_"),
                };
            }
        }

        FlatKey::Scalar {
            name: segments.join("_"),
        }
    }

    pub fn render(&self) -> String {
        match self {
            FlatKey::Scalar { name } => name.clone(),
            FlatKey::Count { section } => format!("{}_count", section),
            FlatKey::Indexed { section, index, field } => {
                format!("{}_{}_{}", section, index, field)
            }
        }
    }
}

/// Normalize a raw key to canonical lower_snake form. Handles both writer
/// case conventions (`Experience_0_Company`, `experienceCount`) so lookups
/// downstream never have to try variants.
pub fn canonical_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower_or_digit = false;

    for ch in raw.trim().chars() {
        if ch == ' ' || ch == '-' || ch == '.' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower_or_digit && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else {
            if ch != '_' {
                prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            } else {
                prev_lower_or_digit = false;
                if out.ends_with('_') {
                    continue;
                }
            }
            out.push(ch);
        }
    }

    out.trim_matches('_').to_string()
}

/// Central sentinel strip: empty strings and `"n/a"` both mean absent.
pub fn clean_str(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sentinel-strip a flat value down to `Option<String>`.
pub fn clean_value(value: &FlatValue) -> Option<String> {
    match value {
        FlatValue::Text(s) => clean_str(s),
        FlatValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        FlatValue::Bool(b) => Some(b.to_string()),
    }
}

/// Lenient truthiness for `is_current`-style flags.
pub fn truthy(value: &FlatValue) -> bool {
    match value {
        FlatValue::Bool(b) => *b,
        FlatValue::Number(n) => *n != 0.0,
        FlatValue::Text(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1" || s.eq_ignore_ascii_case("yes")
        }
    }
}

/// Lenient count parse: non-numeric or missing means zero.
pub fn parse_count(value: Option<&FlatValue>) -> usize {
    match value {
        Some(FlatValue::Number(n)) if *n >= 0.0 => *n as usize,
        Some(FlatValue::Text(s)) => s.trim().parse::<usize>().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_handles_both_writer_cases() {
        assert_eq!(canonical_key("Experience_0_Company"), "experience_0_company");
        assert_eq!(canonical_key("experienceCount"), "experience_count");
        assert_eq!(canonical_key("contact_email"), "contact_email");
        assert_eq!(canonical_key("Contact Email"), "contact_email");
    }

    #[test]
    fn test_parse_count_key() {
        assert_eq!(
            FlatKey::parse("experience_count"),
            FlatKey::Count { section: "experience".to_string() }
        );
    }

    #[test]
    fn test_parse_indexed_key_with_multiword_field() {
        assert_eq!(
            FlatKey::parse("experience_0_start_date"),
            FlatKey::Indexed {
                section: "experience".to_string(),
                index: 0,
                field: "start_date".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_scalar_key() {
        assert_eq!(FlatKey::parse("summary"), FlatKey::Scalar { name: "summary".to_string() });
        assert_eq!(
            FlatKey::parse("contact_email"),
            FlatKey::Scalar { name: "contact_email".to_string() }
        );
    }

    #[test]
    fn test_key_render_round_trip() {
        for raw in ["summary", "experience_count", "education_2_field_of_study"] {
            assert_eq!(FlatKey::parse(raw).render(), raw);
        }
    }

    #[test]
    fn test_sentinels_mean_absent() {
        assert_eq!(clean_str(""), None);
        assert_eq!(clean_str("  "), None);
        assert_eq!(clean_str("n/a"), None);
        assert_eq!(clean_str("N/A"), None);
        assert_eq!(clean_str("Acme"), Some("Acme".to_string()));
    }

    #[test]
    fn test_parse_count_is_lenient() {
        assert_eq!(parse_count(Some(&FlatValue::Text("3".to_string()))), 3);
        assert_eq!(parse_count(Some(&FlatValue::Number(2.0))), 2);
        assert_eq!(parse_count(Some(&FlatValue::Text("lots".to_string()))), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn test_truthy_variants() {
        assert!(truthy(&FlatValue::Bool(true)));
        assert!(truthy(&FlatValue::Text("true".to_string())));
        assert!(truthy(&FlatValue::Text("1".to_string())));
        assert!(!truthy(&FlatValue::Text("false".to_string())));
        assert!(!truthy(&FlatValue::Number(0.0)));
    }
}
