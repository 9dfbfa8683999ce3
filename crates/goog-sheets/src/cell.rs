//! Normalisation of formatted cell strings into typed values.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[allow(clippy::expect_used)]
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9.\-]+)%$").expect("Invalid percent regex"));

#[allow(clippy::expect_used)]
static PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([0-9.,]+)\)$").expect("Invalid parens regex"));

#[allow(clippy::expect_used)]
static GROUPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\-,]+$").expect("Invalid grouped number regex"));

#[allow(clippy::expect_used)]
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-0-9]+\.[0-9]+$").expect("Invalid float regex"));

#[allow(clippy::expect_used)]
static INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-0-9]+$").expect("Invalid int regex"));

/// A spreadsheet cell after normalisation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Normalise a formatted cell: `""`/`"-"` are empty, `12%` is `12`,
/// `(1,234)` is `-1234`, `1,234.5` is `1234.5`. Numbers that do not parse
/// stay text.
pub fn parse_cell(raw: &str) -> CellValue {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return CellValue::Empty;
    }

    let s = match PERCENT.captures(s) {
        Some(c) => c[1].to_string(),
        None => s.to_string(),
    };
    let s = match PARENS.captures(&s) {
        Some(c) => format!("-{}", &c[1]),
        None => s,
    };
    let s = if GROUPED.is_match(&s) { s.replace(',', "") } else { s };

    if FLOAT.is_match(&s) {
        if let Ok(x) = s.parse::<f64>() {
            return CellValue::Float(x);
        }
    } else if INT.is_match(&s) {
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Int(i);
        }
    }
    CellValue::Text(s)
}
