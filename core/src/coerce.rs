//! Value coercers.
//!
//! Every function here is total: any JSON value (or its absence) maps to
//! a canonical value. Absence means `None`, `null`, an empty or blank
//! string, or the literal `"NULL"` in any letter case.

use chrono::NaiveDate;
use serde_json::Value;

/// Zero-time suffix appended by the lenient date parser.
const ZERO_TIME_Z: &str = "T00:00:00.000Z";

/// Two-digit years below this pivot are read as 20xx, the rest as 19xx.
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 30;

pub fn is_null_sentinel(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}

/// True when the value carries no information.
pub fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => is_null_sentinel(s),
        Some(_) => false,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    if is_null_sentinel(s) {
        return None;
    }
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Float with thousands separators removed: `"305,700.00"` → `305700.0`.
pub fn to_float(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(default),
        Some(Value::Bool(b)) => if *b { 1.0 } else { 0.0 },
        Some(Value::String(s)) => parse_number(s).unwrap_or(default),
        _ => default,
    }
}

/// Integer, truncated toward zero: `"12.0"` → `12`.
pub fn to_int(value: Option<&Value>, default: i64) -> i64 {
    let as_float = match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return i;
            }
            n.as_f64()
        }
        Some(Value::Bool(b)) => return i64::from(*b),
        Some(Value::String(s)) => parse_number(s),
        _ => None,
    };
    match as_float {
        // Out-of-range floats saturate on cast; reject them instead.
        Some(f) if f.abs() < i64::MAX as f64 => f.trunc() as i64,
        _ => default,
    }
}

/// Trimmed text; absence becomes the empty string.
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if is_null_sentinel(s) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Like `to_text`, but absence is `None`.
pub fn to_opt_text(value: Option<&Value>) -> Option<String> {
    if is_absent(value) {
        None
    } else {
        Some(to_text(value))
    }
}

/// What the lenient parser made of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParse {
    /// No value.
    Missing,
    /// Recognized and rewritten to `YYYY-MM-DDT00:00:00.000Z`.
    Parsed(String),
    /// Not a recognized shape; returned as-is.
    PassThrough(String),
    /// A recognized shape with unreadable parts.
    Invalid(String),
}

impl DateParse {
    pub fn into_value(self) -> Option<String> {
        match self {
            DateParse::Parsed(s) | DateParse::PassThrough(s) => Some(s),
            DateParse::Missing | DateParse::Invalid(_) => None,
        }
    }
}

/// Classify a raw date for the lenient parser.
///
/// - containing `-`: the part before the first space, with zero time;
/// - containing `/`: `M/D/YY` or `M/D/YYYY`;
/// - anything else: passed through unchanged.
///
/// Dash-form dates are not calendar-checked.
pub fn classify_date(value: Option<&Value>) -> DateParse {
    let raw = match value {
        None | Some(Value::Null) => return DateParse::Missing,
        Some(Value::String(s)) => s,
        Some(other) => return DateParse::Invalid(other.to_string()),
    };
    if is_null_sentinel(raw) {
        return DateParse::Missing;
    }
    let s = raw.trim();

    if s.contains('-') {
        let date_part = s.split(' ').next().unwrap_or(s);
        return DateParse::Parsed(format!("{date_part}{ZERO_TIME_Z}"));
    }

    if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 {
            return DateParse::PassThrough(raw.clone());
        }
        let nums: Option<Vec<i32>> = parts.iter().map(|p| p.trim().parse::<i32>().ok()).collect();
        let Some(nums) = nums else {
            return DateParse::Invalid(raw.clone());
        };
        let (month, day, mut year) = (nums[0], nums[1], nums[2]);
        if (0..100).contains(&year) {
            year += if year < TWO_DIGIT_YEAR_PIVOT { 2000 } else { 1900 };
        }
        return DateParse::Parsed(format!("{year:04}-{month:02}-{day:02}{ZERO_TIME_Z}"));
    }

    DateParse::PassThrough(raw.clone())
}

/// Lenient date parse: `"2019-06-22 00:00:00"` → `"2019-06-22T00:00:00.000Z"`,
/// `"2/8/19"` → `"2019-02-08T00:00:00.000Z"`.
pub fn parse_date(value: Option<&Value>) -> Option<String> {
    classify_date(value).into_value()
}

/// Strict date parse: exactly `YYYY-MM-DD`, optionally followed by a
/// space and a time of day that is discarded. Returns `YYYY-MM-DDT00:00:00`.
///
/// `Ok(None)` for absence; `Err` with a reason for any other shape.
pub fn parse_date_strict(value: Option<&Value>) -> Result<Option<String>, String> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => return Err(format!("expected a date string, got {other}")),
    };
    if is_null_sentinel(raw) {
        return Ok(None);
    }
    let date_part = raw.trim().split(' ').next().unwrap_or_default();
    if date_part.len() != 10 {
        return Err("expected YYYY-MM-DD".to_string());
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(|d| Some(d.format("%Y-%m-%dT00:00:00").to_string()))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
