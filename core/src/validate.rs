//! Structural checks on normalized files.
//!
//! `analyze` compares a file's keys against the fields expected for its
//! file type; `compare` compares a file with the `.backup` it was
//! normalized from. Neither modifies anything.

use crate::{coerce, schema as f, types::RawRecord};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Clients,
    Apartments,
    Loans,
    Shares,
}

impl FileType {
    pub const ALL: [FileType; 4] = [
        FileType::Clients,
        FileType::Apartments,
        FileType::Loans,
        FileType::Shares,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Clients    => "clients",
            FileType::Apartments => "apartments",
            FileType::Loans      => "loans",
            FileType::Shares     => "shares",
        }
    }

    /// `clients` → `clients.json`.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }

    pub fn expected(self) -> &'static ExpectedFields {
        match self {
            FileType::Clients    => &CLIENT_FIELDS,
            FileType::Apartments => &APARTMENT_FIELDS,
            FileType::Loans      => &LOAN_FIELDS,
            FileType::Shares     => &SHARE_FIELDS,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown file type '{s}'"))
    }
}

pub struct ExpectedFields {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl ExpectedFields {
    pub fn is_expected(&self, field: &str) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }
}

const PRODUCT_REQUIRED: &[&str] = &[f::ID, f::PRODUCT_TYPE, f::REMAINING_CAPITAL, f::INVESTMENT_AMOUNT];

pub static CLIENT_FIELDS: ExpectedFields = ExpectedFields {
    required: &[f::ID, f::FULL_NAME, f::CREATED_AT],
    optional: &[f::COMPANY_NAME, f::PHONE, f::EMAIL],
};

pub static APARTMENT_FIELDS: ExpectedFields = ExpectedFields {
    required: PRODUCT_REQUIRED,
    optional: &[
        f::APARTMENT_NUMBER, f::BUILDING, f::ADDRESS, f::AREA, f::ROOM_COUNT,
        f::FLOOR, f::STATUS, f::PRICE_PER_M2, f::DELIVERY_DATE, f::DEVELOPER,
        f::PROJECT_NAME, "balcony", "parkingSpace", "storageRoom", f::CLIENT_ID,
        f::CLIENT_NAME, f::CREATED_AT, f::UPLOADED_AT, f::SOURCE_FILE,
    ],
};

pub static LOAN_FIELDS: ExpectedFields = ExpectedFields {
    required: PRODUCT_REQUIRED,
    optional: &[
        f::LOAN_NUMBER, "loanType", "loanStatus", "loanInterestRate",
        "loanRepaymentTerm", "loanCollateral", f::CLIENT_ID, f::CLIENT_NAME,
        f::CREATED_AT, f::UPLOADED_AT, f::SOURCE_FILE,
    ],
};

pub static SHARE_FIELDS: ExpectedFields = ExpectedFields {
    required: PRODUCT_REQUIRED,
    optional: &[
        f::SHARES_COUNT, "nominalValue", "marketValue", f::CLIENT_ID,
        f::CLIENT_NAME, f::CREATED_AT, f::UPLOADED_AT, f::SOURCE_FILE,
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapitalStats {
    /// Records carrying `remainingCapital` at all.
    pub total:    usize,
    pub zero:     usize,
    /// Every parseable non-zero value; negatives included.
    pub positive: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub file_type:         FileType,
    pub total_records:     usize,
    pub field_counts:      BTreeMap<String, usize>,
    pub missing_required:  BTreeSet<String>,
    pub unexpected_fields: BTreeSet<String>,
    pub capital:           CapitalStats,
}

impl ValidationReport {
    pub fn unique_fields(&self) -> usize {
        self.field_counts.len()
    }

    pub fn is_clean(&self) -> bool {
        self.missing_required.is_empty() && self.unexpected_fields.is_empty()
    }

    /// Fields by descending occurrence, ties by name.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> =
            self.field_counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts.truncate(n);
        counts
    }
}

/// `remainingCapital` as a number, or `None` when it does not parse.
fn capital_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}

pub fn analyze(records: &[RawRecord], file_type: FileType) -> ValidationReport {
    let expected = file_type.expected();
    let mut report = ValidationReport {
        file_type,
        total_records:     records.len(),
        field_counts:      BTreeMap::new(),
        missing_required:  BTreeSet::new(),
        unexpected_fields: BTreeSet::new(),
        capital:           CapitalStats::default(),
    };

    for record in records {
        for &required in expected.required {
            if !record.contains_key(required) {
                report.missing_required.insert(required.to_string());
            }
        }
        for key in record.keys() {
            *report.field_counts.entry(key.clone()).or_default() += 1;
            if !expected.is_expected(key) {
                report.unexpected_fields.insert(key.clone());
            }
        }
        if let Some(value) = record.get(f::REMAINING_CAPITAL) {
            report.capital.total += 1;
            if coerce::is_absent(Some(value)) {
                continue;
            }
            match capital_value(value) {
                Some(v) if v == 0.0 => report.capital.zero += 1,
                Some(_) => report.capital.positive += 1,
                None => {}
            }
        }
    }
    report
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonReport {
    pub original_records:   usize,
    pub normalized_records: usize,
    pub original_fields:    usize,
    pub normalized_fields:  usize,
    pub added_fields:       BTreeSet<String>,
    pub removed_fields:     BTreeSet<String>,
}

impl ComparisonReport {
    pub fn same_record_count(&self) -> bool {
        self.original_records == self.normalized_records
    }
}

fn first_keys(records: &[RawRecord]) -> BTreeSet<String> {
    records
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default()
}

/// Compare the key sets of the first record of each file.
pub fn compare(original: &[RawRecord], normalized: &[RawRecord]) -> ComparisonReport {
    let before = first_keys(original);
    let after  = first_keys(normalized);
    ComparisonReport {
        original_records:   original.len(),
        normalized_records: normalized.len(),
        original_fields:    before.len(),
        normalized_fields:  after.len(),
        added_fields:       after.difference(&before).cloned().collect(),
        removed_fields:     before.difference(&after).cloned().collect(),
    }
}
