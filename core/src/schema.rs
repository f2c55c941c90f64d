//! Canonical field vocabulary and the ordered alias list for each field.
//!
//! An alias list is every source key the mapping table sends to a
//! canonical field, in table order, followed by the canonical name
//! itself. Extractors read a field by trying the aliases in that order
//! and taking the first one that is present and non-empty, so
//! already-normalized input reads the same as a raw export.

use crate::{
    coerce::{self, DateParse},
    error::ParseWarning,
    field_map::FieldMapper,
    types::RawRecord,
};
use serde_json::Value;
use std::collections::HashSet;

// ── Canonical field names ─────────────────────────────────────────

pub const ID: &str = "id";
pub const PRODUCT_TYPE: &str = "productType";
pub const INVESTMENT_AMOUNT: &str = "investmentAmount";
pub const PAYMENT_AMOUNT: &str = "paymentAmount";
pub const REMAINING_CAPITAL: &str = "remainingCapital";
pub const REALIZED_CAPITAL: &str = "realizedCapital";
pub const TRANSFER_TO_OTHER_PRODUCT: &str = "transferToOtherProduct";
pub const CAPITAL_FOR_RESTRUCTURING: &str = "capitalForRestructuring";
pub const CAPITAL_SECURED_BY_REAL_ESTATE: &str = "capitalSecuredByRealEstate";
pub const CLIENT_ID: &str = "clientId";
pub const CLIENT_NAME: &str = "clientName";
pub const COMPANY_ID: &str = "companyId";
pub const SALE_ID: &str = "saleId";
pub const BRANCH: &str = "branch";
pub const ADVISOR: &str = "advisor";
pub const PRODUCT_NAME: &str = "productName";
pub const PRODUCT_STATUS: &str = "productStatus";
pub const PRODUCT_STATUS_ENTRY: &str = "productStatusEntry";
pub const SIGNED_DATE: &str = "signedDate";
pub const INVESTMENT_ENTRY_DATE: &str = "investmentEntryDate";
pub const ISSUE_DATE: &str = "issueDate";
pub const REDEMPTION_DATE: &str = "redemptionDate";
pub const MATURITY_DATE: &str = "maturityDate";
pub const SHARES_COUNT: &str = "sharesCount";
pub const SOURCE_FILE: &str = "sourceFile";
pub const CREATED_AT: &str = "createdAt";
pub const UPLOADED_AT: &str = "uploadedAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const ADDITIONAL_INFO: &str = "additionalInfo";

// Loans
pub const LOAN_NUMBER: &str = "loanNumber";
pub const BORROWER: &str = "borrower";
pub const CREDITOR_COMPANY: &str = "creditorCompany";
pub const INTEREST_RATE: &str = "interestRate";
pub const DISBURSEMENT_DATE: &str = "disbursementDate";
pub const REPAYMENT_DATE: &str = "repaymentDate";
pub const ACCRUED_INTEREST: &str = "accruedInterest";
pub const COLLATERAL: &str = "collateral";
pub const STATUS: &str = "status";

// Bonds
pub const REALIZED_INTEREST: &str = "realizedInterest";
pub const REMAINING_INTEREST: &str = "remainingInterest";
pub const REALIZED_TAX: &str = "realizedTax";
pub const REMAINING_TAX: &str = "remainingTax";

// Apartments
pub const PROJECT_NAME: &str = "projectName";
pub const APARTMENT_NUMBER: &str = "apartmentNumber";
pub const BUILDING: &str = "building";
pub const ADDRESS: &str = "address";
pub const AREA: &str = "area";
pub const ROOM_COUNT: &str = "roomCount";
pub const FLOOR: &str = "floor";
pub const PRICE_PER_M2: &str = "pricePerM2";
pub const DELIVERY_DATE: &str = "deliveryDate";
pub const DEVELOPER: &str = "developer";

// Clients
pub const FULL_NAME: &str = "fullName";
pub const EXCEL_ID: &str = "excelId";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const PESEL: &str = "pesel";
pub const COMPANY_NAME: &str = "companyName";

/// The ordered source names tried for one canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    pub target:  String,
    pub aliases: Vec<String>,
}

impl FieldAliases {
    pub fn resolve(mapper: &FieldMapper, target: &str) -> Self {
        let mut aliases: Vec<String> = mapper.sources_of(target).map(str::to_string).collect();
        if !aliases.iter().any(|a| a == target) {
            aliases.push(target.to_string());
        }
        Self { target: target.to_string(), aliases }
    }
}

/// The first present, non-empty value among `aliases`.
pub fn first_present<'r>(record: &'r RawRecord, aliases: &FieldAliases) -> Option<&'r Value> {
    aliases
        .aliases
        .iter()
        .filter_map(|alias| record.get(alias))
        .find(|v| !coerce::is_absent(Some(v)))
}

/// Read access to one raw record that remembers which source keys
/// were consulted, so the rest can be carried into `additionalInfo`.
pub struct SourceView<'r> {
    record:   &'r RawRecord,
    index:    usize,
    mapper:   &'r FieldMapper,
    consumed: HashSet<String>,
    warnings: Vec<ParseWarning>,
}

impl<'r> SourceView<'r> {
    pub fn new(record: &'r RawRecord, index: usize, mapper: &'r FieldMapper) -> Self {
        Self {
            record,
            index,
            mapper,
            consumed: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw value for a canonical field; marks all its aliases consumed.
    pub fn get(&mut self, target: &str) -> Option<&'r Value> {
        let aliases = FieldAliases::resolve(self.mapper, target);
        let value = first_present(self.record, &aliases);
        self.consumed.extend(aliases.aliases);
        value
    }

    pub fn float(&mut self, target: &str) -> f64 {
        coerce::to_float(self.get(target), 0.0)
    }

    pub fn int(&mut self, target: &str) -> i64 {
        coerce::to_int(self.get(target), 0)
    }

    pub fn text(&mut self, target: &str) -> String {
        coerce::to_text(self.get(target))
    }

    pub fn opt_text(&mut self, target: &str) -> Option<String> {
        coerce::to_opt_text(self.get(target))
    }

    /// Lenient date. Pass-through and unreadable values are reported.
    pub fn date(&mut self, target: &str) -> Option<String> {
        match coerce::classify_date(self.get(target)) {
            DateParse::PassThrough(raw) => {
                self.warn(target, &raw, "not a recognized date format, kept verbatim");
                Some(raw)
            }
            DateParse::Invalid(raw) => {
                self.warn(target, &raw, "unreadable date, recorded as null");
                None
            }
            parsed => parsed.into_value(),
        }
    }

    /// Strict `YYYY-MM-DD` date; anything else is reported and becomes null.
    pub fn strict_date(&mut self, target: &str) -> Option<String> {
        let value = self.get(target);
        match coerce::parse_date_strict(value) {
            Ok(date) => date,
            Err(reason) => {
                self.warn(target, &coerce::to_text(value), &reason);
                None
            }
        }
    }

    fn warn(&mut self, field: &str, raw: &str, reason: &str) {
        self.warnings.push(ParseWarning {
            record_index: self.index,
            field:        field.to_string(),
            raw_value:    raw.to_string(),
            reason:       reason.to_string(),
        });
    }

    /// Source keys never consulted, in document order, verbatim.
    pub fn leftovers(&self) -> RawRecord {
        self.record
            .iter()
            .filter(|(k, _)| !self.consumed.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }
}
