//! Canonical records: the English, typed shape the application reads.
//!
//! Serialized field names are camelCase and stable. Every product record
//! carries the full common field set; type-specific fields are flattened
//! into the same JSON object.

use crate::types::{DomainKind, EntityId, RawRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Individual,
    Company,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id:                    EntityId,
    pub excel_id:              String,
    pub full_name:             String,
    pub name:                  String,
    pub email:                 String,
    pub phone:                 String,
    pub address:               String,
    pub pesel:                 Option<String>,
    pub company_name:          Option<String>,
    #[serde(rename = "type")]
    pub client_type:           ClientType,
    pub notes:                 String,
    pub voting_status:         String,
    pub color_code:            String,
    pub unviable_investments:  Vec<String>,
    pub first_investment_date: Option<String>,
    pub created_at:            String,
    pub updated_at:            String,
    pub is_active:             bool,
    pub additional_info:       RawRecord,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id:                             EntityId,
    pub product_type:                   String,
    pub investment_amount:              f64,
    pub payment_amount:                 f64,
    pub remaining_capital:              f64,
    pub realized_capital:               f64,
    pub transfer_to_other_product:      f64,
    pub capital_for_restructuring:      f64,
    pub capital_secured_by_real_estate: f64,
    pub client_id:                      String,
    pub client_name:                    String,
    pub company_id:                     String,
    pub sale_id:                        String,
    pub branch:                         String,
    pub advisor:                        String,
    pub product_name:                   String,
    pub product_status:                 String,
    pub product_status_entry:           String,
    pub signed_date:                    Option<String>,
    pub investment_entry_date:          Option<String>,
    pub issue_date:                     Option<String>,
    pub redemption_date:                Option<String>,
    pub maturity_date:                  Option<String>,
    /// Only shares have a count; null everywhere else.
    pub shares_count:                   Option<i64>,
    pub source_file:                    String,
    pub created_at:                     String,
    pub uploaded_at:                    String,
    #[serde(flatten)]
    pub details:                        ProductDetails,
    pub additional_info:                RawRecord,
}

impl ProductRecord {
    pub fn kind(&self) -> DomainKind {
        self.details.kind()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ProductDetails {
    Apartment(ApartmentDetails),
    Loan(LoanDetails),
    Share(ShareDetails),
    Bond(BondDetails),
}

impl ProductDetails {
    pub fn kind(&self) -> DomainKind {
        match self {
            ProductDetails::Apartment(_) => DomainKind::Apartment,
            ProductDetails::Loan(_)      => DomainKind::Loan,
            ProductDetails::Share(_)     => DomainKind::Share,
            ProductDetails::Bond(_)      => DomainKind::Bond,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentDetails {
    pub project_name:     String,
    pub creditor_company: String,
    pub apartment_number: Option<String>,
    pub building:         Option<String>,
    pub address:          Option<String>,
    pub area:             f64,
    pub room_count:       i64,
    pub floor:            i64,
    pub price_per_m2:     f64,
    pub delivery_date:    Option<String>,
    pub developer:        Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub loan_number:       Option<String>,
    pub borrower:          String,
    pub creditor_company:  String,
    pub interest_rate:     f64,
    pub disbursement_date: Option<String>,
    pub repayment_date:    Option<String>,
    pub accrued_interest:  f64,
    pub collateral:        Option<String>,
    pub status:            String,
}

/// Shares have no fields beyond the common set and `sharesCount`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ShareDetails {}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BondDetails {
    pub realized_interest:  f64,
    pub remaining_interest: f64,
    pub realized_tax:       f64,
    pub remaining_tax:      f64,
    pub interest_rate:      f64,
}
