//! Product extraction: apartments, loans, shares, bonds.
//!
//! One matching input record yields exactly one ProductRecord, in input
//! order. Ids are synthesized over the filtered sequence:
//! the 7th matching bond is `bond_0007`, whatever its position in the file.

use crate::{
    coerce,
    field_map::FieldMapper,
    record::{
        ApartmentDetails, BondDetails, LoanDetails, ProductDetails, ProductRecord, ShareDetails,
    },
    schema::{self as f, FieldAliases, SourceView},
    transform::{Extraction, RecordTransformer, TransformContext},
    types::{synthetic_id, DomainKind, RawRecord},
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Label used in histograms for records without a product type.
pub const NO_PRODUCT_TYPE: &str = "(none)";

/// The kinds a ProductExtractor can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductKind {
    Apartment,
    Loan,
    Share,
    Bond,
}

impl ProductKind {
    fn of(kind: DomainKind) -> Option<Self> {
        match kind {
            DomainKind::Apartment => Some(Self::Apartment),
            DomainKind::Loan      => Some(Self::Loan),
            DomainKind::Share     => Some(Self::Share),
            DomainKind::Bond      => Some(Self::Bond),
            DomainKind::Client    => None,
        }
    }
}

pub struct ProductExtractor {
    kind:    DomainKind,
    product: ProductKind,
    label:   &'static str,
    mapper:  FieldMapper,
}

impl ProductExtractor {
    /// Returns `None` for `DomainKind::Client`, which is not a product.
    pub fn new(kind: DomainKind) -> Option<Self> {
        Self::with_mapper(kind, FieldMapper::for_kind(kind))
    }

    pub fn with_mapper(kind: DomainKind, mapper: FieldMapper) -> Option<Self> {
        let product = ProductKind::of(kind)?;
        let label = kind.product_label()?;
        Some(Self { kind, product, label, mapper })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    /// True when the record's product type names this extractor's kind.
    /// Comparison ignores surrounding whitespace and letter case.
    pub fn matches(&self, record: &RawRecord) -> bool {
        product_type_of(record, &self.mapper)
            .is_some_and(|t| t.to_lowercase() == self.label.to_lowercase())
    }

    fn build(&self, view: &mut SourceView<'_>, position: usize, ctx: &TransformContext) -> ProductRecord {
        view.get(f::PRODUCT_TYPE);

        let client_name    = view.text(f::CLIENT_NAME);
        let product_name   = view.text(f::PRODUCT_NAME);
        let product_status = view.text(f::PRODUCT_STATUS);

        let investment_entry_date = view.date(f::INVESTMENT_ENTRY_DATE);
        let redemption            = view.date(f::REDEMPTION_DATE);
        let maturity              = view.date(f::MATURITY_DATE);
        let redemption_date = redemption.clone().or_else(|| maturity.clone());
        let maturity_date   = maturity.or(redemption);

        let shares_count = match self.product {
            ProductKind::Share => Some(view.int(f::SHARES_COUNT)),
            _ => None,
        };

        let details = match self.product {
            ProductKind::Apartment => ProductDetails::Apartment(ApartmentDetails {
                project_name:     view.opt_text(f::PROJECT_NAME).unwrap_or_else(|| product_name.clone()),
                creditor_company: view.text(f::CREDITOR_COMPANY),
                apartment_number: view.opt_text(f::APARTMENT_NUMBER),
                building:         view.opt_text(f::BUILDING),
                address:          view.opt_text(f::ADDRESS),
                area:             view.float(f::AREA),
                room_count:       view.int(f::ROOM_COUNT),
                floor:            view.int(f::FLOOR),
                price_per_m2:     view.float(f::PRICE_PER_M2),
                delivery_date:    view.date(f::DELIVERY_DATE),
                developer:        view.opt_text(f::DEVELOPER),
            }),
            ProductKind::Loan => ProductDetails::Loan(LoanDetails {
                loan_number:       view.opt_text(f::LOAN_NUMBER),
                borrower:          view.opt_text(f::BORROWER).unwrap_or_else(|| client_name.clone()),
                creditor_company:  view.text(f::CREDITOR_COMPANY),
                interest_rate:     view.float(f::INTEREST_RATE),
                disbursement_date: view.date(f::DISBURSEMENT_DATE).or_else(|| investment_entry_date.clone()),
                repayment_date:    view.date(f::REPAYMENT_DATE).or_else(|| maturity_date.clone()),
                accrued_interest:  view.float(f::ACCRUED_INTEREST),
                collateral:        view.opt_text(f::COLLATERAL),
                status:            view.opt_text(f::STATUS).unwrap_or_else(|| product_status.clone()),
            }),
            ProductKind::Share => ProductDetails::Share(ShareDetails::default()),
            ProductKind::Bond => ProductDetails::Bond(BondDetails {
                realized_interest:  view.float(f::REALIZED_INTEREST),
                remaining_interest: view.float(f::REMAINING_INTEREST),
                realized_tax:       view.float(f::REALIZED_TAX),
                remaining_tax:      view.float(f::REMAINING_TAX),
                interest_rate:      view.float(f::INTEREST_RATE),
            }),
        };

        let source_file = view.opt_text(f::SOURCE_FILE).unwrap_or_else(|| ctx.source_file.clone());
        let created_at  = view.opt_text(f::CREATED_AT).unwrap_or_else(|| ctx.now.clone());
        view.get(f::UPLOADED_AT);

        let mut additional_info = match view.get(f::ADDITIONAL_INFO) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => RawRecord::new(),
        };

        let mut record = ProductRecord {
            id:                             synthetic_id(self.kind, position),
            product_type:                   self.label.to_string(),
            investment_amount:              view.float(f::INVESTMENT_AMOUNT),
            payment_amount:                 view.float(f::PAYMENT_AMOUNT),
            remaining_capital:              view.float(f::REMAINING_CAPITAL),
            realized_capital:               view.float(f::REALIZED_CAPITAL),
            transfer_to_other_product:      view.float(f::TRANSFER_TO_OTHER_PRODUCT),
            capital_for_restructuring:      view.float(f::CAPITAL_FOR_RESTRUCTURING),
            capital_secured_by_real_estate: view.float(f::CAPITAL_SECURED_BY_REAL_ESTATE),
            client_id:                      view.text(f::CLIENT_ID),
            client_name,
            company_id:                     view.text(f::COMPANY_ID),
            sale_id:                        view.text(f::SALE_ID),
            branch:                         view.text(f::BRANCH),
            advisor:                        view.text(f::ADVISOR),
            product_name,
            product_status,
            product_status_entry:           view.text(f::PRODUCT_STATUS_ENTRY),
            signed_date:                    view.date(f::SIGNED_DATE),
            investment_entry_date,
            issue_date:                     view.date(f::ISSUE_DATE),
            redemption_date,
            maturity_date,
            shares_count,
            source_file,
            created_at,
            uploaded_at:                    ctx.now.clone(),
            details,
            additional_info:                RawRecord::new(),
        };

        additional_info.extend(view.leftovers());
        record.additional_info = additional_info;
        record
    }
}

impl RecordTransformer for ProductExtractor {
    type Output = ProductRecord;

    fn kind(&self) -> DomainKind {
        self.kind
    }

    fn transform(
        &self,
        records: &[RawRecord],
        filter_by_kind: bool,
        ctx: &TransformContext,
    ) -> Extraction<ProductRecord> {
        let mut out = Extraction::empty();
        out.considered = records.len();

        for (index, raw) in records.iter().enumerate() {
            if filter_by_kind && !self.matches(raw) {
                continue;
            }
            out.selected += 1;
            let mut view = SourceView::new(raw, index, &self.mapper);
            let record = self.build(&mut view, out.selected, ctx);
            out.warnings.extend(view.into_warnings());
            out.records.push(record);
        }

        for w in &out.warnings {
            log::warn!("{}: {w}", self.kind);
        }
        out
    }
}

/// Trimmed product type of a raw record, from the first alias present.
pub fn product_type_of(record: &RawRecord, mapper: &FieldMapper) -> Option<String> {
    let aliases = FieldAliases::resolve(mapper, f::PRODUCT_TYPE);
    f::first_present(record, &aliases).map(|v| coerce::to_text(Some(v)))
}

/// How many records carry each product type, sorted by type.
pub fn product_type_histogram(records: &[RawRecord], mapper: &FieldMapper) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let label = product_type_of(record, mapper).unwrap_or_else(|| NO_PRODUCT_TYPE.to_string());
        *counts.entry(label).or_default() += 1;
    }
    counts.into_iter().collect()
}
