//! Client extraction from the investment master export.
//!
//! The export has one row per investment, each naming its client.
//! A client record is built from the first row that names a client;
//! later rows with the exact same name are dropped.
//!
//! Names containing a staff fragment (an advisor, a branch office)
//! are excluded: those rows record internal staff in the client column.
//! Substring match is case-sensitive, so a real client whose name
//! contains a staff surname is excluded too. The fragment list is
//! configuration (ClientFilter), not code.

use crate::{
    field_map::FieldMapper,
    record::{ClientRecord, ClientType},
    schema::{self as f, SourceView},
    transform::{Extraction, RecordTransformer, TransformContext},
    types::{synthetic_id, DomainKind, RawRecord},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const DEFAULT_VOTING_STATUS: &str = "undecided";
pub const DEFAULT_COLOR_CODE: &str = "#FFFFFF";

/// Staff fragments observed in the client column of the master export.
pub const DEFAULT_STAFF_FRAGMENTS: &[&str] = &[
    "Michał Ostrowski",
    "Ewelina Morzywołek",
    "Damian Kijowski",
    "MISA",
    "Metropolitan",
    "Biuro",
    "Oddział",
    "Opiekun",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientFilter {
    /// A name containing any of these is not a client.
    pub staff_fragments: Vec<String>,
}

impl ClientFilter {
    pub fn none() -> Self {
        Self { staff_fragments: Vec::new() }
    }

    pub fn is_staff(&self, name: &str) -> bool {
        self.staff_fragments
            .iter()
            .any(|fragment| !fragment.is_empty() && name.contains(fragment.as_str()))
    }
}

impl Default for ClientFilter {
    fn default() -> Self {
        Self {
            staff_fragments: DEFAULT_STAFF_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Why a row did not become a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSkips {
    pub blank_name: usize,
    pub staff:      usize,
    pub duplicate:  usize,
}

pub struct ClientExtractor {
    filter: ClientFilter,
    mapper: FieldMapper,
}

impl ClientExtractor {
    pub fn new(filter: ClientFilter) -> Self {
        Self::with_mapper(filter, FieldMapper::for_kind(DomainKind::Client))
    }

    pub fn with_mapper(filter: ClientFilter, mapper: FieldMapper) -> Self {
        Self { filter, mapper }
    }

    pub fn filter(&self) -> &ClientFilter {
        &self.filter
    }

    /// Transform and also report why rows were skipped.
    pub fn transform_with_skips(
        &self,
        records: &[RawRecord],
        ctx: &TransformContext,
    ) -> (Extraction<ClientRecord>, ClientSkips) {
        let mut out = Extraction::empty();
        let mut skips = ClientSkips::default();
        let mut seen: HashSet<String> = HashSet::new();
        out.considered = records.len();

        for (index, raw) in records.iter().enumerate() {
            let mut view = SourceView::new(raw, index, &self.mapper);
            let full_name = view.text(f::FULL_NAME);

            if full_name.is_empty() {
                skips.blank_name += 1;
                continue;
            }
            out.selected += 1;
            if self.filter.is_staff(&full_name) {
                log::debug!("client: excluded staff entry '{full_name}'");
                skips.staff += 1;
                continue;
            }
            if !seen.insert(full_name.clone()) {
                skips.duplicate += 1;
                continue;
            }

            let record = self.build(&mut view, full_name, out.records.len() + 1, ctx);
            out.warnings.extend(view.into_warnings());
            out.records.push(record);
        }

        for w in &out.warnings {
            log::warn!("clients: {w}");
        }
        (out, skips)
    }

    fn build(
        &self,
        view: &mut SourceView<'_>,
        full_name: String,
        position: usize,
        ctx: &TransformContext,
    ) -> ClientRecord {
        let excel_id = view.text(f::EXCEL_ID);
        let id = view
            .opt_text(f::ID)
            .or_else(|| (!excel_id.is_empty()).then(|| excel_id.clone()))
            .unwrap_or_else(|| synthetic_id(DomainKind::Client, position));

        let company_name = view.opt_text(f::COMPANY_NAME);
        let client_type = if company_name.is_some() {
            ClientType::Company
        } else {
            ClientType::Individual
        };

        let source_file = view.opt_text(f::SOURCE_FILE).unwrap_or_else(|| ctx.source_file.clone());

        let mut additional_info = match view.get(f::ADDITIONAL_INFO) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => RawRecord::new(),
        };
        additional_info.insert("sourceFile".into(), Value::String(source_file));
        additional_info.insert("originalClientId".into(), Value::String(excel_id.clone()));
        additional_info.insert("extractedAt".into(), Value::String(ctx.now.clone()));

        ClientRecord {
            id,
            excel_id,
            name: full_name.clone(),
            full_name,
            email:                 view.text(f::EMAIL),
            phone:                 view.text(f::PHONE),
            address:               view.text(f::ADDRESS),
            pesel:                 view.opt_text(f::PESEL),
            company_name,
            client_type,
            notes:                 String::new(),
            voting_status:         DEFAULT_VOTING_STATUS.to_string(),
            color_code:            DEFAULT_COLOR_CODE.to_string(),
            unviable_investments:  Vec::new(),
            first_investment_date: view.strict_date(f::SIGNED_DATE),
            created_at:            ctx.now.clone(),
            updated_at:            ctx.now.clone(),
            is_active:             true,
            additional_info,
        }
    }
}

impl RecordTransformer for ClientExtractor {
    type Output = ClientRecord;

    fn kind(&self) -> DomainKind {
        DomainKind::Client
    }

    /// Client extraction never filters by product type; the flag is ignored.
    fn transform(
        &self,
        records: &[RawRecord],
        _filter_by_kind: bool,
        ctx: &TransformContext,
    ) -> Extraction<ClientRecord> {
        self.transform_with_skips(records, ctx).0
    }
}
