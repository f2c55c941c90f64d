//! Source-key → canonical-key renaming.
//!
//! RULE: This table is the single mapping asset of the pipeline.
//! The extractors derive their alias lists from it (see schema.rs),
//! the normalizer applies it to whole files. A spelling variant
//! added here is picked up by both.
//!
//! Unmapped keys pass through verbatim. When two keys of one record
//! land on the same target, the last one in document order wins and
//! the key keeps the position of its first occurrence.

use crate::types::{DomainKind, RawRecord};
use serde_json::Value;
use std::collections::HashMap;

/// Shared by every record family.
const STANDARD_MAPPINGS: &[(&str, &str)] = &[
    // ── Common investment fields ──────────────────────
    ("Kapital Pozostaly", "remainingCapital"),
    ("Kapitał Pozostały", "remainingCapital"),
    ("Kwota_inwestycji", "investmentAmount"),
    ("Kwota inwestycji", "investmentAmount"),
    ("Kwota_wplat", "paymentAmount"),
    ("paidAmount", "paymentAmount"),
    ("Kapital zrealizowany", "realizedCapital"),
    ("Przekaz na inny produkt", "transferToOtherProduct"),
    ("Data_podpisania", "signedDate"),
    ("signingDate", "signedDate"),
    ("Data_wejscia_do_inwestycji", "investmentEntryDate"),
    ("Typ_produktu", "productType"),
    ("typ_produktu", "productType"),
    ("Produkt_nazwa", "productName"),
    ("Status_produktu", "productStatus"),
    ("Produkt_status_wejscie", "productStatusEntry"),
    ("ID_Klient", "clientId"),
    ("Klient", "clientName"),
    ("Opiekun z MISA", "advisor"),
    ("misaGuardian", "advisor"),
    ("Oddzial", "branch"),
    ("ID_Spolka", "companyId"),
    ("wierzyciel_spolka", "creditorCompany"),
    ("data_emisji", "issueDate"),
    ("data_wykupu", "redemptionDate"),
    ("ID_Sprzedaz", "saleId"),
    ("salesId", "saleId"),
    ("Kapitał do restrukturyzacji", "capitalForRestructuring"),
    ("kapital_do_restrukturyzacji", "capitalForRestructuring"),
    ("Kapitał zabezpieczony nieruchomością", "capitalSecuredByRealEstate"),
    ("kapital_zabezpieczony_nieruchomoscia", "capitalSecuredByRealEstate"),
    ("realEstateSecuredCapital", "capitalSecuredByRealEstate"),
    // ── Apartments ────────────────────────────────────
    ("numer_apartamentu", "apartmentNumber"),
    ("budynek", "building"),
    ("adres", "address"),
    ("powierzchnia", "area"),
    ("liczba_pokoi", "roomCount"),
    ("pietro", "floor"),
    ("cena_za_m2", "pricePerM2"),
    ("data_oddania", "deliveryDate"),
    ("deweloper", "developer"),
    ("nazwa_projektu", "projectName"),
    ("balkon", "balcony"),
    ("miejsce_parkingowe", "parkingSpace"),
    ("komorka_lokatorska", "storageRoom"),
    // ── Loans ─────────────────────────────────────────
    ("pozyczka_numer", "loanNumber"),
    ("pozyczka_typ", "loanType"),
    ("pozyczka_status", "loanStatus"),
    ("pozyczka_oprocentowanie", "loanInterestRate"),
    ("pozyczka_termin_splaty", "loanRepaymentTerm"),
    ("pozyczka_zabezpieczenie", "loanCollateral"),
    // ── Shares ────────────────────────────────────────
    ("Ilosc_Udzialow", "sharesCount"),
    ("ilosc_udzialow", "sharesCount"),
    ("shareCount", "sharesCount"),
    ("wartosc_nominalna", "nominalValue"),
    ("wartosc_rynkowa", "marketValue"),
    // ── Clients ───────────────────────────────────────
    ("imie_nazwisko", "fullName"),
    ("nazwa_firmy", "companyName"),
    ("telefon", "phone"),
    // ── Metadata ──────────────────────────────────────
    ("created_at", "createdAt"),
    ("uploaded_at", "uploadedAt"),
    ("source_file", "sourceFile"),
];

const LOAN_OVERLAY: &[(&str, &str)] = &[
    ("pozyczkobiorca", "borrower"),
    ("oprocentowanie", "interestRate"),
    ("data_udzielenia", "disbursementDate"),
    ("data_splaty", "repaymentDate"),
    ("odsetki_naliczone", "accruedInterest"),
    ("zabezpieczenie", "collateral"),
];

const BOND_OVERLAY: &[(&str, &str)] = &[
    ("oprocentowanie", "interestRate"),
];

const SHARE_OVERLAY: &[(&str, &str)] = &[];

const APARTMENT_OVERLAY: &[(&str, &str)] = &[];

// A client file names the person directly; "Klient" is the name, not a reference.
const CLIENT_OVERLAY: &[(&str, &str)] = &[
    ("Klient", "fullName"),
    ("clientName", "fullName"),
    ("ID_Klient", "excelId"),
    ("clientId", "excelId"),
];

/// Counts produced by a whole-document pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub objects:        usize,
    pub renamed_keys:   usize,
    pub passed_through: usize,
}

#[derive(Debug, Clone)]
pub struct FieldMapper {
    /// (source, target) in priority order; sources are unique.
    entries: Vec<(String, String)>,
    index:   HashMap<String, usize>,
}

impl FieldMapper {
    /// The shared table without any per-kind overlay.
    pub fn standard() -> Self {
        let mut mapper = Self {
            entries: Vec::with_capacity(STANDARD_MAPPINGS.len()),
            index:   HashMap::with_capacity(STANDARD_MAPPINGS.len()),
        };
        mapper.extend_static(STANDARD_MAPPINGS);
        mapper
    }

    /// The shared table plus the overlay for `kind`.
    pub fn for_kind(kind: DomainKind) -> Self {
        let mut mapper = Self::standard();
        let overlay = match kind {
            DomainKind::Client    => CLIENT_OVERLAY,
            DomainKind::Apartment => APARTMENT_OVERLAY,
            DomainKind::Loan      => LOAN_OVERLAY,
            DomainKind::Share     => SHARE_OVERLAY,
            DomainKind::Bond      => BOND_OVERLAY,
        };
        mapper.extend_static(overlay);
        mapper
    }

    /// Add or replace entries, e.g. from configuration.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (source, target) in overrides {
            self.insert(source, target);
        }
        self
    }

    pub fn insert(&mut self, source: &str, target: &str) {
        match self.index.get(source) {
            Some(&pos) => self.entries[pos].1 = target.to_string(),
            None => {
                self.index.insert(source.to_string(), self.entries.len());
                self.entries.push((source.to_string(), target.to_string()));
            }
        }
    }

    fn extend_static(&mut self, pairs: &[(&str, &str)]) {
        for (source, target) in pairs {
            self.insert(source, target);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical name for `key`, or `None` when the key is unmapped.
    pub fn target_of(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.entries[pos].1.as_str())
    }

    /// Every source key that maps onto `target`, in table order.
    pub fn sources_of<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, t)| t == target)
            .map(|(s, _)| s.as_str())
    }

    /// Rename the keys of one record.
    pub fn apply(&self, record: &RawRecord) -> RawRecord {
        self.apply_counted(record, &mut MappingStats::default())
    }

    fn apply_counted(&self, record: &RawRecord, stats: &mut MappingStats) -> RawRecord {
        let mut out = RawRecord::with_capacity(record.len());
        for (key, value) in record {
            match self.target_of(key) {
                Some(target) => {
                    if target != key {
                        log::debug!("mapping: '{key}' -> '{target}'");
                        stats.renamed_keys += 1;
                    }
                    out.insert(target.to_string(), value.clone());
                }
                None => {
                    stats.passed_through += 1;
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        stats.objects += 1;
        out
    }

    /// Rename keys throughout a decoded document.
    ///
    /// An array has each object element mapped; other elements are kept
    /// as they are. A single object is mapped directly. Any other
    /// document is returned unchanged.
    pub fn apply_document(&self, doc: &Value) -> (Value, MappingStats) {
        let mut stats = MappingStats::default();
        let mapped = match doc {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(obj) => Value::Object(self.apply_counted(obj, &mut stats)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            Value::Object(obj) => Value::Object(self.apply_counted(obj, &mut stats)),
            other => other.clone(),
        };
        (mapped, stats)
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::standard()
    }
}
