//! Shared primitive types used across the entire pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An untyped JSON object exactly as decoded from an export file.
/// Key order is the order in the source document.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A stable identifier for a canonical record.
pub type EntityId = String;

/// The five record families found in the back-office exports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Client,
    Apartment,
    Loan,
    Share,
    Bond,
}

impl DomainKind {
    pub const PRODUCTS: [DomainKind; 4] = [
        DomainKind::Apartment,
        DomainKind::Bond,
        DomainKind::Loan,
        DomainKind::Share,
    ];

    /// Prefix of synthesized ids: `<prefix>_0001`.
    pub fn id_prefix(self) -> &'static str {
        match self {
            DomainKind::Client    => "client",
            DomainKind::Apartment => "apartment",
            DomainKind::Loan      => "loan",
            DomainKind::Share     => "share",
            DomainKind::Bond      => "bond",
        }
    }

    /// Value of the product-type discriminator in the master export.
    /// Clients are not a product and have no discriminator.
    pub fn product_label(self) -> Option<&'static str> {
        match self {
            DomainKind::Client    => None,
            DomainKind::Apartment => Some("Apartamenty"),
            DomainKind::Loan      => Some("Pożyczka"),
            DomainKind::Share     => Some("Udziały"),
            DomainKind::Bond      => Some("Obligacje"),
        }
    }

    /// Default extraction output file name.
    pub fn default_output(self) -> &'static str {
        match self {
            DomainKind::Client    => "clients_extracted.json",
            DomainKind::Apartment => "apartments_new.json",
            DomainKind::Loan      => "loans_extracted.json",
            DomainKind::Share     => "shares_extracted.json",
            DomainKind::Bond      => "bonds_extracted.json",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            DomainKind::Client    => "clients",
            DomainKind::Apartment => "apartments",
            DomainKind::Loan      => "loans",
            DomainKind::Share     => "shares",
            DomainKind::Bond      => "bonds",
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

impl FromStr for DomainKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" | "clients"       => Ok(DomainKind::Client),
            "apartment" | "apartments" => Ok(DomainKind::Apartment),
            "loan" | "loans"           => Ok(DomainKind::Loan),
            "share" | "shares"         => Ok(DomainKind::Share),
            "bond" | "bonds"           => Ok(DomainKind::Bond),
            other => Err(format!("unknown record kind '{other}'")),
        }
    }
}

/// Synthesized id for the `position`-th (1-based) record of a kind.
pub fn synthetic_id(kind: DomainKind, position: usize) -> EntityId {
    format!("{}_{position:04}", kind.id_prefix())
}
