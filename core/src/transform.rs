//! Transformer trait and the context every transformer receives.
//!
//! RULE: A transformer never reorders records and never reads the clock
//! on its own. It gets the run timestamp through TransformContext.

use crate::{
    clock::Clock,
    error::ParseWarning,
    types::DomainKind,
};
use serde::Serialize;

/// Per-run inputs shared by every record of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformContext {
    /// Stamp written into createdAt / uploadedAt / updatedAt.
    pub now:         String,
    /// File name recorded in each record's sourceFile.
    pub source_file: String,
}

impl TransformContext {
    pub fn new(clock: &dyn Clock, source_file: impl Into<String>) -> Self {
        Self {
            now:         clock.stamp(),
            source_file: source_file.into(),
        }
    }
}

/// The output of one transformer pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub records:    Vec<T>,
    pub warnings:   Vec<ParseWarning>,
    /// Input records looked at.
    pub considered: usize,
    /// Input records that matched the kind (before dedup / exclusion).
    pub selected:   usize,
}

impl<T> Extraction<T> {
    pub fn empty() -> Self {
        Self {
            records:    Vec::new(),
            warnings:   Vec::new(),
            considered: 0,
            selected:   0,
        }
    }
}

/// The contract every per-kind record builder fulfills.
pub trait RecordTransformer {
    type Output: Serialize;

    fn kind(&self) -> DomainKind;

    /// Build canonical records from a decoded input array.
    ///
    /// `filter_by_kind` is false when the input was a single object,
    /// which is transformed as-is without a discriminator check.
    fn transform(
        &self,
        records: &[crate::types::RawRecord],
        filter_by_kind: bool,
        ctx: &TransformContext,
    ) -> Extraction<Self::Output>;
}
