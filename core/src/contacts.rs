//! Contact backfill: fill blank `email` / `phone` of canonical clients
//! from a secondary file keyed by `id`.
//!
//! RULE: A non-blank contact value is never overwritten, and a blank
//! source value never fills anything.

use crate::{
    backup::{self, BackupPolicy},
    clock::Clock,
    coerce,
    error::{PipelineError, PipelineResult},
    pipeline::{read_document, write_document},
    schema as f,
    types::RawRecord,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillStats {
    pub total_processed:  usize,
    pub email_updated:    usize,
    pub phone_updated:    usize,
    /// Records that got both fields; also counted in the two above.
    pub both_updated:     usize,
    pub no_match_found:   usize,
    pub already_complete: usize,
}

impl BackfillStats {
    pub fn changed(&self) -> bool {
        self.email_updated > 0 || self.phone_updated > 0
    }
}

fn id_of(record: &RawRecord) -> Option<String> {
    record.get(f::ID).and_then(|v| coerce::to_opt_text(Some(v)))
}

fn contact(record: &RawRecord, field: &str) -> String {
    coerce::to_text(record.get(field))
}

/// Index `records` by id. Records without an id are left out; on a
/// repeated id the last record wins.
pub fn index_by_id(records: &[RawRecord]) -> HashMap<String, &RawRecord> {
    records
        .iter()
        .filter_map(|r| id_of(r).map(|id| (id, r)))
        .collect()
}

/// Backfill `targets` in memory, stamping `updated_at` on every record
/// that changed.
pub fn backfill_records<'a, I>(
    targets: I,
    sources: &HashMap<String, &RawRecord>,
    updated_at: &str,
) -> BackfillStats
where
    I: IntoIterator<Item = &'a mut RawRecord>,
{
    let mut stats = BackfillStats::default();

    for client in targets {
        stats.total_processed += 1;
        let Some(source) = id_of(client).and_then(|id| sources.get(&id)) else {
            stats.no_match_found += 1;
            continue;
        };

        let source_email = contact(source, f::EMAIL);
        let source_phone = contact(source, f::PHONE);
        let email_missing = contact(client, f::EMAIL).is_empty() && !source_email.is_empty();
        let phone_missing = contact(client, f::PHONE).is_empty() && !source_phone.is_empty();

        if !email_missing && !phone_missing {
            stats.already_complete += 1;
            continue;
        }
        if email_missing {
            client.insert(f::EMAIL.into(), Value::String(source_email));
            stats.email_updated += 1;
        }
        if phone_missing {
            client.insert(f::PHONE.into(), Value::String(source_phone));
            stats.phone_updated += 1;
        }
        if email_missing && phone_missing {
            stats.both_updated += 1;
        }
        client.insert(f::UPDATED_AT.into(), Value::String(updated_at.to_string()));
    }
    stats
}

fn load_array(path: &Path) -> PipelineResult<Vec<Value>> {
    match read_document(path)? {
        Value::Array(items) => Ok(items),
        _ => Err(PipelineError::NotAnArray { path: path.to_path_buf() }),
    }
}

fn load_objects(path: &Path) -> PipelineResult<Vec<RawRecord>> {
    Ok(load_array(path)?
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(obj),
            _ => None,
        })
        .collect())
}

/// Backfill the client array at `target` from the one at `source`.
///
/// The target is backed up and rewritten only when a record changed.
/// Elements that are not objects are written back untouched.
pub fn backfill_contacts(
    target: &Path,
    source: &Path,
    clock: &dyn Clock,
    policy: BackupPolicy,
) -> PipelineResult<BackfillStats> {
    let mut document = load_array(target)?;
    let secondary = load_objects(source)?;
    log::info!(
        "contacts: {} elements in {}, {} clients in {}",
        document.len(),
        target.display(),
        secondary.len(),
        source.display()
    );

    let lookup = index_by_id(&secondary);
    let clients = document.iter_mut().filter_map(Value::as_object_mut);
    let stats = backfill_records(clients, &lookup, &clock.stamp());

    if !stats.changed() {
        log::info!("contacts: nothing to update");
        return Ok(stats);
    }

    backup::back_up(target, policy, clock)?;
    write_document(target, &document)?;
    log::info!(
        "contacts: {} emails, {} phones updated in {}",
        stats.email_updated,
        stats.phone_updated,
        target.display()
    );
    Ok(stats)
}
