//! The batch pipeline: file in, canonical JSON out.
//!
//! EXECUTION ORDER (per file):
//!   1. Read and decode the whole document.
//!   2. Split it into raw records (array) or a single record (object).
//!   3. Transform in memory.
//!   4. Back up any file at the output path.
//!   5. Write the result as pretty UTF-8 JSON.
//!
//! RULES:
//!   - A failing file never aborts the other files of a batch.
//!   - Output is written to a sibling temp file and renamed into place.

use crate::{
    backup::{self, BackupPolicy},
    client_extractor::{ClientExtractor, ClientSkips},
    clock::Clock,
    error::{PipelineError, PipelineResult},
    field_map::{FieldMapper, MappingStats},
    product_extractor::{product_type_histogram, ProductExtractor},
    transform::{RecordTransformer, TransformContext},
    types::{DomainKind, RawRecord},
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

// ── Reading ───────────────────────────────────────────────────────

pub fn read_document(path: &Path) -> PipelineResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PipelineError::NotFound { path: path.to_path_buf() }
        } else {
            PipelineError::Io { path: path.to_path_buf(), source }
        }
    })?;
    serde_json::from_str(&content).map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Records of a decoded document, and whether they should be filtered
/// by product type. A lone object is one record and is never filtered.
/// Non-object array elements are skipped.
pub fn raw_records(doc: Value) -> (Vec<RawRecord>, bool) {
    match doc {
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<RawRecord> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => Some(obj),
                    _ => None,
                })
                .collect();
            if records.len() < total {
                log::warn!("skipped {} non-object array elements", total - records.len());
            }
            (records, true)
        }
        Value::Object(obj) => (vec![obj], false),
        _ => {
            log::warn!("document is neither an object nor an array of objects");
            (Vec::new(), true)
        }
    }
}

// ── Writing ───────────────────────────────────────────────────────

/// Pretty-print `value` to `path` (2-space indent, non-ASCII kept).
/// No `.tmp` sibling survives a failed write.
pub fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> PipelineResult<()> {
    let write_err = |source| PipelineError::Write { path: path.to_path_buf(), source };

    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let written = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written.map_err(write_err)
}

// ── Extraction ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub kind:       DomainKind,
    pub input:      PathBuf,
    pub output:     PathBuf,
    pub considered: usize,
    pub selected:   usize,
    pub written:    usize,
    pub warnings:   usize,
    /// Product types present in the input; filled when nothing matched.
    pub available_types: Vec<(String, usize)>,
    pub client_skips:    Option<ClientSkips>,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extract one product kind from `input` into `output`.
///
/// When nothing matches, no output is written and the report lists the
/// product types that are present.
pub fn extract_products(
    extractor: &ProductExtractor,
    input: &Path,
    output: &Path,
    clock: &dyn Clock,
) -> PipelineResult<ExtractionReport> {
    let kind = extractor.kind();
    let (records, filter) = raw_records(read_document(input)?);
    log::info!("{kind}: loaded {} records from {}", records.len(), input.display());

    let ctx = TransformContext::new(clock, file_name_of(input));
    let extraction = extractor.transform(&records, filter, &ctx);

    let mut report = ExtractionReport {
        kind,
        input:           input.to_path_buf(),
        output:          output.to_path_buf(),
        considered:      extraction.considered,
        selected:        extraction.selected,
        written:         0,
        warnings:        extraction.warnings.len(),
        available_types: Vec::new(),
        client_skips:    None,
    };

    if extraction.records.is_empty() {
        report.available_types = product_type_histogram(&records, extractor.mapper());
        log::warn!("{kind}: no records with product type '{}'", extractor.label());
        for (label, count) in &report.available_types {
            log::warn!("{kind}:   '{label}': {count} records");
        }
        return Ok(report);
    }

    write_document(output, &extraction.records)?;
    report.written = extraction.records.len();
    log::info!("{kind}: wrote {} records to {}", report.written, output.display());
    Ok(report)
}

/// Extract unique clients from `input` into `output`.
pub fn extract_clients(
    extractor: &ClientExtractor,
    input: &Path,
    output: &Path,
    clock: &dyn Clock,
) -> PipelineResult<ExtractionReport> {
    let (records, _) = raw_records(read_document(input)?);
    log::info!("clients: loaded {} records from {}", records.len(), input.display());

    let ctx = TransformContext::new(clock, file_name_of(input));
    let (extraction, skips) = extractor.transform_with_skips(&records, &ctx);

    write_document(output, &extraction.records)?;
    log::info!(
        "clients: wrote {} unique clients to {} ({} staff, {} duplicates, {} blank)",
        extraction.records.len(),
        output.display(),
        skips.staff,
        skips.duplicate,
        skips.blank_name
    );

    Ok(ExtractionReport {
        kind:            DomainKind::Client,
        input:           input.to_path_buf(),
        output:          output.to_path_buf(),
        considered:      extraction.considered,
        selected:        extraction.selected,
        written:         extraction.records.len(),
        warnings:        extraction.warnings.len(),
        available_types: Vec::new(),
        client_skips:    Some(skips),
    })
}

// ── Normalization ─────────────────────────────────────────────────

#[derive(Debug)]
pub enum FileOutcome {
    Normalized {
        path:   PathBuf,
        backup: Option<PathBuf>,
        stats:  MappingStats,
    },
    /// The file was not there.
    Skipped { path: PathBuf },
    Failed { path: PathBuf, error: PipelineError },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Normalized { path, .. }
            | FileOutcome::Skipped { path }
            | FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, FileOutcome::Normalized { .. })
    }
}

/// Normalize one file in place, backing up the original first.
pub fn normalize_file(
    path: &Path,
    mapper: &FieldMapper,
    policy: BackupPolicy,
    clock: &dyn Clock,
) -> PipelineResult<(Option<PathBuf>, MappingStats)> {
    let doc = read_document(path)?;
    if !matches!(doc, Value::Array(_) | Value::Object(_)) {
        return Err(PipelineError::NotAnArray { path: path.to_path_buf() });
    }
    let (normalized, stats) = mapper.apply_document(&doc);
    let backup = backup::back_up(path, policy, clock)?;
    write_document(path, &normalized)?;
    Ok((backup, stats))
}

/// Normalize each of `files` under `dir` in place.
/// Missing files are skipped with a warning; failures stay per file.
pub fn normalize_in_place(
    dir: &Path,
    files: &[String],
    mapper: &FieldMapper,
    policy: BackupPolicy,
    clock: &dyn Clock,
) -> Vec<FileOutcome> {
    files
        .iter()
        .map(|name| {
            let path = dir.join(name);
            if !path.exists() {
                log::warn!("normalize: file does not exist: {}", path.display());
                return FileOutcome::Skipped { path };
            }
            log::info!("normalize: processing {}", path.display());
            match normalize_file(&path, mapper, policy, clock) {
                Ok((backup, stats)) => {
                    log::info!(
                        "normalize: {} objects, {} keys renamed",
                        stats.objects,
                        stats.renamed_keys
                    );
                    FileOutcome::Normalized { path, backup, stats }
                }
                Err(error) => {
                    log::error!("normalize: {error}");
                    FileOutcome::Failed { path, error }
                }
            }
        })
        .collect()
}

/// `clients.json` → `clients_normalized.json`.
pub fn normalized_file_name(name: &str) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}_normalized.{}", ext.to_string_lossy()),
        None => format!("{stem}_normalized"),
    }
}

/// Normalize each of `files` from `input_dir` into `output_dir` as
/// `<stem>_normalized.<ext>`, leaving the inputs untouched.
pub fn normalize_into(
    input_dir: &Path,
    output_dir: &Path,
    files: &[String],
    mapper: &FieldMapper,
) -> Vec<FileOutcome> {
    files
        .iter()
        .map(|name| {
            let input = input_dir.join(name);
            if !input.exists() {
                log::warn!("normalize: file does not exist: {}", input.display());
                return FileOutcome::Skipped { path: input };
            }
            let output = output_dir.join(normalized_file_name(name));
            let result = read_document(&input).and_then(|doc| {
                let (normalized, stats) = mapper.apply_document(&doc);
                write_document(&output, &normalized)?;
                Ok(stats)
            });
            match result {
                Ok(stats) => {
                    log::info!("normalize: wrote {} ({} objects)", output.display(), stats.objects);
                    FileOutcome::Normalized { path: output, backup: None, stats }
                }
                Err(error) => {
                    log::error!("normalize: {error}");
                    FileOutcome::Failed { path: input, error }
                }
            }
        })
        .collect()
}
