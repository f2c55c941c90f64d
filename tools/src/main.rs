//! investdata: batch runner for the investment export pipeline.
//!
//! Usage:
//!   investdata extract apartments --input export.json --output apartments_new.json
//!   investdata extract all
//!   investdata normalize --files clients.json,loans.json --timestamped-backup
//!   investdata normalize-copy --out split_investment_data_normalized
//!   investdata backfill-contacts --target clients_normalized.json --source clients_extracted_updated.json
//!   investdata validate
//!
//! Global flags: --config FILE, --dir DIR (work directory).

use anyhow::{bail, Context, Result};
use investdata_core::{
    backup::{plain_backup_path, BackupPolicy},
    client_extractor::ClientExtractor,
    clock::SystemClock,
    config::PipelineConfig,
    contacts::{backfill_contacts, BackfillStats},
    pipeline::{self, ExtractionReport, FileOutcome},
    product_extractor::ProductExtractor,
    types::DomainKind,
    validate::{self, FileType, ValidationReport},
};
use std::env;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: investdata <extract <kind|all>|normalize|normalize-copy|backfill-contacts|validate> [--config FILE] [--dir DIR]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        bail!("{USAGE}");
    };

    let mut config = match flag_value(&args, "--config") {
        Some(path) => PipelineConfig::load(Path::new(path))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = flag_value(&args, "--dir") {
        config.work_dir = PathBuf::from(dir);
    }
    log::debug!("config: {config:?}");

    println!("investdata: {command}");
    println!("  work_dir:  {}", config.work_dir.display());
    println!();

    match command {
        "extract" => run_extract(&args, &config),
        "normalize" => run_normalize(&args, &config),
        "normalize-copy" => run_normalize_copy(&args, &config),
        "backfill-contacts" => run_backfill(&args, &config),
        "validate" => run_validate(&config),
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn run_extract(args: &[String], config: &PipelineConfig) -> Result<()> {
    let Some(target) = args.get(2).filter(|a| !a.starts_with("--")) else {
        bail!("extract needs a kind: apartments, bonds, loans, shares, clients or all");
    };
    let kinds: Vec<DomainKind> = if target == "all" {
        let mut all = DomainKind::PRODUCTS.to_vec();
        all.push(DomainKind::Client);
        all
    } else {
        vec![target.parse().map_err(anyhow::Error::msg)?]
    };
    if kinds.len() > 1 && flag_value(args, "--output").is_some() {
        bail!("--output needs a single kind");
    }

    let input = flag_value(args, "--input")
        .map(|p| config.resolve(Path::new(p)))
        .unwrap_or_else(|| config.master_export_path());
    let clock = SystemClock;

    for kind in kinds {
        let output = flag_value(args, "--output")
            .map(|p| config.resolve(Path::new(p)))
            .unwrap_or_else(|| config.output_path(kind));

        let result = match ProductExtractor::with_mapper(kind, config.mapper_for(kind)) {
            Some(extractor) => pipeline::extract_products(&extractor, &input, &output, &clock),
            None => {
                let extractor =
                    ClientExtractor::with_mapper(config.client_filter.clone(), config.mapper_for(kind));
                pipeline::extract_clients(&extractor, &input, &output, &clock)
            }
        };
        match result {
            Ok(report) => print_extraction(&report),
            Err(e) => println!("  {kind}: FAILED: {e}"),
        }
    }
    Ok(())
}

fn print_extraction(report: &ExtractionReport) {
    println!("=== EXTRACT {} ===", report.kind.plural().to_uppercase());
    println!("  input:      {}", report.input.display());
    println!("  considered: {}", report.considered);
    println!("  selected:   {}", report.selected);
    println!("  written:    {}", report.written);
    println!("  warnings:   {}", report.warnings);
    if let Some(skips) = &report.client_skips {
        println!("  staff:      {}", skips.staff);
        println!("  duplicates: {}", skips.duplicate);
        println!("  blank:      {}", skips.blank_name);
    }
    if report.written > 0 {
        println!("  output:     {}", report.output.display());
    } else if !report.available_types.is_empty() {
        println!("  (No matching records; product types present:)");
        for (label, count) in &report.available_types {
            println!("    {label}: {count}");
        }
    }
    println!();
}

fn run_normalize(args: &[String], config: &PipelineConfig) -> Result<()> {
    let files = file_list(args, config);
    let policy = if args.iter().any(|a| a == "--timestamped-backup") {
        BackupPolicy::Timestamped
    } else {
        config.backup_policy
    };
    let mapper = config.standard_mapper();
    let outcomes =
        pipeline::normalize_in_place(&config.split_dir_path(), &files, &mapper, policy, &SystemClock);
    print_outcomes("NORMALIZE", &outcomes);
    Ok(())
}

fn run_normalize_copy(args: &[String], config: &PipelineConfig) -> Result<()> {
    let files = file_list(args, config);
    let out_dir = flag_value(args, "--out")
        .map(|p| config.resolve(Path::new(p)))
        .unwrap_or_else(|| config.normalized_dir_path());
    let mapper = config.standard_mapper();
    let outcomes = pipeline::normalize_into(&config.split_dir_path(), &out_dir, &files, &mapper);
    print_outcomes("NORMALIZE-COPY", &outcomes);
    Ok(())
}

fn print_outcomes(title: &str, outcomes: &[FileOutcome]) {
    println!("=== {title} ===");
    for outcome in outcomes {
        match outcome {
            FileOutcome::Normalized { path, backup, stats } => {
                println!(
                    "  {}: {} objects, {} keys renamed",
                    path.display(),
                    stats.objects,
                    stats.renamed_keys
                );
                if let Some(backup) = backup {
                    println!("    backup: {}", backup.display());
                }
            }
            FileOutcome::Skipped { path } => println!("  {}: missing, skipped", path.display()),
            FileOutcome::Failed { path, error } => println!("  {}: FAILED: {error}", path.display()),
        }
    }
    let done = outcomes.iter().filter(|o| o.is_normalized()).count();
    println!("  normalized {done} of {} files", outcomes.len());
}

fn run_backfill(args: &[String], config: &PipelineConfig) -> Result<()> {
    let target = flag_value(args, "--target")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.contacts.target.clone());
    let source = flag_value(args, "--source")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.contacts.source.clone());
    let target = config.resolve(&target);
    let source = config.resolve(&source);

    let stats = backfill_contacts(&target, &source, &SystemClock, BackupPolicy::Timestamped)
        .with_context(|| format!("backfill of {} failed", target.display()))?;
    print_backfill(&stats);
    Ok(())
}

fn print_backfill(stats: &BackfillStats) {
    println!("=== CONTACT BACKFILL ===");
    println!("  processed:        {}", stats.total_processed);
    println!("  emails filled:    {}", stats.email_updated);
    println!("  phones filled:    {}", stats.phone_updated);
    println!("  both filled:      {}", stats.both_updated);
    println!("  already complete: {}", stats.already_complete);
    println!("  no match:         {}", stats.no_match_found);
    if !stats.changed() {
        println!("  (Nothing to update)");
    }
}

fn run_validate(config: &PipelineConfig) -> Result<()> {
    let dir = config.split_dir_path();
    if !dir.exists() {
        bail!("directory {} does not exist", dir.display());
    }
    for file_type in FileType::ALL {
        let path = dir.join(file_type.file_name());
        if !path.exists() {
            println!("  {}: missing, skipped", path.display());
            continue;
        }
        let records = match load_records(&path) {
            Ok(records) => records,
            Err(e) => {
                println!("  {}: FAILED: {e}", path.display());
                continue;
            }
        };
        print_validation(&path, &validate::analyze(&records, file_type));

        let backup = plain_backup_path(&path);
        if backup.exists() {
            match load_records(&backup) {
                Ok(original) => {
                    let cmp = validate::compare(&original, &records);
                    println!("  compared with {}:", backup.display());
                    println!("    records: {} -> {}", cmp.original_records, cmp.normalized_records);
                    println!("    fields:  {} -> {}", cmp.original_fields, cmp.normalized_fields);
                    println!("    added:   {:?}", cmp.added_fields);
                    println!("    removed: {:?}", cmp.removed_fields);
                }
                Err(e) => println!("  {}: FAILED: {e}", backup.display()),
            }
        }
        println!();
    }
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<investdata_core::types::RawRecord>> {
    let doc = pipeline::read_document(path)?;
    if !doc.is_array() {
        bail!("{} does not hold an array of records", path.display());
    }
    Ok(pipeline::raw_records(doc).0)
}

fn print_validation(path: &Path, report: &ValidationReport) {
    println!("=== VALIDATE {} ({}) ===", path.display(), report.file_type);
    println!("  records:       {}", report.total_records);
    println!("  unique fields: {}", report.unique_fields());
    if report.missing_required.is_empty() {
        println!("  required:      all present");
    } else {
        println!("  missing:       {:?}", report.missing_required);
    }
    if !report.unexpected_fields.is_empty() {
        println!("  unexpected:    {:?}", report.unexpected_fields);
    }
    for (field, count) in report.most_common(10) {
        let pct = count as f64 * 100.0 / report.total_records.max(1) as f64;
        println!("    {field}: {count} ({pct:.1}%)");
    }
    if report.capital.total > 0 {
        println!(
            "  remainingCapital: {} zero, {} non-zero of {}",
            report.capital.zero, report.capital.positive, report.capital.total
        );
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `--files a.json,b.json`, or the configured split files.
fn file_list(args: &[String], config: &PipelineConfig) -> Vec<String> {
    match flag_value(args, "--files") {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => config.split_files.clone(),
    }
}
