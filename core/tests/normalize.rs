//! Whole-file normalization, backups and pipeline I/O, on real files in a
//! temp dir.

use investdata_core::{
    backup::{back_up, plain_backup_path, timestamped_backup_path, BackupPolicy},
    clock::FixedClock,
    error::PipelineError,
    field_map::FieldMapper,
    pipeline::{normalize_in_place, normalize_into, normalized_file_name, read_document, write_document, FileOutcome},
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn clock() -> FixedClock {
    FixedClock::parse("2024-03-01T09:30:00Z").expect("valid instant")
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).expect("serializable")).expect("write fixture");
}

fn files(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn raw_loans() -> Value {
    json!([
        {"Klient": "Anna Nowak", "Kapital Pozostaly": "1,000.00", "Typ_produktu": "Pożyczka"},
        {"Klient": "Jan Kowalski", "pozyczka_numer": "P/1", "Uwagi": "ąęśćż"},
    ])
}

#[test]
fn in_place_normalization_renames_keys_and_keeps_a_backup() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("loans.json");
    write_json(&path, &raw_loans());
    let original = fs::read_to_string(&path).expect("read fixture");

    let outcomes = normalize_in_place(
        dir.path(),
        &files(&["loans.json"]),
        &FieldMapper::standard(),
        BackupPolicy::Rename,
        &clock(),
    );

    assert_eq!(outcomes.len(), 1);
    let FileOutcome::Normalized { backup, stats, .. } = &outcomes[0] else {
        panic!("expected a normalized file, got {:?}", outcomes[0]);
    };
    assert_eq!(backup.as_deref(), Some(plain_backup_path(&path).as_path()));
    assert_eq!(stats.objects, 2);
    assert_eq!(
        fs::read_to_string(plain_backup_path(&path)).expect("backup exists"),
        original,
        "the backup holds the original bytes"
    );

    let normalized = read_document(&path).expect("normalized file decodes");
    assert_eq!(
        normalized,
        json!([
            {"clientName": "Anna Nowak", "remainingCapital": "1,000.00", "productType": "Pożyczka"},
            {"clientName": "Jan Kowalski", "loanNumber": "P/1", "Uwagi": "ąęśćż"},
        ])
    );
    let text = fs::read_to_string(&path).expect("read output");
    assert!(text.contains("ąęśćż"), "non-ASCII text is written as-is");
    assert!(text.contains("\n  {"), "output is indented by two spaces");
}

#[test]
fn normalizing_a_normalized_file_changes_nothing() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("loans.json");
    write_json(&path, &raw_loans());
    let mapper = FieldMapper::standard();

    normalize_in_place(dir.path(), &files(&["loans.json"]), &mapper, BackupPolicy::Timestamped, &clock());
    let first = fs::read(&path).expect("first pass output");

    let outcomes =
        normalize_in_place(dir.path(), &files(&["loans.json"]), &mapper, BackupPolicy::Timestamped, &clock());
    let second = fs::read(&path).expect("second pass output");

    assert!(outcomes[0].is_normalized());
    assert_eq!(first, second, "second pass is byte-for-byte identical");
    let FileOutcome::Normalized { stats, backup, .. } = &outcomes[0] else { unreachable!() };
    assert_eq!(stats.renamed_keys, 0);
    assert!(backup.as_ref().is_some_and(|b| b.exists()), "only a new backup appears");
}

// Current behavior pending product-owner review: a second in-place run with
// the plain `.backup` policy would overwrite the only copy of the original
// export. The run refuses instead and leaves the file untouched.
#[test]
fn rename_backup_refuses_to_replace_an_existing_backup() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("loans.json");
    write_json(&path, &raw_loans());
    let mapper = FieldMapper::standard();

    normalize_in_place(dir.path(), &files(&["loans.json"]), &mapper, BackupPolicy::Rename, &clock());
    let backup_before = fs::read(plain_backup_path(&path)).expect("first backup");
    let file_before = fs::read(&path).expect("normalized file");

    let outcomes = normalize_in_place(dir.path(), &files(&["loans.json"]), &mapper, BackupPolicy::Rename, &clock());

    assert!(
        matches!(&outcomes[0], FileOutcome::Failed { error: PipelineError::BackupExists { .. }, .. }),
        "expected BackupExists, got {:?}",
        outcomes[0]
    );
    assert_eq!(fs::read(plain_backup_path(&path)).expect("backup"), backup_before);
    assert_eq!(fs::read(&path).expect("file"), file_before);
}

#[test]
fn timestamped_backups_never_collide() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("clients.json");
    write_json(&path, &json!([]));
    let clock = clock();

    let first = back_up(&path, BackupPolicy::Timestamped, &clock)
        .expect("backup")
        .expect("file exists");
    let second = back_up(&path, BackupPolicy::Timestamped, &clock)
        .expect("backup")
        .expect("file exists");

    assert_eq!(first, dir.path().join("clients.json.backup_20240301_093000"));
    assert_eq!(second, dir.path().join("clients.json.backup_20240301_093000_2"));
    assert!(path.exists(), "a timestamped backup copies, it does not move");
    assert_eq!(timestamped_backup_path(&path, &clock), dir.path().join("clients.json.backup_20240301_093000_3"));
}

#[test]
fn backing_up_a_missing_file_is_a_no_op() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let result = back_up(&dir.path().join("absent.json"), BackupPolicy::Rename, &clock()).expect("no error");
    assert_eq!(result, None);
}

#[test]
fn a_failing_file_does_not_stop_the_batch() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("write fixture");
    write_json(&dir.path().join("shares.json"), &json!([{"Ilosc_Udzialow": 3}]));

    let outcomes = normalize_in_place(
        dir.path(),
        &files(&["missing.json", "broken.json", "shares.json"]),
        &FieldMapper::standard(),
        BackupPolicy::Rename,
        &clock(),
    );

    assert!(matches!(outcomes[0], FileOutcome::Skipped { .. }));
    assert!(matches!(&outcomes[1], FileOutcome::Failed { error: PipelineError::Decode { .. }, .. }));
    assert!(outcomes[2].is_normalized());
    assert!(!plain_backup_path(&dir.path().join("broken.json")).exists(), "no backup for a file that failed to decode");
    assert_eq!(
        read_document(&dir.path().join("shares.json")).expect("normalized"),
        json!([{"sharesCount": 3}])
    );
}

#[test]
fn normalize_copy_writes_normalized_siblings_and_leaves_inputs_alone() {
    init_logging();
    let input = tempfile::tempdir().expect("temp dir");
    let output = tempfile::tempdir().expect("temp dir");
    let out_dir = output.path().join("split_investment_data_normalized");
    write_json(&input.path().join("clients.json"), &json!([{"imie_nazwisko": "Anna Nowak", "telefon": "600"}]));
    let before = fs::read(input.path().join("clients.json")).expect("input");

    let outcomes = normalize_into(input.path(), &out_dir, &files(&["clients.json", "loans.json"]), &FieldMapper::standard());

    assert!(outcomes[0].is_normalized());
    assert_eq!(outcomes[0].path(), out_dir.join("clients_normalized.json").as_path());
    assert!(matches!(outcomes[1], FileOutcome::Skipped { .. }));
    assert_eq!(
        read_document(&out_dir.join("clients_normalized.json")).expect("output decodes"),
        json!([{"fullName": "Anna Nowak", "phone": "600"}])
    );
    assert_eq!(fs::read(input.path().join("clients.json")).expect("input"), before);
}

#[test]
fn normalized_file_names() {
    assert_eq!(normalized_file_name("clients.json"), "clients_normalized.json");
    assert_eq!(normalized_file_name("archive.v2.json"), "archive.v2_normalized.json");
    assert_eq!(normalized_file_name("README"), "README_normalized");
}

#[test]
fn read_errors_are_classified() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = read_document(&dir.path().join("nope.json"));
    assert!(matches!(missing, Err(PipelineError::NotFound { .. })));

    fs::write(dir.path().join("bad.json"), "[1, 2").expect("write fixture");
    let bad = read_document(&dir.path().join("bad.json"));
    assert!(matches!(bad, Err(PipelineError::Decode { .. })));
}

#[test]
fn writing_creates_parent_directories_and_leaves_no_temp_file() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("out.json");

    write_document(&path, &json!({"a": 1})).expect("write");

    assert_eq!(read_document(&path).expect("decodes"), json!({"a": 1}));
    assert!(!dir.path().join("nested").join("out.json.tmp").exists());
}

#[test]
fn a_failed_rename_removes_the_temp_file() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("out.json");
    fs::create_dir(&path).expect("a directory occupies the target name");

    let result = write_document(&path, &json!([1, 2]));

    assert!(matches!(result, Err(PipelineError::Write { .. })));
    assert!(path.is_dir(), "the occupying directory is untouched");
    assert!(!dir.path().join("out.json.tmp").exists(), "temp file is cleaned up");
}
