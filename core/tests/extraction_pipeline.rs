use investdata_core::{
    client_extractor::{ClientExtractor, ClientFilter},
    clock::FixedClock,
    pipeline::{extract_clients, extract_products, read_document},
    product_extractor::ProductExtractor,
    types::DomainKind,
};
use serde_json::{json, Value};
use std::fs;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn clock() -> FixedClock {
    FixedClock::parse("2024-03-01T09:30:00Z").expect("valid instant")
}

fn master_export() -> Value {
    json!([
        {"Klient": "Anna Nowak", "ID_Klient": 1, "Typ_produktu": "Obligacje", "Kapital Pozostaly": "10,000.00"},
        {"Klient": "Jan Kowalski", "ID_Klient": 2, "Typ_produktu": "Udziały", "Ilosc_Udzialow": "4"},
        {"Klient": "Anna Nowak", "ID_Klient": 1, "Typ_produktu": "Obligacje", "Kapital Pozostaly": "2,500.00"},
        {"Klient": "Biuro Kraków", "Typ_produktu": "Pożyczka"},
        42,
    ])
}

fn write_export(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("tableConvert.com_n0b2g7.json");
    fs::write(&path, serde_json::to_string(&master_export()).expect("serializable")).expect("write fixture");
    path
}

#[test]
fn products_are_extracted_into_the_output_file() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_export(dir.path());
    let output = dir.path().join("bonds_extracted.json");
    let extractor = ProductExtractor::new(DomainKind::Bond).expect("product kind");

    let report = extract_products(&extractor, &input, &output, &clock()).expect("extraction");

    assert_eq!(report.considered, 4, "the non-object element is skipped");
    assert_eq!(report.written, 2);
    let written = read_document(&output).expect("output decodes");
    let records = written.as_array().expect("array output");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], json!("bond_0001"));
    assert_eq!(records[1]["id"], json!("bond_0002"));
    assert_eq!(records[1]["remainingCapital"], json!(2500.0));
    assert_eq!(records[0]["sourceFile"], json!("tableConvert.com_n0b2g7.json"));
}

#[test]
fn no_match_writes_nothing_and_reports_available_types() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_export(dir.path());
    let output = dir.path().join("apartments_new.json");
    let extractor = ProductExtractor::new(DomainKind::Apartment).expect("product kind");

    let report = extract_products(&extractor, &input, &output, &clock()).expect("extraction");

    assert_eq!(report.written, 0);
    assert!(!output.exists(), "no output file when nothing matched");
    assert_eq!(
        report.available_types,
        vec![
            ("Obligacje".to_string(), 2),
            ("Pożyczka".to_string(), 1),
            ("Udziały".to_string(), 1),
        ]
    );
}

#[test]
fn clients_are_deduplicated_and_filtered_end_to_end() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_export(dir.path());
    let output = dir.path().join("clients_extracted.json");
    let extractor = ClientExtractor::new(ClientFilter::default());

    let report = extract_clients(&extractor, &input, &output, &clock()).expect("extraction");

    assert_eq!(report.written, 2);
    let skips = report.client_skips.expect("client report carries skips");
    assert_eq!(skips.duplicate, 1);
    assert_eq!(skips.staff, 1);

    let written = read_document(&output).expect("output decodes");
    let names: Vec<&str> = written
        .as_array()
        .expect("array output")
        .iter()
        .filter_map(|c| c["fullName"].as_str())
        .collect();
    assert_eq!(names, vec!["Anna Nowak", "Jan Kowalski"]);
}

#[test]
fn a_missing_export_is_an_error() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let extractor = ProductExtractor::new(DomainKind::Loan).expect("product kind");
    let result = extract_products(
        &extractor,
        &dir.path().join("missing.json"),
        &dir.path().join("loans_extracted.json"),
        &clock(),
    );
    assert!(result.is_err());
}
