use investdata_core::{
    client_extractor::{ClientExtractor, ClientFilter, DEFAULT_COLOR_CODE, DEFAULT_VOTING_STATUS},
    clock::FixedClock,
    field_map::FieldMapper,
    record::ClientType,
    transform::{RecordTransformer, TransformContext},
    types::RawRecord,
};
use serde_json::{json, Value};

fn ctx() -> TransformContext {
    let clock = FixedClock::parse("2024-03-01T09:30:00Z").expect("valid instant");
    TransformContext::new(&clock, "tableConvert.com_n0b2g7.json")
}

fn raw(value: Value) -> RawRecord {
    value.as_object().cloned().expect("fixture must be an object")
}

fn names(extractor: &ClientExtractor, records: &[RawRecord]) -> Vec<String> {
    extractor
        .transform(records, true, &ctx())
        .records
        .into_iter()
        .map(|c| c.full_name)
        .collect()
}

#[test]
fn identical_names_yield_one_client_from_the_first_row() {
    let records = vec![
        raw(json!({"Klient": "Jan Kowalski", "ID_Klient": 7, "telefon": "600100200"})),
        raw(json!({"Klient": "Jan Kowalski", "ID_Klient": 8, "telefon": "999999999"})),
        raw(json!({"Klient": "Anna Nowak", "ID_Klient": 9})),
    ];

    let extractor = ClientExtractor::new(ClientFilter::default());
    let (out, skips) = extractor.transform_with_skips(&records, &ctx());

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].full_name, "Jan Kowalski");
    assert_eq!(out.records[0].excel_id, "7", "first encountered row wins");
    assert_eq!(out.records[0].phone, "600100200");
    assert_eq!(out.records[1].full_name, "Anna Nowak");
    assert_eq!(skips.duplicate, 1);
}

#[test]
fn staff_names_are_excluded() {
    let records = vec![
        raw(json!({"Klient": "Biuro Warszawa"})),
        raw(json!({"Klient": "Michał Ostrowski"})),
        raw(json!({"Klient": "MISA Opiekun"})),
        raw(json!({"Klient": "Anna Nowak"})),
    ];

    let extractor = ClientExtractor::new(ClientFilter::default());
    let (out, skips) = extractor.transform_with_skips(&records, &ctx());

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].full_name, "Anna Nowak");
    assert_eq!(skips.staff, 3);
}

// Current behavior pending product-owner review: the staff filter is a
// case-sensitive substring match, so it catches real clients whose name
// contains a fragment and misses staff entries written in lower case.
#[test]
fn staff_filter_is_a_case_sensitive_substring_match() {
    let records = vec![
        raw(json!({"Klient": "Jan MISAK"})),
        raw(json!({"Klient": "Zofia Biurowska"})),
        raw(json!({"Klient": "biuro regionalne"})),
        raw(json!({"Klient": "Piotr Kijowski"})),
    ];

    let extractor = ClientExtractor::new(ClientFilter::default());

    assert_eq!(names(&extractor, &records), vec!["biuro regionalne", "Piotr Kijowski"]);
}

#[test]
fn the_staff_filter_is_configuration() {
    let records = vec![raw(json!({"Klient": "Biuro Warszawa"})), raw(json!({"Klient": "Jan Test"}))];

    let open = ClientExtractor::new(ClientFilter::none());
    assert_eq!(names(&open, &records), vec!["Biuro Warszawa", "Jan Test"]);

    let custom = ClientExtractor::new(ClientFilter { staff_fragments: vec!["Test".into()] });
    assert_eq!(names(&custom, &records), vec!["Biuro Warszawa"]);
}

#[test]
fn blank_names_are_skipped() {
    let records = vec![
        raw(json!({"Klient": ""})),
        raw(json!({"Klient": "NULL"})),
        raw(json!({"Kwota_inwestycji": "100"})),
        raw(json!({"Klient": "Anna Nowak"})),
    ];

    let extractor = ClientExtractor::new(ClientFilter::default());
    let (out, skips) = extractor.transform_with_skips(&records, &ctx());

    assert_eq!(out.records.len(), 1);
    assert_eq!(skips.blank_name, 3);
    assert_eq!(out.considered, 4);
    assert_eq!(out.selected, 1);
}

#[test]
fn client_fields_and_defaults() {
    let records = vec![
        raw(json!({
            "Klient": "Budimex Invest",
            "ID_Klient": 1001,
            "nazwa_firmy": "Budimex Invest Sp. z o.o.",
            "email": " biuro@budimex.example ",
            "Data_podpisania": "2020-05-17 00:00:00",
        })),
        raw(json!({"Klient": "Ewa Zielińska", "Data_podpisania": "17/05/2020"})),
    ];

    let extractor = ClientExtractor::new(ClientFilter::none());
    let out = extractor.transform(&records, true, &ctx());
    let company = &out.records[0];
    let person = &out.records[1];

    assert_eq!(company.id, "1001", "the export's client id becomes the id");
    assert_eq!(company.name, company.full_name);
    assert_eq!(company.client_type, ClientType::Company);
    assert_eq!(company.company_name.as_deref(), Some("Budimex Invest Sp. z o.o."));
    assert_eq!(company.email, "biuro@budimex.example");
    assert_eq!(company.first_investment_date.as_deref(), Some("2020-05-17T00:00:00"));
    assert_eq!(company.voting_status, DEFAULT_VOTING_STATUS);
    assert_eq!(company.color_code, DEFAULT_COLOR_CODE);
    assert!(company.is_active);
    assert!(company.unviable_investments.is_empty());
    assert_eq!(company.created_at, "2024-03-01T09:30:00.000Z");
    assert_eq!(company.updated_at, company.created_at);

    assert_eq!(person.id, "client_0002", "no export id, so one is synthesized");
    assert_eq!(person.client_type, ClientType::Individual);
    assert_eq!(person.first_investment_date, None, "strict parser rejects the slash form");
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].field, "signedDate");
}

#[test]
fn additional_info_records_provenance() {
    let records = vec![raw(json!({"Klient": "Anna Nowak", "ID_Klient": 55}))];

    let out = ClientExtractor::new(ClientFilter::default()).transform(&records, true, &ctx());
    let info = &out.records[0].additional_info;

    assert_eq!(info.get("sourceFile"), Some(&json!("tableConvert.com_n0b2g7.json")));
    assert_eq!(info.get("originalClientId"), Some(&json!("55")));
    assert_eq!(info.get("extractedAt"), Some(&json!("2024-03-01T09:30:00.000Z")));
}

#[test]
fn serialized_client_uses_camel_case_and_type_key() {
    let records = vec![raw(json!({"Klient": "Anna Nowak"}))];
    let out = ClientExtractor::new(ClientFilter::default()).transform(&records, true, &ctx());
    let value = serde_json::to_value(&out.records[0]).expect("serializable");

    assert_eq!(value["type"], json!("individual"));
    assert_eq!(value["fullName"], json!("Anna Nowak"));
    assert_eq!(value["votingStatus"], json!("undecided"));
    assert_eq!(value["pesel"], Value::Null);
    assert!(value.get("isActive").is_some());
}

// Current behavior pending product-owner review: a client is a projection
// of many investment rows, so additionalInfo carries provenance only and
// the unmapped keys of the first row are not kept.
#[test]
fn unmapped_source_keys_are_not_carried_into_client_info() {
    let records = vec![raw(json!({
        "Klient": "Anna Nowak",
        "ID_Klient": 55,
        "Uwagi": "klient VIP",
        "Kapital Pozostaly": "1,000.00",
    }))];

    let out = ClientExtractor::new(ClientFilter::default()).transform(&records, true, &ctx());
    let info = &out.records[0].additional_info;

    let keys: Vec<&str> = info.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["sourceFile", "originalClientId", "extractedAt"]);
}

#[test]
fn normalized_export_keeps_the_source_client_id() {
    let export = raw(json!({"ID_Klient": "777", "Klient": "Jan Nowak"}));
    let normalized = FieldMapper::standard().apply(&export);
    assert!(normalized.contains_key("clientId"));

    let extractor = ClientExtractor::new(ClientFilter::default());
    let from_raw = extractor.transform(&[export], true, &ctx());
    let from_normalized = extractor.transform(&[normalized], true, &ctx());

    let (a, b) = (&from_raw.records[0], &from_normalized.records[0]);
    assert_eq!(b.id, "777");
    assert_eq!(b.excel_id, "777");
    assert_eq!(b.full_name, "Jan Nowak");
    assert_eq!((&a.id, &a.excel_id), (&b.id, &b.excel_id), "both shapes read the same");
}
