//! End-to-end scenarios against the `testdata/` fixtures: load a real
//! `<Index>` + `<Category>` definition, decode a hand-built byte buffer, and
//! check the resulting tree and rendered output.

use std::io;

use asterix::{decode, render, DecodeOptions, DecodeStatus, Filter, FilterEntry, OutputFormat};
use asterix_loader::{load_definition, FileReader};

/// Resolves `Entry`/index paths like `"categories/cat048.xml"` against the
/// workspace's `testdata/` tree via `test_utils::load_fixture_bytes`.
struct FixtureReader;

impl FileReader for FixtureReader {
    fn read(&mut self, path: &str) -> io::Result<Vec<u8>> {
        let (dir, file) = path.split_once('/').expect("fixture paths are \"dir/file.xml\"");
        Ok(test_utils::load_fixture_bytes(dir, file))
    }
}

fn load_test_definition() -> asterix_core::schema::Definition {
    load_definition(&mut FixtureReader, "index/index.xml").expect("test fixtures are well-formed")
}

// ===== S1: minimal CAT048 record, every FRN decodes cleanly =====

#[test]
fn s1_minimal_cat048_record_decodes_all_seven_items() {
    let definition = load_test_definition();
    // FSPEC 0xFE: FRN1-7 present, FX clear.
    let body: Vec<u8> = vec![
        0xFE, // FSPEC
        0x00, 0x01, // 010 SAC/SIC
        0x80, // 020 TYP
        0x01, 0x00, 0x00, 0x00, // 040 RHO/THETA
        0x0F, 0xFF, // 070 MODE3A
        0x00, 0x28, // 090 FL
        0x00, // 130 compound, empty mask
        0x00, 0x00, 0x0A, // 140 TOD
    ];
    let length = (body.len() + 3) as u16;
    let mut bytes = vec![48u8, (length >> 8) as u8, (length & 0xFF) as u8];
    bytes.extend_from_slice(&body);

    let (data, consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
    assert_eq!(consumed, bytes.len());
    assert_eq!(status, DecodeStatus::Ok);
    assert_eq!(data.blocks.len(), 1);
    let record = &data.blocks[0].records[0];
    let ids: Vec<&str> = record.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["010", "020", "040", "070", "090", "130", "140"]);
    assert!(record.items.iter().all(|i| !i.partial));
}

// ===== S2: a truncated Repetitive-shaped record surfaces as overall Truncated =====

#[test]
fn s2_truncated_repetitive_keeps_decoded_elements_and_marks_record_partial() {
    let definition = load_test_definition();
    // FSPEC 0x01 0x80: only FRN8 (161, Track/Plot List) present.
    // Its counter declares 5 elements but only 3 element bytes follow.
    let body: Vec<u8> = vec![0x01, 0x80, 0x05, 0x11, 0x22, 0x33];
    let length = (body.len() + 3) as u16;
    let mut bytes = vec![48u8, (length >> 8) as u8, (length & 0xFF) as u8];
    bytes.extend_from_slice(&body);

    let (data, _consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
    assert!(matches!(status, DecodeStatus::Truncated { .. }));
    let record = &data.blocks[0].records[0];
    let item_161 = record.items.last().unwrap();
    assert_eq!(item_161.id, "161");
    assert!(item_161.partial);
    match &item_161.value {
        asterix_core::value::Value::Repetition(items) => assert_eq!(items.len(), 3),
        other => panic!("expected a partial Repetition with the 3 decoded elements, got {other:?}"),
    }
}

// ===== S3: a conditioned UAP overrides the default once its guard matches =====

#[test]
fn s3_conditioned_uap_selected_when_message_type_matches() {
    let definition = load_test_definition();
    // FSPEC 0xC0: FRN1+FRN2 present, FX clear.
    // TYPE=2 selects the "plot" UAP, whose FRN2 is item 040 (Track Number) rather than 010.
    let body: Vec<u8> = vec![0xC0, 0x02, 0x00, 0x2A];
    let length = (body.len() + 3) as u16;
    let mut bytes = vec![62u8, (length >> 8) as u8, (length & 0xFF) as u8];
    bytes.extend_from_slice(&body);

    let (data, _consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
    assert_eq!(status, DecodeStatus::Ok);
    let record = &data.blocks[0].records[0];
    let ids: Vec<&str> = record.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["000", "040"]);
}

#[test]
fn s3_default_uap_used_when_message_type_does_not_match() {
    let definition = load_test_definition();
    // Same framing, but TYPE=1 doesn't satisfy the "plot" UAP's guard.
    let body: Vec<u8> = vec![0xC0, 0x01, 0x00, 0x09];
    let length = (body.len() + 3) as u16;
    let mut bytes = vec![62u8, (length >> 8) as u8, (length & 0xFF) as u8];
    bytes.extend_from_slice(&body);

    let (data, _consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
    assert_eq!(status, DecodeStatus::Ok);
    let record = &data.blocks[0].records[0];
    let ids: Vec<&str> = record.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["000", "010"]);
}

// ===== S4: a Compound item with an all-zero mask decodes to no secondaries =====

#[test]
fn s4_compound_item_with_all_zero_mask_has_no_secondaries() {
    let definition = load_test_definition();
    // FSPEC 0x84: FRN1 (010) and FRN6 (130) present, FX clear.
    let body: Vec<u8> = vec![0x84, 0x00, 0x01, 0x00];
    let length = (body.len() + 3) as u16;
    let mut bytes = vec![48u8, (length >> 8) as u8, (length & 0xFF) as u8];
    bytes.extend_from_slice(&body);

    let (data, _consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
    assert_eq!(status, DecodeStatus::Ok);
    let record = &data.blocks[0].records[0];
    let item_130 = record.items.iter().find(|i| i.id == "130").unwrap();
    match &item_130.value {
        asterix_core::value::Value::Compound(secondaries) => assert!(secondaries.is_empty()),
        other => panic!("expected an empty Compound, got {other:?}"),
    }
}

// ===== S5: rendering can be scoped to one named field of one item =====

#[test]
fn s5_filter_scopes_rendered_output_to_named_field() {
    let definition = load_test_definition();
    let body: Vec<u8> = vec![0xC0, 0x00, 0x00, 0x01]; // FRN1+FRN2 present: 000, 010 (SAC=0, SIC=1)
    let length = (body.len() + 3) as u16;
    let mut bytes = vec![62u8, (length >> 8) as u8, (length & 0xFF) as u8];
    bytes.extend_from_slice(&body);

    let (data, _consumed, _status) = decode(&definition, &bytes, &DecodeOptions::default());
    let filter = Filter::new(vec![FilterEntry { cat: 62, item_id: "010".to_string(), field_name: Some("SIC".to_string()) }]);
    let out = render(&data, OutputFormat::Line, Some(&filter));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("CAT/062/010/SIC"));
    assert!(!text.contains("SAC"));
    assert!(!text.contains("/000/"));
}

// ===== S6: an unknown category is recoverable and does not affect overall status =====

#[test]
fn s6_unknown_category_between_two_known_blocks_stays_recoverable() {
    let definition = load_test_definition();
    let known_body: Vec<u8> = vec![0x80, 0x00]; // FRN1 only: item 000
    let known_length = (known_body.len() + 3) as u16;
    let mut known_block = vec![62u8, (known_length >> 8) as u8, (known_length & 0xFF) as u8];
    known_block.extend_from_slice(&known_body);

    let unknown_block: Vec<u8> = vec![201, 0x00, 0x04, 0xFF, 0xFF];

    let mut bytes = known_block.clone();
    bytes.extend_from_slice(&unknown_block);
    bytes.extend_from_slice(&known_block);

    let (data, consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
    assert_eq!(consumed, bytes.len());
    assert_eq!(status, DecodeStatus::Ok);
    assert_eq!(data.blocks.len(), 3);
    assert!(data.blocks[0].errors.is_empty());
    assert_eq!(data.blocks[1].category, 201);
    assert_eq!(data.blocks[1].errors.len(), 1);
    assert!(data.blocks[2].errors.is_empty());
}
