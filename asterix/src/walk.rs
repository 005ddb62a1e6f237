//! The record walker (spec §4.2): reads a record's FSPEC, resolves each
//! present FRN against the active UAP, and decodes the corresponding item.

use asterix_core::bits::ByteCursor;
use asterix_core::error::{SchemaMismatchError, Warning};
use asterix_core::fspec::read_presence_bits;
use asterix_core::record::DataItem;
use asterix_core::schema::{Category, Uap};
use asterix_core::value::Value;

use crate::decoders::{decode_format, FormatDecodeError};

/// What stopped a record walk short of decoding every present FRN, or what
/// degraded it without stopping it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordIssue {
    Truncated { position: usize },
    SchemaMismatch(SchemaMismatchError),
    /// Every present FRN decoded, but at least one `Explicit` item's payload
    /// didn't decode against its inner format. Unlike `Truncated`, the walk
    /// continues past it — the outer cursor consumed exactly the bytes that
    /// item declared.
    Partial { item_id: String },
}

/// Reads the FSPEC at `cursor`, then decodes one [`DataItem`] per present
/// FRN against `uap`. Returns whatever items were decoded before any issue,
/// plus that issue if one occurred (spec §4.2 steps 2-5).
pub fn decode_items_for_uap(
    cursor: &mut ByteCursor<'_>,
    cat: u8,
    category: &Category,
    uap: &Uap,
) -> (Vec<DataItem>, Option<RecordIssue>) {
    let mut items = Vec::new();
    let mut partial_item: Option<String> = None;

    let positions = match read_presence_bits(cursor) {
        Ok(p) => p,
        Err(e) => return (items, Some(RecordIssue::Truncated { position: e.position })),
    };

    for pos in positions {
        let Some(uap_item) = uap.item_for_frn(pos) else {
            return (
                items,
                Some(RecordIssue::SchemaMismatch(SchemaMismatchError {
                    cat: cat as u16,
                    frn: pos,
                    reason: format!("no UAP item declared for FRN {pos}"),
                })),
            );
        };
        // `None` marks the FX sentinel row; `read_presence_bits` never
        // returns a position for an FX bit itself, but a hand-authored UAP
        // could still list one at a real FRN, so skip it defensively
        // rather than decode nothing meaningful (spec §4.2 step 4).
        let Some(item_id) = uap_item.item_id.clone() else {
            continue;
        };
        let Some(description) = category.item(&item_id) else {
            return (
                items,
                Some(RecordIssue::SchemaMismatch(SchemaMismatchError {
                    cat: cat as u16,
                    frn: pos,
                    reason: format!("UAP references undeclared item {item_id}"),
                })),
            );
        };

        let start = cursor.position();
        match decode_format(cursor, &description.format, cat as u16, pos) {
            Ok((value, warnings)) => {
                let raw = cursor.bytes_since(start).to_vec();
                let degraded = warnings.iter().any(|w| matches!(w, Warning::ExplicitInnerUndecoded { .. }));
                if degraded {
                    partial_item.get_or_insert_with(|| item_id.clone());
                }
                items.push(DataItem { id: item_id, raw, value, partial: degraded, warnings });
            }
            Err(FormatDecodeError::Truncated { error, partial }) => {
                let raw = cursor.bytes_since(start).to_vec();
                items.push(DataItem {
                    id: item_id,
                    raw,
                    value: partial.unwrap_or(Value::Bytes(Vec::new())),
                    partial: true,
                    warnings: Vec::new(),
                });
                return (items, Some(RecordIssue::Truncated { position: error.position }));
            }
            Err(FormatDecodeError::SchemaMismatch(e)) => {
                return (items, Some(RecordIssue::SchemaMismatch(e)));
            }
        }
    }

    match partial_item {
        Some(item_id) => (items, Some(RecordIssue::Partial { item_id })),
        None => (items, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asterix_core::schema::{BitsField, DataItemDescription, Encoding, FixedPart, Format, UapItem};
    use std::collections::BTreeMap;

    fn number_field(name: &str, from: u32, to: u32) -> BitsField {
        BitsField {
            name: name.to_string(),
            short_name: None,
            from_bit: from,
            to_bit: to,
            encoding: Encoding::Unsigned,
            scale: None,
            unit: None,
            enum_values: BTreeMap::new(),
            presence: None,
            is_fx: false,
        }
    }

    fn sample_category() -> Category {
        let mut items = BTreeMap::new();
        items.insert(
            "010".to_string(),
            DataItemDescription {
                id: "010".to_string(),
                name: "Data Source Identifier".to_string(),
                definition: String::new(),
                format: Format::Fixed(FixedPart {
                    length_bytes: 2,
                    bits: vec![number_field("SAC", 1, 8), number_field("SIC", 9, 16)],
                }),
            },
        );
        items.insert(
            "040".to_string(),
            DataItemDescription {
                id: "040".to_string(),
                name: "Measured Position".to_string(),
                definition: String::new(),
                format: Format::Fixed(FixedPart { length_bytes: 1, bits: vec![number_field("V", 1, 8)] }),
            },
        );
        Category {
            number: 48,
            edition: "1.31".to_string(),
            name: "Monoradar Data".to_string(),
            is_default: true,
            items,
            uaps: vec![Uap {
                name: "default".to_string(),
                condition: None,
                items: vec![
                    UapItem { frn: 1, item_id: Some("010".to_string()) },
                    UapItem { frn: 2, item_id: Some("040".to_string()) },
                ],
            }],
        }
    }

    #[test]
    fn decodes_items_in_fspec_order() {
        let category = sample_category();
        let uap = category.default_uap();
        // FSPEC 0xC0: FRN 1 and 2 present, FX clear.
        let data = [0xC0u8, 0x0A, 0x14, 0x07];
        let mut cursor = ByteCursor::new(&data);
        let (items, issue) = decode_items_for_uap(&mut cursor, 48, &category, uap);
        assert!(issue.is_none());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "010");
        assert_eq!(items[1].id, "040");
        assert_eq!(items[1].value, Value::Number { raw: 7, scaled: None, unit: None });
    }

    #[test]
    fn truncated_item_is_marked_partial_and_stops_the_walk() {
        let category = sample_category();
        let uap = category.default_uap();
        // FSPEC 0xC0 declares FRN1 (2 bytes) and FRN2 (1 byte) but only 1 byte follows.
        let data = [0xC0u8, 0x0A];
        let mut cursor = ByteCursor::new(&data);
        let (items, issue) = decode_items_for_uap(&mut cursor, 48, &category, uap);
        assert_eq!(items.len(), 1);
        assert!(items[0].partial);
        assert!(matches!(issue, Some(RecordIssue::Truncated { .. })));
    }

    #[test]
    fn frn_with_no_uap_item_is_schema_mismatch() {
        let category = sample_category();
        let uap = category.default_uap();
        // FSPEC 0x20: only FRN 3 present, which this UAP has no entry for.
        let data = [0x20u8];
        let mut cursor = ByteCursor::new(&data);
        let (items, issue) = decode_items_for_uap(&mut cursor, 48, &category, uap);
        assert!(items.is_empty());
        assert!(matches!(issue, Some(RecordIssue::SchemaMismatch(_))));
    }

    #[test]
    fn explicit_item_with_undecodable_inner_is_partial_but_does_not_stop_the_walk() {
        let mut category = sample_category();
        category.items.insert(
            "050".to_string(),
            DataItemDescription {
                id: "050".to_string(),
                name: "Mode S".to_string(),
                definition: String::new(),
                format: Format::Explicit {
                    inner: Some(Box::new(Format::Fixed(FixedPart {
                        length_bytes: 4,
                        bits: vec![number_field("V", 1, 32)],
                    }))),
                },
            },
        );
        category.uaps[0].items.push(UapItem { frn: 3, item_id: Some("050".to_string()) });
        let uap = category.uaps[0].clone();
        // FSPEC 0xE0: FRN 1, 2, 3 present, FX clear.
        // 010 (2 bytes), 040 (1 byte), then 050: declared_len=3 -> a 2-byte
        // payload, too short for its 4-byte inner Fixed part.
        let data = [0xE0u8, 0x0A, 0x14, 0x07, 0x03, 0xAA, 0xBB];
        let mut cursor = ByteCursor::new(&data);
        let (items, issue) = decode_items_for_uap(&mut cursor, 48, &category, &uap);
        assert_eq!(items.len(), 3);
        assert!(!items[0].partial);
        assert!(!items[1].partial);
        assert!(items[2].partial);
        assert_eq!(items[2].value, Value::Explicit { raw: vec![0xAA, 0xBB], inner: None });
        assert_eq!(issue, Some(RecordIssue::Partial { item_id: "050".to_string() }));
    }

    #[test]
    fn fx_sentinel_row_is_skipped_without_decoding() {
        let mut category = sample_category();
        category.uaps[0].items.push(UapItem { frn: 3, item_id: None });
        let uap = category.uaps[0].clone();
        // FSPEC with FRN 3 (the FX sentinel row) set, FX chain bit clear.
        let data = [0b0010_0000u8];
        let mut cursor = ByteCursor::new(&data);
        let (items, issue) = decode_items_for_uap(&mut cursor, 48, &category, &uap);
        assert!(items.is_empty());
        assert!(issue.is_none());
    }
}
