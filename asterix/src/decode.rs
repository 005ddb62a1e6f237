//! Top-level decode entry point (spec §6): frames `DataBlock`s out of a
//! byte slice, decodes each against its loaded `Category`, and folds
//! recoverable issues into the parsed tree rather than failing the call.
//!
//! A DataBlock is `cat(1) | length(2, big-endian, inclusive of header) |
//! body`. Once a block's header and declared length are read, its bytes
//! are always a valid slice of the input — everything past that point
//! (unknown category, truncated record, schema mismatch) is recoverable at
//! the block boundary and never stops the walk from reaching later blocks.

use asterix_core::bits::ByteCursor;
use asterix_core::error::DecodeStatus;
use asterix_core::record::{AsterixData, BlockError, DataBlock, DataRecord};
use asterix_core::schema::Definition;

use crate::uap::select_uap;
use crate::walk::{decode_items_for_uap, RecordIssue};

const BLOCK_HEADER_LEN: usize = 3;

/// Observability events (spec §6). Default no-op bodies let callers
/// implement only the events they care about.
pub trait Observability {
    fn definition_loaded(&self, _cat: u8, _edition: &str) {}
    fn record_decoded(&self, _cat: u8, _items_n: usize) {}
    fn decode_warning(&self, _kind: &str, _position: usize) {}
    fn decode_error(&self, _kind: &str, _position: usize) {}
}

/// Recognized options for [`decode`] (spec §6).
pub struct DecodeOptions<'a> {
    /// Reject trailing bytes left in a DataBlock after a truncated record
    /// instead of silently absorbing them.
    pub strict: bool,
    /// Upper bound, in bytes, on how much of a block a single record's walk
    /// may consume; `None` means unlimited.
    pub max_record_size: Option<usize>,
    pub observability: Option<&'a dyn Observability>,
    /// Checked between records; returning `true` stops the walk early with
    /// [`DecodeStatus::Cancelled`] (spec §5 "cooperative at record boundaries").
    pub cancel: Option<&'a dyn Fn() -> bool>,
}

impl<'a> Default for DecodeOptions<'a> {
    fn default() -> Self {
        Self { strict: false, max_record_size: None, observability: None, cancel: None }
    }
}

/// Decodes every DataBlock in `bytes` against `definition`, returning the
/// parsed tree, how many bytes were consumed, and a status summarizing the
/// call (spec §6).
///
/// A block-local condition (unknown category, a record truncated or
/// schema-mismatched) is always recorded inline in the returned tree
/// ([`DataBlock::errors`], [`asterix_core::record::DataItem::partial`]) and
/// never stops later blocks from being attempted, since the block's
/// declared length already tells us where the next one begins. The
/// returned `status` reflects the call as a whole: `Cancelled` if the
/// caller's predicate fired, `Truncated` if any record anywhere was cut
/// short or the buffer ended mid-header, `Partial{item_id}` if nothing was
/// cut short but some item decoded in a degraded shape, otherwise `Ok` — a
/// schema mismatch alone does not downgrade an otherwise-complete decode
/// (see DESIGN.md).
pub fn decode(
    definition: &Definition,
    bytes: &[u8],
    options: &DecodeOptions<'_>,
) -> (AsterixData, usize, DecodeStatus) {
    let mut data = AsterixData::new();
    let mut pos = 0usize;
    let mut truncated_at: Option<usize> = None;
    let mut partial_item: Option<String> = None;
    let mut cancelled = false;

    while pos < bytes.len() {
        if let Some(cancel) = options.cancel {
            if cancel() {
                cancelled = true;
                break;
            }
        }

        if bytes.len() - pos < BLOCK_HEADER_LEN {
            truncated_at = Some(pos);
            break;
        }
        let cat = bytes[pos];
        let length = u16::from_be_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize;
        if length < BLOCK_HEADER_LEN || pos + length > bytes.len() {
            truncated_at = Some(pos);
            break;
        }

        let body_offset = pos + BLOCK_HEADER_LEN;
        let block_end = pos + length;
        let body = &bytes[body_offset..block_end];

        let (block_truncation, block_partial) =
            decode_block(definition, cat, length as u16, body, body_offset, options, &mut data);
        if let Some(position) = block_truncation {
            truncated_at = Some(position);
        }
        if partial_item.is_none() {
            partial_item = block_partial;
        }

        pos = block_end;
    }

    let status = if cancelled {
        DecodeStatus::Cancelled
    } else if let Some(position) = truncated_at {
        DecodeStatus::Truncated { position }
    } else if let Some(item_id) = partial_item {
        DecodeStatus::Partial { item_id }
    } else {
        DecodeStatus::Ok
    };

    (data, pos, status)
}

/// Decodes one DataBlock's records, pushing the resulting [`DataBlock`]
/// onto `data`. Returns the absolute position of a record anywhere in this
/// block that was cut short by truncation (for [`DecodeStatus::Truncated`]),
/// and the id of the first item anywhere in this block that decoded fully
/// but degraded (for [`DecodeStatus::Partial`]).
fn decode_block(
    definition: &Definition,
    cat: u8,
    length: u16,
    body: &[u8],
    body_offset: usize,
    options: &DecodeOptions<'_>,
    data: &mut AsterixData,
) -> (Option<usize>, Option<String>) {
    let category = match definition.category(cat) {
        Some(c) => c,
        None => {
            if let Some(obs) = options.observability {
                obs.decode_error("schema_mismatch", body_offset);
            }
            data.blocks.push(DataBlock {
                category: cat,
                length,
                records: Vec::new(),
                errors: vec![BlockError::SchemaMismatch {
                    cat: cat as u16,
                    frn: 0,
                    reason: format!("category {cat} has no loaded Definition entry"),
                }],
            });
            return (None, None);
        }
    };

    let mut cursor = ByteCursor::new(body);
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut truncated_at = None;
    let mut partial_item: Option<String> = None;

    while !cursor.is_empty() {
        let window = match options.max_record_size {
            Some(max) if max < cursor.remaining() => max,
            _ => cursor.remaining(),
        };
        // Decode against a bounded view so `max_record_size` behaves as a
        // hard cap: a record needing more than `window` bytes truncates
        // inside the window rather than reading past it.
        let windowed = cursor.peek(window).expect("window <= remaining by construction");
        let mut sub = ByteCursor::new(windowed);

        let uap = select_uap(&sub, cat, category);
        let record_start = cursor.position();
        let (items, issue) = decode_items_for_uap(&mut sub, cat, category, uap);
        cursor.read_exact(sub.position()).expect("sub-cursor never consumes more than its window");

        let has_items = !items.is_empty();
        if has_items || issue.is_none() {
            if let Some(obs) = options.observability {
                obs.record_decoded(cat, items.len());
            }
            records.push(DataRecord { category: cat, edition: category.edition.clone(), items });
        }

        match issue {
            None => {}
            Some(RecordIssue::Partial { item_id }) => {
                let absolute = body_offset + record_start;
                if let Some(obs) = options.observability {
                    obs.decode_warning("partial", absolute);
                }
                partial_item.get_or_insert(item_id);
            }
            Some(RecordIssue::Truncated { position }) => {
                let absolute = body_offset + record_start + position;
                if let Some(obs) = options.observability {
                    obs.decode_error("truncated", absolute);
                }
                truncated_at = Some(absolute);
                if options.strict {
                    errors.push(BlockError::TrailingBytes { position: absolute });
                }
                break;
            }
            Some(RecordIssue::SchemaMismatch(e)) => {
                let absolute = body_offset + record_start;
                if let Some(obs) = options.observability {
                    obs.decode_error("schema_mismatch", absolute);
                }
                errors.push(BlockError::SchemaMismatch { cat: e.cat, frn: e.frn, reason: e.reason });
                break;
            }
        }
    }

    data.blocks.push(DataBlock { category: cat, length, records, errors });
    (truncated_at, partial_item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asterix_core::schema::{
        BitsField, Category, DataItemDescription, Encoding, FixedPart, Format, Uap, UapItem,
    };
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

    fn definition_with_cat48() -> Definition {
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
        let category = Category {
            number: 48,
            edition: "1.31".to_string(),
            name: "Monoradar Data".to_string(),
            is_default: true,
            items,
            uaps: vec![Uap {
                name: "default".to_string(),
                condition: None,
                items: vec![UapItem { frn: 1, item_id: Some("010".to_string()) }],
            }],
        };
        let mut definition = Definition::new();
        definition.insert(category);
        definition
    }

    #[test]
    fn decodes_single_block_single_record() {
        let definition = definition_with_cat48();
        // cat=48, length=3(header)+1(fspec)+2(item)=6
        let bytes = [48u8, 0x00, 0x06, 0x80, 0x0A, 0x14];
        let (data, consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
        assert_eq!(consumed, 6);
        assert_eq!(status, DecodeStatus::Ok);
        assert_eq!(data.blocks.len(), 1);
        assert_eq!(data.blocks[0].records.len(), 1);
        assert_eq!(data.blocks[0].records[0].items[0].id, "010");
    }

    #[test]
    fn unknown_category_is_recoverable_and_does_not_affect_status() {
        let definition = definition_with_cat48();
        let block1 = [48u8, 0x00, 0x06, 0x80, 0x0A, 0x14];
        let block2 = [201u8, 0x00, 0x04, 0xFF, 0xFF];
        let mut bytes = block1.to_vec();
        bytes.extend_from_slice(&block2);
        let (data, consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
        assert_eq!(consumed, bytes.len());
        assert_eq!(status, DecodeStatus::Ok);
        assert_eq!(data.blocks.len(), 2);
        assert_eq!(data.blocks[1].records.len(), 0);
        assert_eq!(data.blocks[1].errors.len(), 1);
    }

    #[test]
    fn truncated_record_surfaces_as_overall_truncated_status() {
        let definition = definition_with_cat48();
        // FSPEC declares item 010 (2 bytes) but only 1 byte remains.
        let bytes = [48u8, 0x00, 0x05, 0x80, 0x0A];
        let (data, _consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
        assert!(matches!(status, DecodeStatus::Truncated { .. }));
        assert!(data.blocks[0].records[0].items[0].partial);
    }

    #[test]
    fn truncated_header_at_end_of_buffer_is_truncated_status() {
        let definition = definition_with_cat48();
        let bytes = [48u8, 0x00];
        let (data, consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
        assert_eq!(consumed, 0);
        assert!(data.blocks.is_empty());
        assert!(matches!(status, DecodeStatus::Truncated { position: 0 }));
    }

    fn definition_with_cat48_explicit_item() -> Definition {
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
        let category = Category {
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
                    UapItem { frn: 2, item_id: Some("050".to_string()) },
                ],
            }],
        };
        let mut definition = Definition::new();
        definition.insert(category);
        definition
    }

    #[test]
    fn explicit_item_undecodable_against_declared_payload_sets_overall_partial_status() {
        let definition = definition_with_cat48_explicit_item();
        // FSPEC 0xC0: FRN1 (010, 2 bytes) and FRN2 (050, Explicit) present.
        // 050 declares a 3-byte block (len byte + 2-byte payload), too short
        // for its 4-byte inner Fixed part.
        let bytes = [48u8, 0x00, 0x09, 0xC0, 0x0A, 0x14, 0x03, 0xAA, 0xBB];
        let (data, consumed, status) = decode(&definition, &bytes, &DecodeOptions::default());
        assert_eq!(consumed, bytes.len());
        assert_eq!(status, DecodeStatus::Partial { item_id: "050".to_string() });
        let record = &data.blocks[0].records[0];
        assert!(!record.items[0].partial);
        assert!(record.items[1].partial);
    }

    #[test]
    fn cancellation_predicate_stops_before_further_blocks() {
        let definition = definition_with_cat48();
        let block = [48u8, 0x00, 0x06, 0x80, 0x0A, 0x14];
        let mut bytes = block.to_vec();
        bytes.extend_from_slice(&block);
        let cancel = || true;
        let options = DecodeOptions { cancel: Some(&cancel), ..DecodeOptions::default() };
        let (data, _consumed, status) = decode(&definition, &bytes, &options);
        assert_eq!(status, DecodeStatus::Cancelled);
        assert!(data.blocks.is_empty());
    }
}
