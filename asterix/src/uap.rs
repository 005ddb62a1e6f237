//! UAP selection (spec §4.2 step 1): a category with more than one UAP
//! alternative picks among them by trial-decoding the default UAP's items
//! and checking each conditioned UAP's guard against that trial result.

use asterix_core::bits::{extract_bits, ByteCursor};
use asterix_core::schema::{Category, Uap};

use crate::walk::decode_items_for_uap;

/// Picks the active UAP for a record at `cursor`, without consuming any of
/// it: the trial decode runs against a copy of the cursor (`ByteCursor` is
/// `Copy`), so callers always resume reading from the position they passed
/// in, regardless of which UAP is chosen.
pub fn select_uap<'c>(cursor: &ByteCursor<'_>, cat: u8, category: &'c Category) -> &'c Uap {
    let default = category.default_uap();
    let conditioned: Vec<&Uap> = category.uaps.iter().filter(|u| u.condition.is_some()).collect();
    if conditioned.is_empty() {
        return default;
    }

    let mut trial = *cursor;
    let (trial_items, _issue) = decode_items_for_uap(&mut trial, cat, category, default);

    for uap in conditioned {
        let cond = uap.condition.as_ref().expect("filtered to Some above");
        if let Some(item) = trial_items.iter().find(|i| i.id == cond.item_id) {
            if extract_bits(&item.raw, cond.from_bit, cond.to_bit) == cond.equals {
                return uap;
            }
        }
    }
    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use asterix_core::schema::{
        BitsField, DataItemDescription, Encoding, FixedPart, Format, UapCondition, UapItem,
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

    fn category_with_two_uaps() -> Category {
        let mut items = BTreeMap::new();
        items.insert(
            "000".to_string(),
            DataItemDescription {
                id: "000".to_string(),
                name: "Message Type".to_string(),
                definition: String::new(),
                format: Format::Fixed(FixedPart { length_bytes: 1, bits: vec![number_field("TYPE", 1, 8)] }),
            },
        );
        items.insert(
            "010".to_string(),
            DataItemDescription {
                id: "010".to_string(),
                name: "Data Source Identifier".to_string(),
                definition: String::new(),
                format: Format::Fixed(FixedPart { length_bytes: 1, bits: vec![number_field("SAC", 1, 8)] }),
            },
        );

        let default_uap = Uap {
            name: "default".to_string(),
            condition: None,
            items: vec![
                UapItem { frn: 1, item_id: Some("000".to_string()) },
                UapItem { frn: 2, item_id: Some("010".to_string()) },
            ],
        };
        let special_uap = Uap {
            name: "special".to_string(),
            condition: Some(UapCondition { item_id: "000".to_string(), from_bit: 1, to_bit: 8, equals: 2 }),
            items: vec![UapItem { frn: 1, item_id: Some("000".to_string()) }],
        };

        Category {
            number: 62,
            edition: "1.18".to_string(),
            name: "Test".to_string(),
            is_default: true,
            items,
            uaps: vec![default_uap, special_uap],
        }
    }

    #[test]
    fn falls_back_to_default_when_condition_not_met() {
        let category = category_with_two_uaps();
        // FSPEC 0xC0: FRN1+FRN2 present; item 000 = 1, which doesn't match the special UAP's equals=2.
        let data = [0xC0u8, 0x01, 0x09];
        let cursor = ByteCursor::new(&data);
        let uap = select_uap(&cursor, 62, &category);
        assert_eq!(uap.name, "default");
        assert_eq!(cursor.position(), 0, "selection must not consume input");
    }

    #[test]
    fn selects_conditioned_uap_when_guard_matches() {
        let category = category_with_two_uaps();
        let data = [0xC0u8, 0x02, 0x09];
        let cursor = ByteCursor::new(&data);
        let uap = select_uap(&cursor, 62, &category);
        assert_eq!(uap.name, "special");
    }

    #[test]
    fn single_uap_category_skips_trial_decode() {
        let mut category = category_with_two_uaps();
        category.uaps.truncate(1);
        let data = [0xC0u8, 0x01, 0x09];
        let cursor = ByteCursor::new(&data);
        let uap = select_uap(&cursor, 62, &category);
        assert_eq!(uap.name, "default");
        assert_eq!(cursor.position(), 0);
    }
}
