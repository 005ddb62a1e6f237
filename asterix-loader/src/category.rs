//! Compiles one `<Category>` XML document into a [`Category`] schema tree.
//!
//! The parser is event-driven (SAX-style): it pulls raw [`Event`]s off a
//! [`quick_xml::Reader`] and dispatches on element name itself, rather than
//! deserializing via `serde`. Its "explicit element stack" is the Rust call
//! stack — each nested element is a recursive `parse_*` call, entered on the
//! element's `Start`/`Empty` event and returning on its matching `End`.

use std::collections::BTreeMap;

use asterix_core::error::DefinitionError;
use asterix_core::schema::{
    BitsField, Category, DataItemDescription, Encoding, FixedPart, Format, Presence, Uap,
    UapCondition, UapItem,
};
use asterix_core::value::Rational;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::attrs::{collect_attrs, optional_bool, optional_i64, required, required_u32};

pub fn parse_category(path: &str, xml: &[u8]) -> Result<Category, DefinitionError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| DefinitionError::Malformed { path: path.to_string(), reason: e.to_string() })?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    loop {
        match next_event(path, &mut reader)? {
            Event::Start(e) if e.name().as_ref() == b"Category" => {
                let category = parse_category_body(path, &mut reader, &e)?;
                expect_eof(path, &mut reader)?;
                return Ok(category);
            }
            Event::Eof => {
                return Err(DefinitionError::Malformed {
                    path: path.to_string(),
                    reason: "no <Category> root element found".to_string(),
                })
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            other => {
                return Err(unexpected(path, &other));
            }
        }
    }
}

fn expect_eof(path: &str, reader: &mut Reader<&[u8]>) -> Result<(), DefinitionError> {
    loop {
        match next_event(path, reader)? {
            Event::Eof => return Ok(()),
            Event::Comment(_) | Event::PI(_) => continue,
            other => return Err(unexpected(path, &other)),
        }
    }
}

fn next_event<'a>(path: &str, reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, DefinitionError> {
    reader
        .read_event()
        .map_err(|e| DefinitionError::Malformed { path: path.to_string(), reason: e.to_string() })
}

fn unexpected(path: &str, event: &Event<'_>) -> DefinitionError {
    let element = match event {
        Event::Start(e) | Event::Empty(e) => String::from_utf8_lossy(e.name().as_ref()).to_string(),
        Event::End(e) => format!("/{}", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) => "#text".to_string(),
        other => format!("{other:?}"),
    };
    DefinitionError::UnknownElement { path: path.to_string(), element }
}

fn end_name(e: &quick_xml::events::BytesEnd<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Reads events until the matching `End` for `tag`, concatenating any text
/// content found. Used for the text-bearing leaf elements under `<Bits>`.
fn read_text_content(path: &str, reader: &mut Reader<&[u8]>, tag: &str) -> Result<String, DefinitionError> {
    let mut out = String::new();
    loop {
        match next_event(path, reader)? {
            Event::Text(t) => {
                out.push_str(
                    &t.unescape()
                        .map_err(|e| DefinitionError::Malformed { path: path.to_string(), reason: e.to_string() })?,
                );
            }
            Event::End(e) if end_name(&e) == tag => return Ok(out),
            Event::Eof => {
                return Err(DefinitionError::Malformed {
                    path: path.to_string(),
                    reason: format!("unterminated <{tag}>"),
                })
            }
            other => return Err(unexpected(path, &other)),
        }
    }
}

// ---------------------------------------------------------------------
// <Category>
// ---------------------------------------------------------------------

fn parse_category_body(
    path: &str,
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Category, DefinitionError> {
    let attrs = collect_attrs(path, start, "Category", &["id", "name"])?;
    let number: u8 = required(path, "Category", &attrs, "id")?
        .parse()
        .map_err(|_| DefinitionError::AttributeOutOfRange {
            path: path.to_string(),
            element: "Category".to_string(),
            attribute: "id".to_string(),
            value: attrs.get("id").cloned().unwrap_or_default(),
        })?;
    let name = required(path, "Category", &attrs, "name")?.to_string();

    let mut items: BTreeMap<String, DataItemDescription> = BTreeMap::new();
    let mut uaps = Vec::new();

    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"DataItem" => {
                let item = parse_data_item(path, reader, &e)?;
                items.insert(item.id.clone(), item);
            }
            Event::Start(e) if e.name().as_ref() == b"UAP" => {
                uaps.push(parse_uap(path, reader, &e)?);
            }
            Event::End(e) if end_name(&e) == "Category" => break,
            other => return Err(unexpected(path, &other)),
        }
    }

    for uap in &uaps {
        for uap_item in &uap.items {
            if let Some(id) = &uap_item.item_id {
                if !items.contains_key(id) {
                    return Err(DefinitionError::UndefinedItemReference { item_id: id.clone() });
                }
            }
        }
    }

    let default_count = uaps.iter().filter(|u| u.condition.is_none()).count();
    if default_count == 0 {
        return Err(DefinitionError::Malformed {
            path: path.to_string(),
            reason: format!("category {number} declares no default UAP"),
        });
    }
    if default_count > 1 {
        tracing::warn!(category = number, "multiple default UAPs declared; first loaded wins");
    }

    // Edition is carried by the index file, not the category document
    // itself; the loader's index reader fills it in after this returns.
    Ok(Category { number, edition: String::new(), name, is_default: false, items, uaps })
}

fn parse_data_item(
    path: &str,
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<DataItemDescription, DefinitionError> {
    let attrs = collect_attrs(path, start, "DataItem", &["id", "name", "definition"])?;
    let id = required(path, "DataItem", &attrs, "id")?.to_string();
    let name = required(path, "DataItem", &attrs, "name")?.to_string();
    let definition = attrs.get("definition").cloned().unwrap_or_default();

    let mut format = None;
    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"DataItemFormat" => {
                format = Some(parse_data_item_format(path, reader, &id)?);
            }
            Event::End(e) if end_name(&e) == "DataItem" => break,
            other => return Err(unexpected(path, &other)),
        }
    }

    let format = format.ok_or_else(|| DefinitionError::Malformed {
        path: path.to_string(),
        reason: format!("item {id} has no <DataItemFormat>"),
    })?;

    Ok(DataItemDescription { id, name, definition, format })
}

fn parse_data_item_format(
    path: &str,
    reader: &mut Reader<&[u8]>,
    item_id: &str,
) -> Result<Format, DefinitionError> {
    let format = match next_event(path, reader)? {
        Event::Start(e) => parse_format_variant(path, reader, item_id, &e)?,
        other => return Err(unexpected(path, &other)),
    };
    match next_event(path, reader)? {
        Event::End(e) if end_name(&e) == "DataItemFormat" => Ok(format),
        other => Err(unexpected(path, &other)),
    }
}

/// Dispatches on the one child element a `<DataItemFormat>`, `<Secondary>`,
/// or `<Explicit>` wraps.
fn parse_format_variant(
    path: &str,
    reader: &mut Reader<&[u8]>,
    item_id: &str,
    start: &BytesStart<'_>,
) -> Result<Format, DefinitionError> {
    match start.name().as_ref() {
        b"Fixed" => Ok(Format::Fixed(parse_fixed_part(path, reader, start, "Fixed", item_id)?)),
        b"Variable" => Ok(Format::Variable { parts: parse_variable(path, reader, item_id)? }),
        b"Repetitive" => {
            let (counter_bytes, element) = parse_repetitive(path, reader, start, item_id)?;
            Ok(Format::Repetitive { counter_bytes, element })
        }
        b"Compound" => Ok(Format::Compound { secondaries: parse_compound(path, reader, item_id)? }),
        b"Explicit" => Ok(Format::Explicit { inner: parse_explicit(path, reader, item_id)? }),
        b"BDS" => Ok(Format::Bds { table: parse_bds(path, reader, item_id)? }),
        _ => Err(unexpected(path, &Event::Start(start.to_owned()))),
    }
}

fn parse_fixed_part(
    path: &str,
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    tag: &str,
    item_id: &str,
) -> Result<FixedPart, DefinitionError> {
    let attrs = collect_attrs(path, start, tag, &["length"])?;
    let length_bytes = required_u32(path, tag, &attrs, "length")?;
    if length_bytes == 0 {
        return Err(DefinitionError::AttributeOutOfRange {
            path: path.to_string(),
            element: tag.to_string(),
            attribute: "length".to_string(),
            value: "0".to_string(),
        });
    }

    let mut bits: Vec<BitsField> = Vec::new();
    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"Bits" => {
                let field = parse_bits(path, reader, &e, item_id, &bits, false)?;
                validate_bits_range(item_id, &field, length_bytes)?;
                bits.push(field);
            }
            Event::Empty(e) if e.name().as_ref() == b"Bits" => {
                let field = parse_bits(path, reader, &e, item_id, &bits, true)?;
                validate_bits_range(item_id, &field, length_bytes)?;
                bits.push(field);
            }
            Event::End(e) if end_name(&e) == tag => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    validate_no_overlap(item_id, &bits)?;
    Ok(FixedPart { length_bytes, bits })
}

fn validate_bits_range(item_id: &str, field: &BitsField, length_bytes: u32) -> Result<(), DefinitionError> {
    let max_bit = length_bytes * 8;
    if field.from_bit < 1 || field.to_bit < field.from_bit || field.to_bit > max_bit {
        return Err(DefinitionError::BitsRangeInvalid {
            item_id: item_id.to_string(),
            from_bit: field.from_bit,
            to_bit: field.to_bit,
        });
    }
    Ok(())
}

fn validate_no_overlap(item_id: &str, bits: &[BitsField]) -> Result<(), DefinitionError> {
    for (i, a) in bits.iter().enumerate() {
        for b in &bits[i + 1..] {
            if a.from_bit <= b.to_bit && b.from_bit <= a.to_bit {
                return Err(DefinitionError::BitsRangeInvalid {
                    item_id: item_id.to_string(),
                    from_bit: b.from_bit,
                    to_bit: b.to_bit,
                });
            }
        }
    }
    Ok(())
}

fn parse_variable(path: &str, reader: &mut Reader<&[u8]>, item_id: &str) -> Result<Vec<FixedPart>, DefinitionError> {
    let mut parts = Vec::new();
    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"Part" => {
                parts.push(parse_fixed_part(path, reader, &e, "Part", item_id)?);
            }
            Event::End(e) if end_name(&e) == "Variable" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    if parts.is_empty() {
        return Err(DefinitionError::Malformed {
            path: path.to_string(),
            reason: format!("item {item_id}: <Variable> has no <Part>s"),
        });
    }
    for part in &parts {
        match part.bits.iter().find(|b| b.is_fx) {
            Some(fx) if fx.to_bit == part.length_bytes * 8 => {}
            Some(_) => return Err(DefinitionError::MisplacedFx { item_id: item_id.to_string() }),
            None => return Err(DefinitionError::MisplacedFx { item_id: item_id.to_string() }),
        }
    }
    Ok(parts)
}

fn parse_repetitive(
    path: &str,
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    item_id: &str,
) -> Result<(u32, FixedPart), DefinitionError> {
    let attrs = collect_attrs(path, start, "Repetitive", &["counter-bytes"])?;
    let counter_bytes = required_u32(path, "Repetitive", &attrs, "counter-bytes")?;
    if counter_bytes == 0 {
        return Err(DefinitionError::AttributeOutOfRange {
            path: path.to_string(),
            element: "Repetitive".to_string(),
            attribute: "counter-bytes".to_string(),
            value: "0".to_string(),
        });
    }

    let mut element = None;
    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"Element" => {
                element = Some(parse_fixed_part(path, reader, &e, "Element", item_id)?);
            }
            Event::End(e) if end_name(&e) == "Repetitive" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    let element = element.ok_or_else(|| DefinitionError::Malformed {
        path: path.to_string(),
        reason: format!("item {item_id}: <Repetitive> has no <Element>"),
    })?;
    Ok((counter_bytes, element))
}

fn parse_compound(
    path: &str,
    reader: &mut Reader<&[u8]>,
    item_id: &str,
) -> Result<Vec<(String, Format)>, DefinitionError> {
    let mut secondaries = Vec::new();
    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"Secondary" => {
                let attrs = collect_attrs(path, &e, "Secondary", &["name"])?;
                let name = required(path, "Secondary", &attrs, "name")?.to_string();
                let format = match next_event(path, reader)? {
                    Event::Start(inner) => parse_format_variant(path, reader, item_id, &inner)?,
                    other => return Err(unexpected(path, &other)),
                };
                match next_event(path, reader)? {
                    Event::End(e) if end_name(&e) == "Secondary" => {}
                    other => return Err(unexpected(path, &other)),
                }
                secondaries.push((name, format));
            }
            Event::End(e) if end_name(&e) == "Compound" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    if secondaries.is_empty() {
        return Err(DefinitionError::Malformed {
            path: path.to_string(),
            reason: format!("item {item_id}: <Compound> has no <Secondary> entries"),
        });
    }
    Ok(secondaries)
}

fn parse_explicit(
    path: &str,
    reader: &mut Reader<&[u8]>,
    item_id: &str,
) -> Result<Option<Box<Format>>, DefinitionError> {
    let mut inner = None;
    loop {
        match next_event(path, reader)? {
            Event::Start(e) => {
                if inner.is_some() {
                    return Err(unexpected(path, &Event::Start(e)));
                }
                inner = Some(Box::new(parse_format_variant(path, reader, item_id, &e)?));
            }
            Event::End(e) if end_name(&e) == "Explicit" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    Ok(inner)
}

fn parse_bds(path: &str, reader: &mut Reader<&[u8]>, item_id: &str) -> Result<BTreeMap<u8, FixedPart>, DefinitionError> {
    let mut table = BTreeMap::new();
    loop {
        match next_event(path, reader)? {
            Event::Start(e) if e.name().as_ref() == b"Register" => {
                let attrs = collect_attrs(path, &e, "Register", &["code"])?;
                let raw = required(path, "Register", &attrs, "code")?;
                let code = parse_register_code(path, raw)?;
                let fixed = match next_event(path, reader)? {
                    Event::Start(f) if f.name().as_ref() == b"Fixed" => {
                        parse_fixed_part(path, reader, &f, "Fixed", item_id)?
                    }
                    other => return Err(unexpected(path, &other)),
                };
                match next_event(path, reader)? {
                    Event::End(e) if end_name(&e) == "Register" => {}
                    other => return Err(unexpected(path, &other)),
                }
                table.insert(code, fixed);
            }
            Event::End(e) if end_name(&e) == "BDS" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    Ok(table)
}

fn parse_register_code(path: &str, raw: &str) -> Result<u8, DefinitionError> {
    let parsed = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else {
        raw.parse::<u8>()
    };
    parsed.map_err(|_| DefinitionError::AttributeOutOfRange {
        path: path.to_string(),
        element: "Register".to_string(),
        attribute: "code".to_string(),
        value: raw.to_string(),
    })
}

// ---------------------------------------------------------------------
// <Bits>
// ---------------------------------------------------------------------

fn parse_bits(
    path: &str,
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    item_id: &str,
    siblings: &[BitsField],
    is_empty_tag: bool,
) -> Result<BitsField, DefinitionError> {
    let attrs = collect_attrs(
        path,
        start,
        "Bits",
        &["from", "to", "name", "encoding", "scale-num", "scale-den", "unit", "enum", "fx"],
    )?;
    let from_bit = required_u32(path, "Bits", &attrs, "from")?;
    let to_bit = required_u32(path, "Bits", &attrs, "to")?;
    let name = required(path, "Bits", &attrs, "name")?.to_string();
    let is_fx = optional_bool(&attrs, "fx", false);
    let mut unit = attrs.get("unit").cloned();

    let scale_num = optional_i64(path, "Bits", &attrs, "scale-num")?;
    let scale_den = optional_i64(path, "Bits", &attrs, "scale-den")?;
    let scale = match (scale_num, scale_den) {
        (Some(n), Some(d)) if d != 0 => Some(Rational::new(n, d)),
        (None, None) => None,
        _ => {
            return Err(DefinitionError::AttributeOutOfRange {
                path: path.to_string(),
                element: "Bits".to_string(),
                attribute: "scale-num/scale-den".to_string(),
                value: format!("{scale_num:?}/{scale_den:?}"),
            })
        }
    };

    let mut short_name = None;
    let mut enum_values = BTreeMap::new();
    let mut presence = None;
    let mut encoding_attr = attrs.get("encoding").cloned();

    if !is_empty_tag {
        loop {
            match next_event(path, reader)? {
                Event::Empty(e) if e.name().as_ref() == b"BitsValue" => {
                    let vattrs = collect_attrs(path, &e, "BitsValue", &["value", "name"])?;
                    let raw: i64 = required(path, "BitsValue", &vattrs, "value")?.parse().map_err(|_| {
                        DefinitionError::AttributeOutOfRange {
                            path: path.to_string(),
                            element: "BitsValue".to_string(),
                            attribute: "value".to_string(),
                            value: vattrs.get("value").cloned().unwrap_or_default(),
                        }
                    })?;
                    let label = required(path, "BitsValue", &vattrs, "name")?.to_string();
                    enum_values.insert(raw, label);
                }
                Event::Start(e) if e.name().as_ref() == b"BitsValue" => {
                    let vattrs = collect_attrs(path, &e, "BitsValue", &["value", "name"])?;
                    let raw: i64 = required(path, "BitsValue", &vattrs, "value")?.parse().map_err(|_| {
                        DefinitionError::AttributeOutOfRange {
                            path: path.to_string(),
                            element: "BitsValue".to_string(),
                            attribute: "value".to_string(),
                            value: vattrs.get("value").cloned().unwrap_or_default(),
                        }
                    })?;
                    let label = required(path, "BitsValue", &vattrs, "name")?.to_string();
                    expect_matching_end(path, reader, "BitsValue")?;
                    enum_values.insert(raw, label);
                }
                Event::Start(e) if e.name().as_ref() == b"BitsShortName" => {
                    short_name = Some(read_text_content(path, reader, "BitsShortName")?);
                }
                Event::Empty(e) if e.name().as_ref() == b"BitsShortName" => {
                    short_name = Some(String::new());
                }
                Event::Start(e) if e.name().as_ref() == b"BitsUnit" => {
                    unit = Some(read_text_content(path, reader, "BitsUnit")?);
                }
                Event::Empty(e) if e.name().as_ref() == b"BitsUnit" => {}
                Event::Start(e) if e.name().as_ref() == b"BitsConst" => {
                    let _ = read_text_content(path, reader, "BitsConst")?;
                }
                Event::Empty(e) if e.name().as_ref() == b"BitsConst" => {}
                Event::Start(e) if e.name().as_ref() == b"BitsEncode" => {
                    let text = read_text_content(path, reader, "BitsEncode")?;
                    encoding_attr = Some(text);
                }
                Event::Empty(e) if e.name().as_ref() == b"BitsEncode" => {}
                Event::Empty(e) if e.name().as_ref() == b"BitsPresenceOfField" => {
                    let pattrs = collect_attrs(path, &e, "BitsPresenceOfField", &["field", "equals"])?;
                    let field_name = required(path, "BitsPresenceOfField", &pattrs, "field")?.to_string();
                    let equals_raw = required(path, "BitsPresenceOfField", &pattrs, "equals")?;
                    let equals: u64 = equals_raw.parse().map_err(|_| DefinitionError::AttributeOutOfRange {
                        path: path.to_string(),
                        element: "BitsPresenceOfField".to_string(),
                        attribute: "equals".to_string(),
                        value: equals_raw.to_string(),
                    })?;
                    let sibling = siblings.iter().find(|s| s.name == field_name).ok_or_else(|| {
                        DefinitionError::UndefinedPresenceField {
                            item_id: item_id.to_string(),
                            field: field_name.clone(),
                        }
                    })?;
                    presence = Some(Presence { from_bit: sibling.from_bit, to_bit: sibling.to_bit, equals });
                }
                Event::End(e) if end_name(&e) == "Bits" => break,
                other => return Err(unexpected(path, &other)),
            }
        }
    }

    let encoding = match encoding_attr.as_deref() {
        None => Encoding::Unsigned,
        Some("unsigned") => Encoding::Unsigned,
        Some("signed") => Encoding::Signed,
        Some("six-bit-ascii") => Encoding::SixBitAscii,
        Some("octal") => Encoding::Octal,
        Some("hex") => Encoding::Hex,
        Some("ascii-string") => Encoding::AsciiString,
        Some(other) => {
            return Err(DefinitionError::AttributeOutOfRange {
                path: path.to_string(),
                element: "Bits".to_string(),
                attribute: "encoding".to_string(),
                value: other.to_string(),
            })
        }
    };

    Ok(BitsField { name, short_name, from_bit, to_bit, encoding, scale, unit, enum_values, presence, is_fx })
}

// ---------------------------------------------------------------------
// <UAP>
// ---------------------------------------------------------------------

fn parse_uap(path: &str, reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Uap, DefinitionError> {
    let attrs = collect_attrs(
        path,
        start,
        "UAP",
        &["name", "cond-item", "cond-from", "cond-to", "cond-equals"],
    )?;
    let name = required(path, "UAP", &attrs, "name")?.to_string();
    let condition = match attrs.get("cond-item") {
        None => None,
        Some(item_id) => {
            let from_bit = required_u32(path, "UAP", &attrs, "cond-from")?;
            let to_bit = required_u32(path, "UAP", &attrs, "cond-to")?;
            let equals_raw = required(path, "UAP", &attrs, "cond-equals")?;
            let equals: u64 = equals_raw.parse().map_err(|_| DefinitionError::AttributeOutOfRange {
                path: path.to_string(),
                element: "UAP".to_string(),
                attribute: "cond-equals".to_string(),
                value: equals_raw.to_string(),
            })?;
            Some(UapCondition { item_id: item_id.clone(), from_bit, to_bit, equals })
        }
    };

    let mut items = Vec::new();
    loop {
        match next_event(path, reader)? {
            Event::Empty(e) if e.name().as_ref() == b"UAPItem" => {
                let iattrs = collect_attrs(path, &e, "UAPItem", &["frn", "id", "bit", "length"])?;
                let frn = required_u32(path, "UAPItem", &iattrs, "frn")?;
                let item_id = uap_item_id(&iattrs);
                items.push(UapItem { frn, item_id });
            }
            Event::Start(e) if e.name().as_ref() == b"UAPItem" => {
                let iattrs = collect_attrs(path, &e, "UAPItem", &["frn", "id", "bit", "length"])?;
                let frn = required_u32(path, "UAPItem", &iattrs, "frn")?;
                let item_id = uap_item_id(&iattrs);
                items.push(UapItem { frn, item_id });
                expect_matching_end(path, reader, "UAPItem")?;
            }
            Event::End(e) if end_name(&e) == "UAP" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    Ok(Uap { name, condition, items })
}

/// `id="FX"` and an absent `id` attribute both mark the FX sentinel slot
/// (spec §4.1 example uses the literal form; a hand-authored fixture may
/// just omit the attribute).
fn uap_item_id(attrs: &BTreeMap<String, String>) -> Option<String> {
    match attrs.get("id").map(String::as_str) {
        None | Some("FX") => None,
        Some(id) => Some(id.to_string()),
    }
}

fn expect_matching_end(path: &str, reader: &mut Reader<&[u8]>, tag: &str) -> Result<(), DefinitionError> {
    match next_event(path, reader)? {
        Event::End(e) if end_name(&e) == tag => Ok(()),
        other => Err(unexpected(path, &other)),
    }
}
