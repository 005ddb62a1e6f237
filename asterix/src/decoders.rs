//! The five `Format` decoders (spec §4.3): each walks a [`ByteCursor`]
//! against one schema shape and produces a [`Value`] plus any
//! [`Warning`]s raised along the way.

use asterix_core::bits::{decode_ascii_string, decode_six_bit_ascii, extract_bits, sign_extend, ByteCursor};
use asterix_core::error::{SchemaMismatchError, TruncationError, Warning};
use asterix_core::fspec::read_presence_bits;
use asterix_core::schema::{BitsField, Encoding, FixedPart, Format};
use asterix_core::value::Value;

/// A format decode can fail either because the buffer ran out
/// ([`TruncationError`]) or because a `Compound` mask bit has no matching
/// secondary (`SchemaMismatchError`, spec §7).
///
/// `Truncated.partial` carries whatever was already decoded before the
/// cutoff, when the format has a meaningful partial shape to report (a
/// `Repetitive` truncated mid-element keeps its already-decoded elements);
/// it's `None` for formats with no partial structure worth keeping.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatDecodeError {
    Truncated { error: TruncationError, partial: Option<Value> },
    SchemaMismatch(SchemaMismatchError),
}

impl From<TruncationError> for FormatDecodeError {
    fn from(e: TruncationError) -> Self {
        FormatDecodeError::Truncated { error: e, partial: None }
    }
}

/// Decodes one `Bits` sub-field already read into `bytes` (the enclosing
/// `Fixed` part's bytes).
fn decode_field(bytes: &[u8], field: &BitsField) -> (Value, Vec<Warning>) {
    match field.encoding {
        Encoding::SixBitAscii => {
            let (text, unassigned) = decode_six_bit_ascii(bytes, field.from_bit, field.to_bit);
            let warnings = unassigned.into_iter().map(|code| Warning::SixBitAsciiUnassigned { code }).collect();
            (Value::Text(text), warnings)
        }
        Encoding::AsciiString => (Value::Text(decode_ascii_string(bytes, field.from_bit, field.to_bit)), Vec::new()),
        Encoding::Octal => {
            let raw = extract_bits(bytes, field.from_bit, field.to_bit);
            (Value::Text(format!("{raw:o}")), Vec::new())
        }
        Encoding::Hex => {
            let raw = extract_bits(bytes, field.from_bit, field.to_bit);
            (Value::Text(format!("{raw:X}")), Vec::new())
        }
        Encoding::Unsigned | Encoding::Signed => {
            let raw_bits = extract_bits(bytes, field.from_bit, field.to_bit);
            let raw = if field.encoding == Encoding::Signed {
                sign_extend(raw_bits, field.width())
            } else {
                raw_bits as i64
            };
            if !field.enum_values.is_empty() {
                let label = field.enum_values.get(&raw).cloned();
                let warnings = if label.is_none() { vec![Warning::EnumNoLabel { raw }] } else { Vec::new() };
                (Value::Enum { raw, label }, warnings)
            } else {
                let scaled = field.scale.map(|s| s.format_scaled(raw));
                (Value::Number { raw, scaled, unit: field.unit.clone() }, Vec::new())
            }
        }
    }
}

/// Decodes every non-FX `Bits` field in `fields` against `bytes`, honoring
/// presence guards, in declaration order.
fn decode_group_fields(bytes: &[u8], fields: &[BitsField]) -> (Vec<(String, Value)>, Vec<Warning>) {
    let mut out = Vec::new();
    let mut warnings = Vec::new();
    for field in fields {
        if field.is_fx {
            continue;
        }
        if let Some(presence) = &field.presence {
            if extract_bits(bytes, presence.from_bit, presence.to_bit) != presence.equals {
                continue;
            }
        }
        let (value, w) = decode_field(bytes, field);
        warnings.extend(w);
        out.push((field.name.clone(), value));
    }
    (out, warnings)
}

fn decode_fixed_part(cursor: &mut ByteCursor<'_>, part: &FixedPart) -> Result<(Value, Vec<Warning>), TruncationError> {
    let bytes = cursor.read_exact(part.length_bytes as usize)?;
    let (fields, warnings) = decode_group_fields(bytes, &part.bits);
    Ok((Value::Group(fields), warnings))
}

fn decode_variable(cursor: &mut ByteCursor<'_>, parts: &[FixedPart]) -> Result<(Value, Vec<Warning>), TruncationError> {
    let mut fields = Vec::new();
    let mut warnings = Vec::new();
    for part in parts {
        let bytes = cursor.read_exact(part.length_bytes as usize)?;
        let (part_fields, w) = decode_group_fields(bytes, &part.bits);
        warnings.extend(w);
        fields.extend(part_fields);

        let continues = match part.bits.iter().find(|b| b.is_fx) {
            Some(fx) => extract_bits(bytes, fx.from_bit, fx.to_bit) & 1 != 0,
            None => false,
        };
        if !continues {
            break;
        }
    }
    Ok((Value::Group(fields), warnings))
}

fn decode_repetitive(
    cursor: &mut ByteCursor<'_>,
    counter_bytes: u32,
    element: &FixedPart,
) -> Result<(Value, Vec<Warning>), FormatDecodeError> {
    let count = cursor.read_uint(counter_bytes as usize)? as usize;
    let mut values = Vec::with_capacity(count);
    let mut warnings = Vec::new();
    for _ in 0..count {
        match decode_fixed_part(cursor, element) {
            Ok((value, w)) => {
                warnings.extend(w);
                values.push(value);
            }
            Err(error) => {
                return Err(FormatDecodeError::Truncated { error, partial: Some(Value::Repetition(values)) });
            }
        }
    }
    Ok((Value::Repetition(values), warnings))
}

/// BDS registers are always a one-byte register number followed by a
/// 56-bit (7-byte) payload, the Mode S extended-squitter register size.
fn decode_bds(
    cursor: &mut ByteCursor<'_>,
    table: &std::collections::BTreeMap<u8, FixedPart>,
) -> Result<(Value, Vec<Warning>), TruncationError> {
    let register = cursor.read_u8()?;
    let payload = cursor.read_exact(7)?;
    match table.get(&register) {
        Some(part) => {
            let (fields, warnings) = decode_group_fields(payload, &part.bits);
            Ok((Value::Group(fields), warnings))
        }
        None => {
            let mut raw = [0u8; 7];
            raw.copy_from_slice(payload);
            Ok((Value::BdsUnknown { register, raw }, vec![Warning::BdsUnknownRegister { register }]))
        }
    }
}

fn decode_explicit(
    cursor: &mut ByteCursor<'_>,
    inner: Option<&Format>,
    cat: u16,
    frn: u32,
) -> Result<(Value, Vec<Warning>), TruncationError> {
    let declared_len = cursor.read_u8()? as usize;
    let payload_len = declared_len.saturating_sub(1);
    let raw = cursor.read_exact(payload_len)?.to_vec();

    let mut warnings = Vec::new();
    let inner_value = match inner {
        None => None,
        Some(format) => {
            let mut sub = ByteCursor::new(&raw);
            match decode_format(&mut sub, format, cat, frn) {
                Ok((value, w)) => {
                    warnings.extend(w);
                    Some(Box::new(value))
                }
                // A mismatch between the declared length and what the inner
                // format actually needs stays contained to this item: the
                // outer cursor already consumed exactly `declared_len` bytes.
                Err(_) => {
                    warnings.push(Warning::ExplicitInnerUndecoded { frn });
                    None
                }
            }
        }
    };
    Ok((Value::Explicit { raw, inner: inner_value }, warnings))
}

fn decode_compound(
    cursor: &mut ByteCursor<'_>,
    secondaries: &[(String, Format)],
    cat: u16,
    frn: u32,
) -> Result<(Value, Vec<Warning>), FormatDecodeError> {
    let positions = read_presence_bits(cursor)?;
    let mut out = Vec::new();
    let mut warnings = Vec::new();
    for pos in positions {
        let idx = (pos - 1) as usize;
        let (name, sub_format) = secondaries.get(idx).ok_or_else(|| {
            FormatDecodeError::SchemaMismatch(SchemaMismatchError {
                cat,
                frn,
                reason: format!("compound mask position {pos} exceeds {} secondaries", secondaries.len()),
            })
        })?;
        let (value, w) = decode_format(cursor, sub_format, cat, frn)?;
        warnings.extend(w);
        out.push((name.clone(), value));
    }
    Ok((Value::Compound(out), warnings))
}

/// Dispatches on `format`'s variant, threading `cat`/`frn` through for
/// `SchemaMismatchError` reporting from nested `Compound` secondaries.
pub fn decode_format(
    cursor: &mut ByteCursor<'_>,
    format: &Format,
    cat: u16,
    frn: u32,
) -> Result<(Value, Vec<Warning>), FormatDecodeError> {
    match format {
        Format::Fixed(part) => Ok(decode_fixed_part(cursor, part)?),
        Format::Variable { parts } => Ok(decode_variable(cursor, parts)?),
        Format::Repetitive { counter_bytes, element } => decode_repetitive(cursor, *counter_bytes, element),
        Format::Compound { secondaries } => decode_compound(cursor, secondaries, cat, frn),
        Format::Explicit { inner } => Ok(decode_explicit(cursor, inner.as_deref(), cat, frn)?),
        Format::Bds { table } => Ok(decode_bds(cursor, table)?),
    }
}
