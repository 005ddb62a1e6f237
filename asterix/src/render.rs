//! The multi-format renderer (spec §4.4): turns a decoded [`AsterixData`]
//! tree into `text`, `line`, `json`, `jsonh`, or `xml` bytes, optionally
//! scoped by a [`Filter`].

use std::fmt::Write as _;

use asterix_core::record::AsterixData;
use asterix_core::value::Value;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Map, Value as Json};

/// One `(cat, item_id, field_name?)` triple a [`Filter`] allows through. A
/// missing `field_name` means every field of that item renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub cat: u8,
    pub item_id: String,
    pub field_name: Option<String>,
}

/// Scopes rendering to a set of `(cat, item_id, field_name?)` triples (spec
/// §4.4). An empty filter renders everything — to exclude every field,
/// don't call [`render`] at all.
#[derive(Debug, Clone, Default)]
pub struct Filter(Vec<FilterEntry>);

impl Filter {
    pub fn new(entries: Vec<FilterEntry>) -> Self {
        Self(entries)
    }

    fn allows(&self, cat: u8, item_id: &str, top_field: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        self.0.iter().any(|e| {
            e.cat == cat
                && e.item_id == item_id
                && e.field_name.as_deref().map(|f| f == top_field).unwrap_or(true)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Line,
    Json,
    Jsonh,
    Xml,
}

/// Renders `data` as `format`, keeping only fields `filter` allows (spec
/// §4.4). Fields dropped entirely by a filter's triple (rather than just
/// field-scoped within an allowed item) don't raise
/// [`asterix_core::error::Warning::FilterMiss`] here — that warning belongs
/// to a filter referencing a field that never appears in the tree at all,
/// which this pure rendering pass has no way to distinguish from "this
/// record simply didn't carry that field".
pub fn render(data: &AsterixData, format: OutputFormat, filter: Option<&Filter>) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(data, filter).into_bytes(),
        OutputFormat::Line => render_line(data, filter).into_bytes(),
        OutputFormat::Json => render_json(data, filter, value_to_json_terse),
        OutputFormat::Jsonh => render_json(data, filter, value_to_json_rich),
        OutputFormat::Xml => render_xml(data, filter),
    }
}

/// One leaf field within a decoded item's value tree: its path below the
/// item (segments joined by `/`) and the leaf value itself.
fn flatten_fields<'a>(value: &'a Value, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Group(fields) | Value::Compound(fields) => {
            for (name, v) in fields {
                let path = if prefix.is_empty() { name.clone() } else { format!("{prefix}/{name}") };
                flatten_fields(v, &path, out);
            }
        }
        Value::Repetition(items) => {
            for (i, v) in items.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                flatten_fields(v, &path, out);
            }
        }
        Value::Explicit { inner: Some(inner), .. } => flatten_fields(inner, prefix, out),
        leaf => out.push((prefix.to_string(), leaf)),
    }
}

fn top_field_name(path: &str) -> &str {
    path.split(['/', '[']).next().unwrap_or(path)
}

fn render_leaf_text(value: &Value) -> String {
    match value {
        Value::Number { raw, scaled, unit } => {
            let mut s = scaled.clone().unwrap_or_else(|| raw.to_string());
            if let Some(unit) = unit {
                let _ = write!(s, " {unit}");
            }
            s
        }
        Value::Text(s) => s.clone(),
        Value::Enum { raw, label } => match label {
            Some(l) => format!("{l} ({raw})"),
            None => format!("{raw} (unlabeled)"),
        },
        Value::Bytes(b) => hex_string(b),
        Value::BdsUnknown { register, raw } => format!("bds_unknown register=0x{register:02X} {}", hex_string(raw)),
        Value::Explicit { raw, .. } => hex_string(raw),
        Value::Group(_) | Value::Compound(_) | Value::Repetition(_) => String::new(),
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02X}");
        acc
    })
}

fn render_text(data: &AsterixData, filter: Option<&Filter>) -> String {
    let mut out = String::new();
    for block in &data.blocks {
        for record in &block.records {
            for item in &record.items {
                let _ = writeln!(out, "CAT/{:03}/{}", record.category, item.id);
                if item.partial {
                    out.push_str("  [partial]\n");
                }
                let mut leaves = Vec::new();
                flatten_fields(&item.value, "", &mut leaves);
                for (path, leaf) in leaves {
                    if !filter.map(|f| f.allows(record.category, &item.id, top_field_name(&path))).unwrap_or(true) {
                        continue;
                    }
                    let _ = writeln!(out, "  {path} = {}", render_leaf_text(leaf));
                }
                for warning in &item.warnings {
                    let _ = writeln!(out, "  [warn: {warning}]");
                }
            }
        }
        for error in &block.errors {
            let _ = writeln!(out, "[block error in CAT/{:03}: {error:?}]", block.category);
        }
    }
    out
}

fn render_line(data: &AsterixData, filter: Option<&Filter>) -> String {
    let mut out = String::new();
    for block in &data.blocks {
        for record in &block.records {
            for item in &record.items {
                let mut leaves = Vec::new();
                flatten_fields(&item.value, "", &mut leaves);
                for (path, leaf) in leaves {
                    if !filter.map(|f| f.allows(record.category, &item.id, top_field_name(&path))).unwrap_or(true) {
                        continue;
                    }
                    let _ = writeln!(
                        out,
                        "CAT/{:03}/{}/{} = {}",
                        record.category,
                        item.id,
                        path,
                        render_leaf_text(leaf)
                    );
                }
            }
        }
    }
    out
}

/// Terse conversion used by the `json` format: numbers collapse to their
/// scaled decimal (or raw integer, if unscaled), enums to their label (or
/// raw integer, if unlabeled) — the shape a human skimming output wants,
/// not a full mirror of the `Value` tree.
fn value_to_json_terse(value: &Value) -> Json {
    match value {
        Value::Number { raw, scaled, .. } => scaled.clone().map(Json::String).unwrap_or_else(|| json!(raw)),
        Value::Text(s) => json!(s),
        Value::Enum { raw, label } => label.clone().map(Json::String).unwrap_or_else(|| json!(raw)),
        Value::Bytes(b) => json!(hex_string(b)),
        Value::Group(fields) | Value::Compound(fields) => {
            let mut map = Map::new();
            for (name, v) in fields {
                map.insert(name.clone(), value_to_json_terse(v));
            }
            Json::Object(map)
        }
        Value::Repetition(items) => Json::Array(items.iter().map(value_to_json_terse).collect()),
        Value::Explicit { raw, inner } => match inner {
            Some(v) => value_to_json_terse(v),
            None => json!(hex_string(raw)),
        },
        Value::BdsUnknown { register, raw } => {
            json!({ "bds_unknown": true, "register": register, "raw": hex_string(raw) })
        }
    }
}

/// Full conversion used by the `jsonh` format: every numeric field keeps
/// its raw integer alongside the scaled value and unit, and the object
/// nesting mirrors `Compound`/`Repetitive` structure exactly (spec §4.4).
fn value_to_json_rich(value: &Value) -> Json {
    match value {
        Value::Number { raw, scaled, unit } => {
            json!({ "raw": raw, "scaled": scaled, "unit": unit })
        }
        Value::Text(s) => json!(s),
        Value::Enum { raw, label } => json!({ "raw": raw, "label": label }),
        Value::Bytes(b) => json!(hex_string(b)),
        Value::Group(fields) => {
            let mut map = Map::new();
            for (name, v) in fields {
                map.insert(name.clone(), value_to_json_rich(v));
            }
            Json::Object(map)
        }
        Value::Compound(fields) => {
            let mut map = Map::new();
            for (name, v) in fields {
                map.insert(name.clone(), value_to_json_rich(v));
            }
            json!({ "compound": Json::Object(map) })
        }
        Value::Repetition(items) => {
            json!({ "repetition": items.iter().map(value_to_json_rich).collect::<Vec<_>>() })
        }
        Value::Explicit { raw, inner } => {
            json!({ "explicit_raw": hex_string(raw), "inner": inner.as_deref().map(value_to_json_rich) })
        }
        Value::BdsUnknown { register, raw } => {
            json!({ "bds_unknown": true, "register": register, "raw": hex_string(raw) })
        }
    }
}

fn render_json(data: &AsterixData, filter: Option<&Filter>, convert: fn(&Value) -> Json) -> Vec<u8> {
    let mut records_json = Vec::new();
    for block in &data.blocks {
        for record in &block.records {
            let mut items_map = Map::new();
            for item in &record.items {
                let item_allowed = filter
                    .map(|f| f.0.iter().any(|e| e.cat == record.category && e.item_id == item.id))
                    .unwrap_or(true);
                if !item_allowed {
                    continue;
                }
                let value_json = filter_item_json(item, record.category, filter, convert);
                items_map.insert(item.id.clone(), value_json);
            }
            records_json.push(json!({ "cat": record.category, "items": Json::Object(items_map) }));
        }
    }
    serde_json::to_vec(&Json::Array(records_json)).expect("JSON values never fail to serialize")
}

/// Applies field-level filtering to one item's JSON conversion: if a filter
/// names specific fields for this `(cat, item_id)`, only those top-level
/// keys survive in the resulting object.
fn filter_item_json(
    item: &asterix_core::record::DataItem,
    cat: u8,
    filter: Option<&Filter>,
    convert: fn(&Value) -> Json,
) -> Json {
    let full = convert(&item.value);
    let Some(filter) = filter else { return full };
    let allowed_fields: Vec<&str> = filter
        .0
        .iter()
        .filter(|e| e.cat == cat && e.item_id == item.id && e.field_name.is_some())
        .map(|e| e.field_name.as_deref().unwrap())
        .collect();
    if allowed_fields.is_empty() {
        return full;
    }
    match full {
        Json::Object(map) => {
            let mut filtered = Map::new();
            for key in allowed_fields {
                if let Some(v) = map.get(key) {
                    filtered.insert(key.to_string(), v.clone());
                }
            }
            Json::Object(filtered)
        }
        other => other,
    }
}

fn render_xml(data: &AsterixData, filter: Option<&Filter>) -> Vec<u8> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("AsterixData"))).expect("in-memory writer never fails");
    for block in &data.blocks {
        let mut block_start = BytesStart::new("DataBlock");
        block_start.push_attribute(("cat", block.category.to_string().as_str()));
        writer.write_event(Event::Start(block_start)).unwrap();
        for record in &block.records {
            writer.write_event(Event::Start(BytesStart::new("Record"))).unwrap();
            for item in &record.items {
                let mut leaves = Vec::new();
                flatten_fields(&item.value, "", &mut leaves);
                let mut item_start = BytesStart::new("DataItem");
                item_start.push_attribute(("id", item.id.as_str()));
                if item.partial {
                    item_start.push_attribute(("partial", "true"));
                }
                writer.write_event(Event::Start(item_start)).unwrap();
                for (path, leaf) in leaves {
                    if !filter.map(|f| f.allows(record.category, &item.id, top_field_name(&path))).unwrap_or(true) {
                        continue;
                    }
                    let tag = xml_safe_tag(&path);
                    writer.write_event(Event::Start(BytesStart::new(tag.as_str()))).unwrap();
                    writer.write_event(Event::Text(BytesText::new(&render_leaf_text(leaf)))).unwrap();
                    writer.write_event(Event::End(BytesEnd::new(tag.as_str()))).unwrap();
                }
                writer.write_event(Event::End(BytesEnd::new("DataItem"))).unwrap();
            }
            writer.write_event(Event::End(BytesEnd::new("Record"))).unwrap();
        }
        writer.write_event(Event::End(BytesEnd::new("DataBlock"))).unwrap();
    }
    writer.write_event(Event::End(BytesEnd::new("AsterixData"))).unwrap();
    writer.into_inner()
}

/// A flattened field path like `A[0]/B` is not a legal XML element name;
/// render it as a safe tag while keeping it human-recognizable.
fn xml_safe_tag(path: &str) -> String {
    path.replace(['/', '[', ']'], "_")
}
