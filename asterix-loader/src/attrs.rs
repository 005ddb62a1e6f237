//! Small attribute-reading helpers shared by every element handler in
//! [`crate::category`].

use asterix_core::error::DefinitionError;
use quick_xml::events::BytesStart;
use std::collections::BTreeMap;

/// Reads every attribute on `start`, unescaping its value, and rejects any
/// attribute name not in `allowed` (spec §4.1: "unknown attributes raise
/// DefinitionError").
pub fn collect_attrs(
    path: &str,
    start: &BytesStart<'_>,
    element: &str,
    allowed: &[&str],
) -> Result<BTreeMap<String, String>, DefinitionError> {
    let mut map = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DefinitionError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if !allowed.contains(&key.as_str()) {
            return Err(DefinitionError::UnknownAttribute {
                path: path.to_string(),
                element: element.to_string(),
                attribute: key,
            });
        }
        let value = attr
            .unescape_value()
            .map_err(|e| DefinitionError::Malformed { path: path.to_string(), reason: e.to_string() })?
            .to_string();
        map.insert(key, value);
    }
    Ok(map)
}

pub fn required<'a>(
    path: &str,
    element: &str,
    attrs: &'a BTreeMap<String, String>,
    name: &str,
) -> Result<&'a str, DefinitionError> {
    attrs.get(name).map(String::as_str).ok_or_else(|| DefinitionError::MissingAttribute {
        path: path.to_string(),
        element: element.to_string(),
        attribute: name.to_string(),
    })
}

pub fn required_u32(
    path: &str,
    element: &str,
    attrs: &BTreeMap<String, String>,
    name: &str,
) -> Result<u32, DefinitionError> {
    let raw = required(path, element, attrs, name)?;
    raw.parse::<u32>().map_err(|_| DefinitionError::AttributeOutOfRange {
        path: path.to_string(),
        element: element.to_string(),
        attribute: name.to_string(),
        value: raw.to_string(),
    })
}

pub fn optional_bool(attrs: &BTreeMap<String, String>, name: &str, default: bool) -> bool {
    match attrs.get(name).map(String::as_str) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

pub fn optional_i64(
    path: &str,
    element: &str,
    attrs: &BTreeMap<String, String>,
    name: &str,
) -> Result<Option<i64>, DefinitionError> {
    match attrs.get(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| DefinitionError::AttributeOutOfRange {
                path: path.to_string(),
                element: element.to_string(),
                attribute: name.to_string(),
                value: raw.to_string(),
            }),
    }
}
