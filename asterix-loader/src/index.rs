//! The index-file reader: compiles a `<Index>` document plus the category
//! files it references into a whole [`Definition`] (spec §6).

use std::io;

use asterix_core::error::DefinitionError;
use asterix_core::schema::Definition;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::attrs::{collect_attrs, optional_bool, required};
use crate::category::parse_category;

/// Abstracts the byte source a path resolves to, so the loader never
/// touches the filesystem directly (spec §6: "the loader never touches the
/// filesystem directly").
pub trait FileReader {
    fn read(&mut self, path: &str) -> io::Result<Vec<u8>>;
}

/// A `FileReader` backed by the local filesystem, for callers that have no
/// reason to virtualize it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileReader;

impl FileReader for FsFileReader {
    fn read(&mut self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

struct IndexEntry {
    cat: u8,
    edition: String,
    file: String,
    default: bool,
}

/// Compiles `index_file_path` and every category file it references into a
/// [`Definition`] (spec §6).
pub fn load_definition(
    file_reader: &mut dyn FileReader,
    index_file_path: &str,
) -> Result<Definition, DefinitionError> {
    let bytes = file_reader.read(index_file_path).map_err(|e| DefinitionError::Io {
        path: index_file_path.to_string(),
        reason: e.to_string(),
    })?;
    let entries = parse_index(index_file_path, &bytes)?;

    let mut definition = Definition::new();
    for entry in &entries {
        let category_bytes = file_reader.read(&entry.file).map_err(|e| DefinitionError::Io {
            path: entry.file.clone(),
            reason: e.to_string(),
        })?;
        let mut category = parse_category(&entry.file, &category_bytes)?;
        category.edition = entry.edition.clone();
        category.is_default = entry.default;
        if category.number != entry.cat {
            return Err(DefinitionError::Malformed {
                path: entry.file.clone(),
                reason: format!(
                    "index entry declares cat={} but file defines Category id={}",
                    entry.cat, category.number
                ),
            });
        }
        definition.insert(category);
    }

    for cat in definition.categories().map(|c| c.number).collect::<std::collections::BTreeSet<_>>() {
        let editions = definition.editions(cat);
        let defaults = editions.iter().filter(|c| c.is_default).count();
        if defaults > 1 {
            return Err(DefinitionError::DuplicateCategory {
                cat,
                edition: editions.iter().find(|c| c.is_default).unwrap().edition.clone(),
            });
        }
        let mut seen = std::collections::BTreeSet::new();
        for c in editions {
            if !seen.insert(&c.edition) {
                return Err(DefinitionError::DuplicateCategory { cat, edition: c.edition.clone() });
            }
        }
    }

    Ok(definition)
}

fn parse_index(path: &str, xml: &[u8]) -> Result<Vec<IndexEntry>, DefinitionError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| DefinitionError::Malformed { path: path.to_string(), reason: e.to_string() })?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    loop {
        match next_event(path, &mut reader)? {
            Event::Start(e) if e.name().as_ref() == b"Index" => {
                entries = parse_index_body(path, &mut reader)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            other => return Err(unexpected(path, &other)),
        }
    }
    if entries.is_empty() {
        return Err(DefinitionError::Malformed {
            path: path.to_string(),
            reason: "index has no <Entry> elements".to_string(),
        });
    }
    Ok(entries)
}

fn parse_index_body(path: &str, reader: &mut Reader<&[u8]>) -> Result<Vec<IndexEntry>, DefinitionError> {
    let mut entries = Vec::new();
    loop {
        match next_event(path, reader)? {
            Event::Empty(e) if e.name().as_ref() == b"Entry" => {
                entries.push(parse_entry(path, &e)?);
            }
            Event::Start(e) if e.name().as_ref() == b"Entry" => {
                entries.push(parse_entry(path, &e)?);
                match next_event(path, reader)? {
                    Event::End(end) if end.name().as_ref() == b"Entry" => {}
                    other => return Err(unexpected(path, &other)),
                }
            }
            Event::End(e) if e.name().as_ref() == b"Index" => break,
            other => return Err(unexpected(path, &other)),
        }
    }
    Ok(entries)
}

fn parse_entry(path: &str, start: &BytesStart<'_>) -> Result<IndexEntry, DefinitionError> {
    let attrs = collect_attrs(path, start, "Entry", &["cat", "edition", "file", "default"])?;
    let cat: u8 = required(path, "Entry", &attrs, "cat")?
        .parse()
        .map_err(|_| DefinitionError::AttributeOutOfRange {
            path: path.to_string(),
            element: "Entry".to_string(),
            attribute: "cat".to_string(),
            value: attrs.get("cat").cloned().unwrap_or_default(),
        })?;
    let edition = required(path, "Entry", &attrs, "edition")?.to_string();
    let file = required(path, "Entry", &attrs, "file")?.to_string();
    let default = optional_bool(&attrs, "default", false);
    Ok(IndexEntry { cat, edition, file, default })
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
        other => format!("{other:?}"),
    };
    DefinitionError::UnknownElement { path: path.to_string(), element }
}
