//! The parsed tree built per input record (spec §3): `AsterixData` ->
//! `DataBlock` -> `DataRecord` -> `DataItem` -> `Value`.

use crate::error::Warning;
use crate::value::Value;

/// One decoded data item within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    pub id: String,
    /// The raw bytes this item consumed from the record.
    pub raw: Vec<u8>,
    pub value: Value,
    /// Set when a `TruncationError` cut the item short (`value` then holds
    /// whatever was decoded before the cutoff), or when an `Explicit` item's
    /// declared payload didn't decode against its inner format (`value`
    /// holds the raw payload with no `inner`).
    pub partial: bool,
    pub warnings: Vec<Warning>,
}

/// A non-fatal condition attached to a whole record or block rather than a
/// single item.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockError {
    SchemaMismatch { cat: u16, frn: u32, reason: String },
    TrailingBytes { position: usize },
}

/// One decoded ASTERIX record: the UAP-ordered items present in it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub category: u8,
    pub edition: String,
    pub items: Vec<DataItem>,
}

impl DataRecord {
    pub fn item(&self, id: &str) -> Option<&DataItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// One DataBlock: a category number, its declared length, and the records
/// decoded from it. `errors` holds block-level issues (e.g. an abandoned
/// record after a `SchemaMismatchError`) that don't belong to any one
/// `DataRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub category: u8,
    pub length: u16,
    pub records: Vec<DataRecord>,
    pub errors: Vec<BlockError>,
}

/// The top-level parsed tree for a whole input buffer: every `DataBlock` in
/// byte order (spec §5 ordering guarantee).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsterixData {
    pub blocks: Vec<DataBlock>,
}

impl AsterixData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &DataRecord> {
        self.blocks.iter().flat_map(|b| b.records.iter())
    }
}
