//! The schema tree (spec §3): `Definition` owns `Category`, which owns its
//! `DataItemDescription`s and `Uap` alternatives. `UapItem` holds a
//! non-owning reference — an item ID looked up in the owning `Category` —
//! never a pointer or index into another structure, so the tree stays a
//! strict DAG (spec §9 "Cyclic references. None required").

use std::collections::BTreeMap;

/// A single `Bits` sub-field's encoding (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Unsigned,
    Signed,
    SixBitAscii,
    Octal,
    Hex,
    AsciiString,
}

/// A sibling-bit presence guard: this `Bits` field is decoded only when the
/// referenced range within the *same* enclosing `Fixed` part equals `equals`
/// (spec §3 "optional presence-condition").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub from_bit: u32,
    pub to_bit: u32,
    pub equals: u64,
}

use crate::value::Rational;

/// One bit-range sub-field within an enclosing `Fixed` part.
#[derive(Debug, Clone, PartialEq)]
pub struct BitsField {
    pub name: String,
    pub short_name: Option<String>,
    pub from_bit: u32,
    pub to_bit: u32,
    pub encoding: Encoding,
    pub scale: Option<Rational>,
    pub unit: Option<String>,
    /// Raw integer -> label, for enumerated fields. Empty means "not an enum".
    pub enum_values: BTreeMap<i64, String>,
    pub presence: Option<Presence>,
    /// Marks the FX continuation bit of a `Variable` part. FX bits are
    /// consumed but never appear in the decoded `Value` tree (spec §4.2
    /// step 4: "ignore it ... do not invoke any decoder" — the analogous
    /// rule applies to Variable's own FX bit).
    pub is_fx: bool,
}

impl BitsField {
    pub fn width(&self) -> u32 {
        self.to_bit - self.from_bit + 1
    }
}

/// One fixed-size, byte-aligned span of bits — the building block reused by
/// every `Format` variant that has one (`Fixed` itself, each `Variable`
/// part, a `Repetitive` element, a `Compound` secondary's frame, a `BDS`
/// sub-format).
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPart {
    pub length_bytes: u32,
    pub bits: Vec<BitsField>,
}

/// The format subtree rooted at a `DataItemDescription` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    Fixed(FixedPart),
    Variable { parts: Vec<FixedPart> },
    Repetitive { counter_bytes: u32, element: FixedPart },
    /// `primary` is itself a `FixedPart` acting as an FSPEC-style mask; its
    /// `bits` are ignored except that their count establishes how many
    /// mask octets to read up front is not needed — the mask is read with
    /// [`crate::fspec::read_presence_bits`] directly against the cursor, so
    /// `primary` here only needs to exist for schema validation purposes.
    Compound { secondaries: Vec<(String, Format)> },
    Explicit { inner: Option<Box<Format>> },
    Bds { table: BTreeMap<u8, FixedPart> },
}

/// One data item's description (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct DataItemDescription {
    pub id: String,
    pub name: String,
    pub definition: String,
    pub format: Format,
}

/// A UAP entry: either a real item slot or the FX sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UapItem {
    pub frn: u32,
    /// `None` marks the FX sentinel entry for this FSPEC window.
    pub item_id: Option<String>,
}

/// The condition under which a non-default UAP is selected (spec §3, §4.2
/// step 1): a sibling item's bit range must equal a fixed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UapCondition {
    pub item_id: String,
    pub from_bit: u32,
    pub to_bit: u32,
    pub equals: u64,
}

/// One User Application Profile alternative for a `Category`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uap {
    pub name: String,
    /// `None` marks the default UAP.
    pub condition: Option<UapCondition>,
    /// Ordered by FRN.
    pub items: Vec<UapItem>,
}

impl Uap {
    pub fn item_for_frn(&self, frn: u32) -> Option<&UapItem> {
        self.items.iter().find(|i| i.frn == frn)
    }
}

/// One category number's worth of schema: its data item descriptions and
/// its UAP alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub number: u8,
    pub edition: String,
    pub name: String,
    pub is_default: bool,
    pub items: BTreeMap<String, DataItemDescription>,
    pub uaps: Vec<Uap>,
}

impl Category {
    pub fn item(&self, id: &str) -> Option<&DataItemDescription> {
        self.items.get(id)
    }

    /// The UAP with no selection condition. Every `Category` the loader
    /// constructs is validated to have exactly one (spec §4.1: "first
    /// loaded wins" is a load-time tie-break, not a runtime ambiguity).
    pub fn default_uap(&self) -> &Uap {
        self.uaps
            .iter()
            .find(|u| u.condition.is_none())
            .expect("Category invariant: a default UAP always exists once loaded")
    }
}

/// The full compiled schema tree: every loaded `Category`, keyed by number,
/// with all its editions.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    /// Category number -> all loaded editions for that number.
    categories: BTreeMap<u8, Vec<Category>>,
}

impl Definition {
    pub fn new() -> Self {
        Self { categories: BTreeMap::new() }
    }

    /// Inserts a category edition. Does not enforce the "one default"
    /// invariant — that is the loader's job at the point a whole index is
    /// compiled, so that partial definitions built up during loading don't
    /// need to satisfy it early.
    pub fn insert(&mut self, category: Category) {
        self.categories.entry(category.number).or_default().push(category);
    }

    /// The default-edition `Category` for `cat`, if loaded.
    ///
    /// If none is marked default, the lexicographically-highest edition
    /// string wins (spec §4.1 tie-break policy).
    pub fn category(&self, cat: u8) -> Option<&Category> {
        let editions = self.categories.get(&cat)?;
        editions
            .iter()
            .find(|c| c.is_default)
            .or_else(|| editions.iter().max_by(|a, b| a.edition.cmp(&b.edition)))
    }

    pub fn category_edition(&self, cat: u8, edition: &str) -> Option<&Category> {
        self.categories.get(&cat)?.iter().find(|c| c.edition == edition)
    }

    pub fn editions(&self, cat: u8) -> &[Category] {
        self.categories.get(&cat).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_category(number: u8, edition: &str, default: bool) -> Category {
        Category {
            number,
            edition: edition.to_string(),
            name: "Test".to_string(),
            is_default: default,
            items: BTreeMap::new(),
            uaps: vec![Uap { name: "uap".to_string(), condition: None, items: vec![] }],
        }
    }

    #[test]
    fn default_edition_is_preferred() {
        let mut def = Definition::new();
        def.insert(sample_category(48, "1.15", false));
        def.insert(sample_category(48, "1.30", true));
        assert_eq!(def.category(48).unwrap().edition, "1.30");
    }

    #[test]
    fn falls_back_to_lexicographically_highest_edition_when_no_default() {
        let mut def = Definition::new();
        def.insert(sample_category(48, "1.15", false));
        def.insert(sample_category(48, "1.30", false));
        assert_eq!(def.category(48).unwrap().edition, "1.30");
    }

    #[test]
    fn unknown_category_is_none() {
        let def = Definition::new();
        assert!(def.category(99).is_none());
    }
}
