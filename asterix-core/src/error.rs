use std::fmt;

/// Schema-time failure raised while compiling XML category specifications
/// into a [`crate::schema::Definition`].
///
/// Unlike the runtime decode errors, a `DefinitionError` always aborts
/// loading immediately: it indicates a misconfigured system, not bad input
/// data (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The XML was not well-formed.
    Malformed { path: String, reason: String },
    /// An element name was not in the recognized set.
    UnknownElement { path: String, element: String },
    /// An attribute name was not in the recognized set for its element.
    UnknownAttribute { path: String, element: String, attribute: String },
    /// A required attribute was missing.
    MissingAttribute { path: String, element: String, attribute: String },
    /// A numeric attribute value was out of its permitted range.
    AttributeOutOfRange { path: String, element: String, attribute: String, value: String },
    /// Two non-default categories were loaded with the same category number.
    DuplicateCategory { cat: u8, edition: String },
    /// An FX marker appeared somewhere other than the low bit of an FSPEC
    /// octet or the last bit of a `Variable` part.
    MisplacedFx { item_id: String },
    /// A `Bits` range fell outside its enclosing field, or overlapped a
    /// sibling range.
    BitsRangeInvalid { item_id: String, from_bit: u32, to_bit: u32 },
    /// A UAP item referenced an item ID with no matching `DataItemDescription`.
    UndefinedItemReference { item_id: String },
    /// A `BitsPresenceOfField` guard named a sibling `Bits` field that was
    /// not declared earlier in the same enclosing part.
    UndefinedPresenceField { item_id: String, field: String },
    /// Reading the underlying byte stream for a spec file failed.
    Io { path: String, reason: String },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::Malformed { path, reason } => {
                write!(f, "{path}: malformed XML: {reason}")
            }
            DefinitionError::UnknownElement { path, element } => {
                write!(f, "{path}: unknown element <{element}>")
            }
            DefinitionError::UnknownAttribute { path, element, attribute } => {
                write!(f, "{path}: unknown attribute `{attribute}` on <{element}>")
            }
            DefinitionError::MissingAttribute { path, element, attribute } => {
                write!(f, "{path}: <{element}> is missing required attribute `{attribute}`")
            }
            DefinitionError::AttributeOutOfRange { path, element, attribute, value } => {
                write!(
                    f,
                    "{path}: <{element}> attribute `{attribute}` = `{value}` is out of range"
                )
            }
            DefinitionError::DuplicateCategory { cat, edition } => {
                write!(f, "duplicate non-default category {cat} edition {edition}")
            }
            DefinitionError::MisplacedFx { item_id } => {
                write!(f, "item {item_id}: FX marker in a disallowed position")
            }
            DefinitionError::BitsRangeInvalid { item_id, from_bit, to_bit } => {
                write!(f, "item {item_id}: bit range [{from_bit}, {to_bit}] is invalid")
            }
            DefinitionError::UndefinedItemReference { item_id } => {
                write!(f, "UAP references undefined item id `{item_id}`")
            }
            DefinitionError::UndefinedPresenceField { item_id, field } => {
                write!(f, "item {item_id}: presence condition references undefined field `{field}`")
            }
            DefinitionError::Io { path, reason } => write!(f, "{path}: {reason}"),
        }
    }
}

impl std::error::Error for DefinitionError {}

/// Runtime buffer exhaustion encountered mid-item (spec §7).
///
/// Never escapes the public decode entry point: it is caught at the item or
/// record boundary and folded into [`crate::record::DataItem::partial`] plus
/// the returned [`DecodeStatus::Truncated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationError {
    pub position: usize,
}

impl fmt::Display for TruncationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truncated at byte offset {}", self.position)
    }
}

impl std::error::Error for TruncationError {}

/// Active UAP references an item ID the category has no description for, or
/// a Compound mask indexes beyond its secondaries (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatchError {
    pub cat: u16,
    pub frn: u32,
    pub reason: String,
}

impl fmt::Display for SchemaMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema mismatch in CAT{:03} FRN{}: {}", self.cat, self.frn, self.reason)
    }
}

impl std::error::Error for SchemaMismatchError {}

/// Outcome of a single [`crate::decode`](../asterix/fn.decode.html) call,
/// per the external interface in spec §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    Ok,
    /// Every record was fully walked (no buffer was cut short), but at least
    /// one `Explicit` item's declared payload didn't decode against its
    /// inner format. Distinct from `Truncated`: the outer cursor consumed
    /// exactly the bytes the item declared, so later items and records
    /// decoded normally.
    Partial { item_id: String },
    Truncated { position: usize },
    SchemaMismatch { cat: u16, frn: u32 },
    Cancelled,
}

/// Non-fatal condition surfaced on a [`crate::record::DataItem`] or during
/// rendering (spec §7: `EncodingWarning`, `FilterMissError`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Six-bit-ASCII field contained a code with no assigned character.
    SixBitAsciiUnassigned { code: u8 },
    /// Enumerated value had no matching label in the schema.
    EnumNoLabel { raw: i64 },
    /// Scale factor pushed the value outside its representable range.
    ScaleOverflow,
    /// A BDS register byte had no entry in the dispatch table.
    BdsUnknownRegister { register: u8 },
    /// An `Explicit` item's payload didn't decode against its declared inner
    /// format (truncated or schema-mismatched within the payload); the item
    /// is kept as raw bytes with no `inner` value and marked partial.
    ExplicitInnerUndecoded { frn: u32 },
    /// Renderer filter referenced a field absent from the parsed tree.
    FilterMiss { item_id: String, field: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SixBitAsciiUnassigned { code } => {
                write!(f, "six-bit-ASCII code 0x{code:02X} has no assigned character")
            }
            Warning::EnumNoLabel { raw } => write!(f, "enum value {raw} has no label"),
            Warning::ScaleOverflow => write!(f, "scaled value overflowed its representable range"),
            Warning::BdsUnknownRegister { register } => {
                write!(f, "BDS register 0x{register:02X} is not in the dispatch table")
            }
            Warning::ExplicitInnerUndecoded { frn } => {
                write!(f, "FRN{frn}: Explicit payload did not decode against its inner format")
            }
            Warning::FilterMiss { item_id, field } => {
                write!(f, "filter referenced missing field {item_id}/{field}")
            }
        }
    }
}
