//! Core schema tree, parsed-record types, and bit-level decoding primitives
//! shared by the ASTERIX definition loader and decoder.
//!
//! This crate has no knowledge of XML or any particular output format; it
//! is the immutable data model (spec §3) and the handful of primitives
//! (`bits`, `fspec`) precise enough that both the loader and the decoder
//! build on the same bit-numbering convention.

pub mod bits;
pub mod error;
pub mod fspec;
pub mod record;
pub mod schema;
pub mod value;

pub use error::{DecodeStatus, DefinitionError, SchemaMismatchError, TruncationError, Warning};
pub use record::{AsterixData, BlockError, DataBlock, DataItem, DataRecord};
pub use schema::{
    BitsField, Category, DataItemDescription, Definition, Encoding, FixedPart, Format, Presence,
    Uap, UapCondition, UapItem,
};
pub use value::{Rational, Value};
