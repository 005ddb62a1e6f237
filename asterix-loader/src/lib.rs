//! Compiles XML ASTERIX category definitions into the `asterix-core` schema
//! tree.
//!
//! Parsing is event-driven (SAX-style) rather than `serde`-derived: the
//! category vocabulary nests arbitrarily deep under `Compound`/`Explicit`,
//! and cross-references (a `UAP` item's id, a presence guard's sibling
//! field) need to be validated against state accumulated while walking, not
//! just shaped by a fixed Rust type.

mod attrs;
mod category;
mod index;

pub use index::{load_definition, FileReader, FsFileReader};
