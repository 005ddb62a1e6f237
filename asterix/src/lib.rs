//! Decodes raw ASTERIX byte streams against an XML-driven schema and
//! renders the result as text, line, JSON, JSONH, or XML.
//!
//! ## Usage
//!
//! ```ignore
//! use asterix_loader::{load_definition, FsFileReader};
//! use asterix::{decode, render, DecodeOptions, OutputFormat};
//!
//! let definition = load_definition(&mut FsFileReader, "index.xml")?;
//! let (tree, _consumed, _status) = decode(&definition, &bytes, &DecodeOptions::default());
//! let text = render(&tree, OutputFormat::Text, None);
//! ```

mod decode;
mod decoders;
mod render;
mod uap;
mod walk;

pub use decode::{decode, DecodeOptions, Observability};
pub use render::{render, Filter, FilterEntry, OutputFormat};

pub use asterix_core::error::{DecodeStatus, DefinitionError, SchemaMismatchError, TruncationError, Warning};
pub use asterix_core::record::{AsterixData, BlockError, DataBlock, DataItem, DataRecord};
pub use asterix_core::schema::{Category, Definition};
pub use asterix_core::value::{Rational, Value};
pub use asterix_loader::{load_definition, FileReader, FsFileReader};
