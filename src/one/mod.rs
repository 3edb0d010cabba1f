pub mod bytes;
mod error;
pub mod filedata;
mod file;
pub mod guid;
mod header;
mod jcid;
pub mod list;
pub mod node;
pub mod object;
pub mod props;
pub mod refs;

/// Error, result, and diagnostic types.
pub use error::{Diagnostic, OneError, Result};
/// File abstraction, parse options, and decoded document types.
pub use file::{Document, EmbeddedFile, Link, LinkSource, OneFile, ParseOptions};
/// File header representation and the two file-type signatures.
pub use header::{FileKind, Header, HEADER_SIZE, ONETOC2_FILE_TYPE, ONE_FILE_TYPE};
/// Object-class identifier.
pub use jcid::Jcid;
