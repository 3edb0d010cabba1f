use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, OneError>;

/// Errors produced while reading, decoding, and traversing OneNote revision-store data.
#[derive(Debug, Error)]
pub enum OneError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// JSON report serialization failure.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// First 16 bytes match neither known file-type GUID.
	#[error("not a OneNote file (first 16 bytes match neither .one nor .onetoc2 signature)")]
	BadSignature {
		/// Leading bytes of the stream.
		got: [u8; 16],
	},
	/// Not enough bytes remained for a requested read.
	#[error("truncated input at offset {at}, need {need} bytes, remaining {rem}")]
	Truncated {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// FileNodeList fragment header or footer magic mismatch.
	#[error("bad fragment magic at offset {at}: expected {expected:#018x}, got {got:#018x}")]
	BadMagic {
		/// Offset of the mismatching qword.
		at: usize,
		/// Expected magic value.
		expected: u64,
		/// Actual value read.
		got: u64,
	},
	/// FileNode header reserved bit was non-zero.
	#[error("file node reserved bit set at offset {at}")]
	ReservedBitSet {
		/// File offset of the node header.
		at: usize,
	},
	/// FileNodeID outside the known set.
	#[error("unknown file node id {id:#05x} at offset {at}")]
	UnknownNodeId {
		/// File offset of the node header.
		at: usize,
		/// The 10-bit FileNodeID value.
		id: u16,
	},
	/// FileNode header Size field is inconsistent with its container.
	#[error("bad file node size {size} at offset {at}")]
	BadNodeSize {
		/// File offset of the node header.
		at: usize,
		/// Declared total node size.
		size: u32,
	},
	/// Recursion ceiling hit while nesting FileNodeLists or property sets.
	#[error("recursion depth exceeded (max={max})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max: u32,
	},
	/// Chunk reference points outside the file buffer.
	#[error("chunk reference out of bounds at offset {at}: stp={stp}, cb={cb}, file_len={len}")]
	BadReference {
		/// Offset of the record holding the reference.
		at: usize,
		/// Referenced start position.
		stp: u64,
		/// Referenced byte count.
		cb: u64,
		/// Total buffer length.
		len: usize,
	},
	/// FileDataStoreObject GUID mismatch or payload length overrun.
	#[error("corrupt file data store at offset {at}: {detail}")]
	CorruptDataStore {
		/// Offset of the store object.
		at: usize,
		/// Which check failed.
		detail: &'static str,
	},
	/// An ID-family property requested more CompactIDs than its stream holds.
	#[error("{stream} stream exhausted while decoding property set at offset {at}")]
	PropertyStreamExhausted {
		/// Stream label (OIDs, OSIDs, ContextIDs).
		stream: &'static str,
		/// Offset of the property set.
		at: usize,
	},
	/// FileNodeList fragment chain revisited an offset or exceeded the sanity limit.
	#[error("cyclic or over-long file node list at offset {at}")]
	CyclicOrDeepList {
		/// Offset of the offending fragment.
		at: usize,
	},
	/// CompactID guidIndex has no entry in the current Global Identification Table.
	#[error("compact id index {index} outside global id table (population {population})")]
	CompactIdOutOfRange {
		/// Requested guidIndex.
		index: u32,
		/// Entries currently in the table.
		population: u32,
	},
	/// Property type tag outside the known encodings.
	#[error("unknown property type tag {tag:#04x} at offset {at}")]
	UnknownPropertyType {
		/// Offset of the property set body.
		at: usize,
		/// The 5-bit type tag.
		tag: u8,
	},
	/// Requested JSON report section does not exist.
	#[error("unknown report section: {name}")]
	UnknownReportSection {
		/// User-provided section name.
		name: String,
	},
}

/// One recoverable decoding problem recorded against a file offset.
///
/// A parse run returns the (possibly pruned) entity tree together with these,
/// so damaged inputs still yield actionable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	/// File offset the problem was detected at.
	pub offset: usize,
	/// Human-readable description.
	pub message: String,
}

impl Diagnostic {
	/// Record a recoverable error against `offset`.
	pub fn new(offset: usize, err: &OneError) -> Self {
		Self {
			offset,
			message: err.to_string(),
		}
	}

	/// Record a free-form observation against `offset`.
	pub fn note(offset: usize, message: impl Into<String>) -> Self {
		Self {
			offset,
			message: message.into(),
		}
	}
}
