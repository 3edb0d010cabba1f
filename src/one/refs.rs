use crate::one::bytes::Cursor;
use crate::one::{OneError, Result};

/// Decoded FileChunkReference: a (position, length) span into the file.
///
/// `Nil` (all encoded bytes 0xFF) and `Zero` (all 0x00) are the format's two
/// "no target" sentinels; both decode to an absent reference and are never
/// followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRef {
	/// All-0xFF sentinel.
	Nil,
	/// All-0x00 sentinel.
	Zero,
	/// A real span.
	Span {
		/// Absolute file offset of the referenced chunk.
		stp: u64,
		/// Byte count of the referenced chunk.
		cb: u64,
	},
}

impl ChunkRef {
	/// Whether this reference names no data.
	pub fn is_absent(&self) -> bool {
		!matches!(self, Self::Span { .. })
	}

	/// The (stp, cb) span, when present.
	pub fn span(&self) -> Option<(u64, u64)> {
		match self {
			Self::Span { stp, cb } => Some((*stp, *cb)),
			_ => None,
		}
	}

	/// Resolve to a checked usize range within a buffer of `len` bytes.
	///
	/// `at` names the record holding the reference, for error reporting.
	pub fn byte_range(&self, at: usize, len: usize) -> Result<Option<(usize, usize)>> {
		let Some((stp, cb)) = self.span() else {
			return Ok(None);
		};

		let start = usize::try_from(stp).ok();
		let count = usize::try_from(cb).ok();
		let end = start.zip(count).and_then(|(s, c)| s.checked_add(c));
		match (start, count, end) {
			(Some(start), Some(count), Some(end)) if end <= len => Ok(Some((start, count))),
			_ => Err(OneError::BadReference { at, stp, cb, len }),
		}
	}

	/// Decode a FileChunkReference32 (4-byte stp, 4-byte cb).
	pub fn parse_32(cursor: &mut Cursor<'_>) -> Result<Self> {
		let raw = cursor.read_exact(8)?;
		Ok(Self::classify(raw, u64::from(read_u32(&raw[0..4])), u64::from(read_u32(&raw[4..8]))))
	}

	/// Decode a FileChunkReference64 (8-byte stp, 8-byte cb).
	pub fn parse_64(cursor: &mut Cursor<'_>) -> Result<Self> {
		let raw = cursor.read_exact(16)?;
		Ok(Self::classify(raw, read_u64(&raw[0..8]), read_u64(&raw[8..16])))
	}

	/// Decode a FileChunkReference64x32 (8-byte stp, 4-byte cb).
	pub fn parse_64x32(cursor: &mut Cursor<'_>) -> Result<Self> {
		let raw = cursor.read_exact(12)?;
		Ok(Self::classify(raw, read_u64(&raw[0..8]), u64::from(read_u32(&raw[8..12]))))
	}

	/// Decode a FileNodeChunkReference embedded in a node body.
	///
	/// Widths and scaling are selected by the StpFormat / CbFormat bits of the
	/// node header; formats 2 and 3 store 8-aligned values divided by 8.
	pub fn parse_packed(cursor: &mut Cursor<'_>, stp_format: u8, cb_format: u8) -> Result<Self> {
		let stp_width = match stp_format & 0x3 {
			0 => 8,
			1 => 4,
			2 => 2,
			_ => 4,
		};
		let cb_width = match cb_format & 0x3 {
			0 => 4,
			1 => 8,
			2 => 1,
			_ => 2,
		};

		let raw = cursor.read_exact(stp_width + cb_width)?;
		let mut stp = read_uint(&raw[..stp_width]);
		let mut cb = read_uint(&raw[stp_width..]);
		if matches!(stp_format & 0x3, 2 | 3) {
			stp *= 8;
		}
		if matches!(cb_format & 0x3, 2 | 3) {
			cb *= 8;
		}

		Ok(Self::classify(raw, stp, cb))
	}

	fn classify(raw: &[u8], stp: u64, cb: u64) -> Self {
		if raw.iter().all(|byte| *byte == 0xFF) {
			Self::Nil
		} else if raw.iter().all(|byte| *byte == 0x00) {
			Self::Zero
		} else {
			Self::Span { stp, cb }
		}
	}
}

fn read_u32(raw: &[u8]) -> u32 {
	let mut buf = [0_u8; 4];
	buf.copy_from_slice(raw);
	u32::from_le_bytes(buf)
}

fn read_u64(raw: &[u8]) -> u64 {
	let mut buf = [0_u8; 8];
	buf.copy_from_slice(raw);
	u64::from_le_bytes(buf)
}

fn read_uint(raw: &[u8]) -> u64 {
	let mut buf = [0_u8; 8];
	buf[..raw.len()].copy_from_slice(raw);
	u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests;
