use uuid::Uuid;

use crate::one::{OneError, Result};

/// Bounded random-access cursor over the file buffer.
///
/// Every higher layer routes byte access through this type so bounds are
/// enforced in one place. Reads return slices borrowed from the buffer.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return total buffer length.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Return whether the buffer is empty.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Move the cursor to an absolute offset.
	pub fn seek(&mut self, offset: usize) -> Result<()> {
		if offset > self.bytes.len() {
			return Err(OneError::Truncated {
				at: offset,
				need: 0,
				rem: 0,
			});
		}
		self.pos = offset;
		Ok(())
	}

	/// Read exactly `n` bytes and advance the cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(OneError::Truncated {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a single byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		let raw = self.read_exact(1)?;
		Ok(raw[0])
	}

	/// Read a little-endian `u16`.
	pub fn read_u16_le(&mut self) -> Result<u16> {
		let raw = self.read_exact(2)?;
		let mut buf = [0_u8; 2];
		buf.copy_from_slice(raw);
		Ok(u16::from_le_bytes(buf))
	}

	/// Read a little-endian `u32`.
	pub fn read_u32_le(&mut self) -> Result<u32> {
		let raw = self.read_exact(4)?;
		let mut buf = [0_u8; 4];
		buf.copy_from_slice(raw);
		Ok(u32::from_le_bytes(buf))
	}

	/// Read a little-endian `u64`.
	pub fn read_u64_le(&mut self) -> Result<u64> {
		let raw = self.read_exact(8)?;
		let mut buf = [0_u8; 8];
		buf.copy_from_slice(raw);
		Ok(u64::from_le_bytes(buf))
	}

	/// Read a 16-byte GUID stored with little-endian field order.
	pub fn read_guid(&mut self) -> Result<Uuid> {
		let raw = self.read_exact(16)?;
		let mut buf = [0_u8; 16];
		buf.copy_from_slice(raw);
		Ok(Uuid::from_bytes_le(buf))
	}
}
