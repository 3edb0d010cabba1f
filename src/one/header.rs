use uuid::Uuid;

use crate::one::bytes::Cursor;
use crate::one::refs::ChunkRef;
use crate::one::{OneError, Result};

/// Little-endian byte form of the `.one` file-type GUID.
pub const ONE_FILE_TYPE: [u8; 16] = [
	0xE4, 0x52, 0x5C, 0x7B, 0x8C, 0xD8, 0xA7, 0x4D, 0xAE, 0xB1, 0x53, 0x78, 0xD0, 0x29, 0x96, 0xD3,
];

/// Little-endian byte form of the `.onetoc2` file-type GUID.
pub const ONETOC2_FILE_TYPE: [u8; 16] = [
	0xA1, 0x2F, 0xFF, 0x43, 0xD9, 0xEF, 0x76, 0x4C, 0x9E, 0xE2, 0x10, 0xEA, 0x57, 0x22, 0x76, 0x5F,
];

/// Fixed on-disk header length.
pub const HEADER_SIZE: usize = 1024;

/// Which of the two OneNote container kinds the file declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
	/// A single section (`.one`).
	Section,
	/// A table of contents (`.onetoc2`).
	TableOfContents,
}

impl FileKind {
	/// Stable label for reports.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Section => "one",
			Self::TableOfContents => "onetoc2",
		}
	}
}

/// Parsed 1024-byte file header.
///
/// Only `fcr_file_node_list_root` drives decoding; the rest is read-through
/// metadata surfaced in reports.
#[derive(Debug, Clone)]
pub struct Header {
	pub file_kind: FileKind,
	pub guid_file_type: Uuid,
	pub guid_file: Uuid,
	pub guid_legacy_file_version: Uuid,
	pub guid_file_format: Uuid,
	pub ffv_last_writer: u32,
	pub ffv_oldest_writer: u32,
	pub ffv_newest_writer: u32,
	pub ffv_oldest_reader: u32,
	pub fcr_legacy_free_chunk_list: ChunkRef,
	pub fcr_legacy_transaction_log: ChunkRef,
	pub transactions_in_log: u32,
	pub cb_legacy_expected_file_length: u32,
	pub fcr_legacy_file_node_list_root: ChunkRef,
	pub cb_legacy_free_space: u32,
	pub needs_defrag: bool,
	pub repaired: bool,
	pub needs_garbage_collect: bool,
	pub has_no_embedded_file_objects: bool,
	pub guid_ancestor: Uuid,
	pub crc_name: u32,
	pub fcr_hashed_chunk_list: ChunkRef,
	pub fcr_transaction_log: ChunkRef,
	pub fcr_file_node_list_root: ChunkRef,
	pub fcr_free_chunk_list: ChunkRef,
	pub cb_expected_file_length: u64,
	pub cb_free_space_in_free_chunk_list: u64,
	pub guid_file_version: Uuid,
	pub file_version_generation: u64,
	pub guid_deny_read_file_version: Uuid,
	pub debug_log_flags: u32,
	pub fcr_debug_log: ChunkRef,
	pub fcr_alloc_verification_free_chunk_list: ChunkRef,
	pub bn_created: u32,
	pub bn_last_wrote: u32,
	pub bn_oldest_written: u32,
	pub bn_newest_written: u32,
}

impl Header {
	/// Parse the header at the start of `cursor`.
	///
	/// Fails with `BadSignature` unless the first 16 bytes are one of the two
	/// permitted file-type GUIDs, and with `Truncated` when fewer than 1024
	/// bytes are available.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		cursor.seek(0)?;
		let signature = cursor.read_exact(16)?;
		let file_kind = if signature == ONE_FILE_TYPE {
			FileKind::Section
		} else if signature == ONETOC2_FILE_TYPE {
			FileKind::TableOfContents
		} else {
			let mut got = [0_u8; 16];
			got.copy_from_slice(signature);
			return Err(OneError::BadSignature { got });
		};

		let mut sig = [0_u8; 16];
		sig.copy_from_slice(signature);
		let guid_file_type = Uuid::from_bytes_le(sig);

		let guid_file = cursor.read_guid()?;
		let guid_legacy_file_version = cursor.read_guid()?;
		let guid_file_format = cursor.read_guid()?;
		let ffv_last_writer = cursor.read_u32_le()?;
		let ffv_oldest_writer = cursor.read_u32_le()?;
		let ffv_newest_writer = cursor.read_u32_le()?;
		let ffv_oldest_reader = cursor.read_u32_le()?;
		let fcr_legacy_free_chunk_list = ChunkRef::parse_32(cursor)?;
		let fcr_legacy_transaction_log = ChunkRef::parse_32(cursor)?;
		let transactions_in_log = cursor.read_u32_le()?;
		let cb_legacy_expected_file_length = cursor.read_u32_le()?;
		let _placeholder = cursor.read_u64_le()?;
		let fcr_legacy_file_node_list_root = ChunkRef::parse_32(cursor)?;
		let cb_legacy_free_space = cursor.read_u32_le()?;
		let flags_defrag = cursor.read_u8()?;
		let flags_repaired = cursor.read_u8()?;
		let flags_gc = cursor.read_u8()?;
		let flags_no_embedded = cursor.read_u8()?;
		let guid_ancestor = cursor.read_guid()?;
		let crc_name = cursor.read_u32_le()?;
		let fcr_hashed_chunk_list = ChunkRef::parse_64x32(cursor)?;
		let fcr_transaction_log = ChunkRef::parse_64x32(cursor)?;
		let fcr_file_node_list_root = ChunkRef::parse_64x32(cursor)?;
		let fcr_free_chunk_list = ChunkRef::parse_64x32(cursor)?;
		let cb_expected_file_length = cursor.read_u64_le()?;
		let cb_free_space_in_free_chunk_list = cursor.read_u64_le()?;
		let guid_file_version = cursor.read_guid()?;
		let file_version_generation = cursor.read_u64_le()?;
		let guid_deny_read_file_version = cursor.read_guid()?;
		let debug_log_flags = cursor.read_u32_le()?;
		let fcr_debug_log = ChunkRef::parse_64x32(cursor)?;
		let fcr_alloc_verification_free_chunk_list = ChunkRef::parse_64x32(cursor)?;
		let bn_created = cursor.read_u32_le()?;
		let bn_last_wrote = cursor.read_u32_le()?;
		let bn_oldest_written = cursor.read_u32_le()?;
		let bn_newest_written = cursor.read_u32_le()?;
		// rgbReserved, zero-filled.
		let _reserved = cursor.read_exact(HEADER_SIZE - cursor.pos())?;

		Ok(Self {
			file_kind,
			guid_file_type,
			guid_file,
			guid_legacy_file_version,
			guid_file_format,
			ffv_last_writer,
			ffv_oldest_writer,
			ffv_newest_writer,
			ffv_oldest_reader,
			fcr_legacy_free_chunk_list,
			fcr_legacy_transaction_log,
			transactions_in_log,
			cb_legacy_expected_file_length,
			fcr_legacy_file_node_list_root,
			cb_legacy_free_space,
			needs_defrag: flags_defrag & 0x1 != 0,
			repaired: flags_repaired & 0x1 != 0,
			needs_garbage_collect: flags_gc & 0x1 != 0,
			has_no_embedded_file_objects: flags_no_embedded & 0x1 != 0,
			guid_ancestor,
			crc_name,
			fcr_hashed_chunk_list,
			fcr_transaction_log,
			fcr_file_node_list_root,
			fcr_free_chunk_list,
			cb_expected_file_length,
			cb_free_space_in_free_chunk_list,
			guid_file_version,
			file_version_generation,
			guid_deny_read_file_version,
			debug_log_flags,
			fcr_debug_log,
			fcr_alloc_verification_free_chunk_list,
			bn_created,
			bn_last_wrote,
			bn_oldest_written,
			bn_newest_written,
		})
	}
}

#[cfg(test)]
mod tests;
