use crate::one::bytes::Cursor;
use crate::one::refs::ChunkRef;
use crate::one::{OneError, Result};

/// Little-endian byte form of the FileDataStoreObject header GUID
/// `{BDE316E7-2665-4511-A4C4-8D4D0B7A9EAC}`.
pub const STORE_HEADER_GUID: [u8; 16] = [
	0xE7, 0x16, 0xE3, 0xBD, 0x65, 0x26, 0x11, 0x45, 0xA4, 0xC4, 0x8D, 0x4D, 0x0B, 0x7A, 0x9E, 0xAC,
];

/// Little-endian byte form of the FileDataStoreObject footer GUID
/// `{71FBA722-0F79-4A0B-BB13-899256426B24}`.
pub const STORE_FOOTER_GUID: [u8; 16] = [
	0x22, 0xA7, 0xFB, 0x71, 0x79, 0x0F, 0x0B, 0x4A, 0xBB, 0x13, 0x89, 0x92, 0x56, 0x42, 0x6B, 0x24,
];

/// Header GUID + cbLength + unused + reserved.
const STORE_HEADER_SIZE: usize = 36;

/// An embedded-file payload located inside a validated store object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreObject<'a> {
	/// Absolute file offset of the store header.
	pub offset: usize,
	/// The embedded bytes, verbatim.
	pub payload: &'a [u8],
}

/// Resolve and validate the FileDataStoreObject referenced by `reference`.
///
/// The payload must fit between header and footer, and both GUID frames must
/// match their constants; any mismatch is `CorruptDataStore` and no payload is
/// exposed. `at` names the record holding the reference.
pub fn read_store_object<'a>(buf: &'a [u8], reference: ChunkRef, at: usize) -> Result<StoreObject<'a>> {
	let Some((start, len)) = reference.byte_range(at, buf.len())? else {
		return Err(OneError::CorruptDataStore { at, detail: "absent reference" });
	};
	if len < STORE_HEADER_SIZE + STORE_FOOTER_GUID.len() {
		return Err(OneError::CorruptDataStore {
			at: start,
			detail: "window too small for header and footer",
		});
	}
	let end = start + len;

	let mut cursor = Cursor::new(&buf[..end]);
	cursor.seek(start)?;

	if cursor.read_exact(16)? != STORE_HEADER_GUID {
		return Err(OneError::CorruptDataStore { at: start, detail: "header guid mismatch" });
	}
	let cb_length = cursor.read_u64_le()?;
	let _unused = cursor.read_u32_le()?;
	let _reserved = cursor.read_u64_le()?;

	let payload_len = usize::try_from(cb_length).ok().filter(|n| {
		start
			.checked_add(STORE_HEADER_SIZE)
			.and_then(|v| v.checked_add(*n))
			.and_then(|v| v.checked_add(STORE_FOOTER_GUID.len()))
			.is_some_and(|v| v <= end)
	});
	let Some(payload_len) = payload_len else {
		return Err(OneError::CorruptDataStore { at: start, detail: "payload length overrun" });
	};
	let payload = cursor.read_exact(payload_len)?;

	// Footer sits at the end of the referenced window, after any padding.
	let mut footer_cursor = Cursor::new(&buf[..end]);
	footer_cursor.seek(end - STORE_FOOTER_GUID.len())?;
	if footer_cursor.read_exact(16)? != STORE_FOOTER_GUID {
		return Err(OneError::CorruptDataStore { at: start, detail: "footer guid mismatch" });
	}

	Ok(StoreObject { offset: start, payload })
}
