use super::*;

#[test]
fn decodes_64x32_span() {
	let mut bytes = Vec::new();
	bytes.extend_from_slice(&0x400_u64.to_le_bytes());
	bytes.extend_from_slice(&0x80_u32.to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	let reference = ChunkRef::parse_64x32(&mut cursor).expect("reference parses");
	assert_eq!(reference, ChunkRef::Span { stp: 0x400, cb: 0x80 });
}

#[test]
fn decodes_64_span() {
	let mut bytes = Vec::new();
	bytes.extend_from_slice(&0x10_0000_0000_u64.to_le_bytes());
	bytes.extend_from_slice(&0x2000_u64.to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	let reference = ChunkRef::parse_64(&mut cursor).expect("reference parses");
	assert_eq!(reference, ChunkRef::Span { stp: 0x10_0000_0000, cb: 0x2000 });
}

#[test]
fn all_ff_encoding_is_nil() {
	let bytes = [0xFF_u8; 12];
	let mut cursor = Cursor::new(&bytes);
	let reference = ChunkRef::parse_64x32(&mut cursor).expect("reference parses");
	assert_eq!(reference, ChunkRef::Nil);
	assert!(reference.is_absent());
}

#[test]
fn all_zero_encoding_is_zero() {
	let bytes = [0_u8; 8];
	let mut cursor = Cursor::new(&bytes);
	let reference = ChunkRef::parse_32(&mut cursor).expect("reference parses");
	assert_eq!(reference, ChunkRef::Zero);
	assert!(reference.is_absent());
}

#[test]
fn packed_format_2_scales_by_eight() {
	// StpFormat=2: u16 * 8, CbFormat=2: u8 * 8.
	let bytes = [0x10, 0x00, 0x04];
	let mut cursor = Cursor::new(&bytes);
	let reference = ChunkRef::parse_packed(&mut cursor, 2, 2).expect("reference parses");
	assert_eq!(reference, ChunkRef::Span { stp: 0x80, cb: 0x20 });
}

#[test]
fn packed_format_0_is_u64_stp_u32_cb() {
	let mut bytes = Vec::new();
	bytes.extend_from_slice(&0x1234_u64.to_le_bytes());
	bytes.extend_from_slice(&0x56_u32.to_le_bytes());

	let mut cursor = Cursor::new(&bytes);
	let reference = ChunkRef::parse_packed(&mut cursor, 0, 0).expect("reference parses");
	assert_eq!(reference, ChunkRef::Span { stp: 0x1234, cb: 0x56 });
}

#[test]
fn byte_range_rejects_out_of_bounds_span() {
	let reference = ChunkRef::Span { stp: 0x100, cb: 0x20 };
	let err = reference.byte_range(0, 0x110).expect_err("span exceeds buffer");
	assert!(matches!(err, OneError::BadReference { stp: 0x100, cb: 0x20, .. }));

	let ok = reference.byte_range(0, 0x120).expect("span fits");
	assert_eq!(ok, Some((0x100, 0x20)));
}
