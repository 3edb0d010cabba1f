use super::*;

fn minimal_header(signature: &[u8; 16], root: &[u8; 12]) -> Vec<u8> {
	let mut bytes = vec![0_u8; HEADER_SIZE];
	bytes[..16].copy_from_slice(signature);
	// fcrTransactionLog at 0x0A0, fcrFileNodeListRoot at 0x0AC.
	bytes[0x0A0..0x0AC].fill(0xFF);
	bytes[0x0AC..0x0B8].copy_from_slice(root);
	bytes
}

#[test]
fn parses_one_header_with_nil_root() {
	let bytes = minimal_header(&ONE_FILE_TYPE, &[0xFF; 12]);
	let mut cursor = Cursor::new(&bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	assert_eq!(header.file_kind, FileKind::Section);
	assert!(header.fcr_file_node_list_root.is_absent());
	assert!(header.fcr_transaction_log.is_absent());
}

#[test]
fn parses_toc_header_with_root_span() {
	let mut root = [0_u8; 12];
	root[..8].copy_from_slice(&0x400_u64.to_le_bytes());
	root[8..].copy_from_slice(&0x100_u32.to_le_bytes());

	let bytes = minimal_header(&ONETOC2_FILE_TYPE, &root);
	let mut cursor = Cursor::new(&bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	assert_eq!(header.file_kind, FileKind::TableOfContents);
	assert_eq!(header.fcr_file_node_list_root, ChunkRef::Span { stp: 0x400, cb: 0x100 });
}

#[test]
fn rejects_unknown_signature() {
	let bytes = minimal_header(&[0xAB; 16], &[0xFF; 12]);
	let mut cursor = Cursor::new(&bytes);
	let err = Header::parse(&mut cursor).expect_err("bad signature should fail");
	assert!(matches!(err, OneError::BadSignature { .. }));
}

#[test]
fn rejects_short_header() {
	let bytes = ONE_FILE_TYPE.to_vec();
	let mut cursor = Cursor::new(&bytes);
	let err = Header::parse(&mut cursor).expect_err("short header should fail");
	assert!(matches!(err, OneError::Truncated { .. }));
}
