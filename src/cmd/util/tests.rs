use super::*;

#[test]
fn sha256_matches_known_vector() {
	assert_eq!(sha256_hex(b"abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}

#[test]
fn sanitizes_traversal_attempts() {
	assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
	assert_eq!(sanitize_file_name("..."), "unnamed");
	assert_eq!(sanitize_file_name("a.bin"), "a.bin");
}

#[test]
fn hex_preview_wraps_rows() {
	let preview = hex_preview(&[0xDE, 0xAD, 0xBE, 0xEF], 2, 16, "\t");
	assert_eq!(preview, "\tde ad\n\tbe ef\n");
}
