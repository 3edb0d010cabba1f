use super::*;
use crate::one::node::CHUNK_TERMINATOR_ID;

fn pack_header(id: u16, size: u32, base: u8) -> u32 {
	u32::from(id) | size << 10 | u32::from(base) << 27
}

/// Append a fragment holding `nodes` plus terminator, returning its reference.
fn push_fragment(buf: &mut Vec<u8>, nodes: &[Vec<u8>], next: Option<(u64, u32)>) -> ChunkRef {
	let start = buf.len();
	buf.extend_from_slice(&FRAGMENT_HEADER_MAGIC.to_le_bytes());
	buf.extend_from_slice(&0x10_u32.to_le_bytes()); // list id
	buf.extend_from_slice(&0_u32.to_le_bytes()); // sequence
	for node in nodes {
		buf.extend_from_slice(node);
	}
	buf.extend_from_slice(&pack_header(CHUNK_TERMINATOR_ID, 4, 0).to_le_bytes());
	match next {
		Some((stp, cb)) => {
			buf.extend_from_slice(&stp.to_le_bytes());
			buf.extend_from_slice(&cb.to_le_bytes());
		}
		None => buf.extend_from_slice(&[0xFF; 12]),
	}
	buf.extend_from_slice(&FRAGMENT_FOOTER_MAGIC.to_le_bytes());
	ChunkRef::Span {
		stp: start as u64,
		cb: (buf.len() - start) as u64,
	}
}

fn simple_node(id: u16, body: &[u8]) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&pack_header(id, 4 + body.len() as u32, 0).to_le_bytes());
	out.extend_from_slice(body);
	out
}

#[test]
fn terminator_only_fragment_yields_empty_list() {
	let mut buf = Vec::new();
	let reference = push_fragment(&mut buf, &[], None);

	let mut diagnostics = Vec::new();
	let list = walk_list(&buf, reference, 0, &WalkOptions::default(), &mut diagnostics).expect("walk succeeds");
	assert!(list.nodes.is_empty());
	assert_eq!(list.fragment_count, 1);
	assert!(diagnostics.is_empty());
}

#[test]
fn chains_fragments_through_next_reference() {
	let mut buf = Vec::new();
	// Second fragment first so its offset is known when building the first.
	let second = push_fragment(&mut buf, &[simple_node(0x01C, &[])], None);
	let (stp, cb) = second.span().expect("span");
	let first = push_fragment(&mut buf, &[simple_node(0x01C, &[])], Some((stp, cb as u32)));

	let mut diagnostics = Vec::new();
	let list = walk_list(&buf, first, 0, &WalkOptions::default(), &mut diagnostics).expect("walk succeeds");
	assert_eq!(list.fragment_count, 2);
	assert_eq!(list.nodes.len(), 2);
	assert!(diagnostics.is_empty());
}

#[test]
fn unknown_node_id_is_skipped_with_diagnostic() {
	let mut buf = Vec::new();
	let nodes = vec![simple_node(0x3F3, &[1, 2, 3, 4]), simple_node(0x01C, &[])];
	let reference = push_fragment(&mut buf, &nodes, None);

	let mut diagnostics = Vec::new();
	let list = walk_list(&buf, reference, 0, &WalkOptions::default(), &mut diagnostics).expect("walk succeeds");
	assert_eq!(list.nodes.len(), 2, "unknown node kept, known node follows");
	assert_eq!(diagnostics.len(), 1);
	assert!(diagnostics[0].message.contains("unknown file node id"));
}

#[test]
fn undersized_node_aborts_fragment_with_diagnostic() {
	let mut buf = Vec::new();
	let bad = pack_header(0x01C, 3, 0).to_le_bytes().to_vec();
	let reference = push_fragment(&mut buf, &[bad], None);

	let mut diagnostics = Vec::new();
	let list = walk_list(&buf, reference, 0, &WalkOptions::default(), &mut diagnostics).expect("walk succeeds");
	assert!(list.nodes.is_empty());
	assert_eq!(diagnostics.len(), 1);
	assert!(diagnostics[0].message.contains("bad file node size"));
}

#[test]
fn cyclic_fragment_chain_is_stopped() {
	let mut buf = Vec::new();
	let reference = push_fragment(&mut buf, &[], Some((0, 0)));
	// Patch the next-fragment reference to point back at the fragment itself.
	let (stp, cb) = reference.span().expect("span");
	let tail = stp as usize + cb as usize - 20;
	buf[tail..tail + 8].copy_from_slice(&stp.to_le_bytes());
	buf[tail + 8..tail + 12].copy_from_slice(&(cb as u32).to_le_bytes());

	let mut diagnostics = Vec::new();
	let list = walk_list(&buf, reference, 0, &WalkOptions::default(), &mut diagnostics).expect("walk succeeds");
	assert_eq!(list.fragment_count, 1);
	assert_eq!(diagnostics.len(), 1);
	assert!(diagnostics[0].message.contains("cyclic or over-long"));
}

#[test]
fn bad_footer_magic_stops_chaining_with_diagnostic() {
	let mut buf = Vec::new();
	let reference = push_fragment(&mut buf, &[], None);
	let last = buf.len();
	buf[last - 8..].copy_from_slice(&0xDEAD_BEEF_u64.to_le_bytes());

	let mut diagnostics = Vec::new();
	let list = walk_list(&buf, reference, 0, &WalkOptions::default(), &mut diagnostics).expect("walk succeeds");
	assert_eq!(list.fragment_count, 1);
	assert_eq!(diagnostics.len(), 1);
	assert!(diagnostics[0].message.contains("bad fragment magic"));
}
