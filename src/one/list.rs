use std::collections::HashSet;

use log::{debug, warn};

use crate::one::bytes::Cursor;
use crate::one::node::{FileNode, FileNodeHeader, NodeBody};
use crate::one::refs::ChunkRef;
use crate::one::{Diagnostic, OneError, Result};

/// Qword opening every FileNodeListFragment.
pub const FRAGMENT_HEADER_MAGIC: u64 = 0xA456_7AB1_F5F7_F4C4;

/// Qword closing every FileNodeListFragment.
pub const FRAGMENT_FOOTER_MAGIC: u64 = 0x8BC2_15C3_8233_BA4B;

/// Bytes trailing each fragment: 12-byte next-fragment reference + 8-byte footer.
const FRAGMENT_TAIL: usize = 20;

/// Fragment header: magic + list id + sequence number.
const FRAGMENT_HEADER: usize = 16;

/// Traversal limits for the FileNodeList walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
	/// Maximum nesting depth of BaseType=2 child lists.
	pub max_depth: u32,
	/// Maximum fragments chained per logical list.
	pub max_fragments: usize,
}

impl Default for WalkOptions {
	fn default() -> Self {
		Self {
			max_depth: 32,
			max_fragments: 4096,
		}
	}
}

/// One node in a walked list, with its child list when BaseType=2.
#[derive(Debug, Clone)]
pub struct WalkedNode {
	/// Absolute file offset of the node header.
	pub offset: usize,
	/// Decoded node record.
	pub node: FileNode,
	/// Child list reached through the embedded reference.
	pub children: Option<NodeList>,
}

/// A logical FileNodeList: all fragments concatenated, terminator excluded.
#[derive(Debug, Clone, Default)]
pub struct NodeList {
	/// List id from the first fragment header.
	pub list_id: u32,
	/// Nodes in document order.
	pub nodes: Vec<WalkedNode>,
	/// Number of fragments the list spanned.
	pub fragment_count: usize,
}

/// Walk the logical FileNodeList rooted at `reference`.
///
/// Node-level problems (bad size, reserved bit, unknown id, undecodable body)
/// are recorded as diagnostics and the walk continues; fragment-level problems
/// after the first fragment stop the chain but keep what was already read.
/// `at` names the record holding the reference, for error reporting.
pub fn walk_list(
	buf: &[u8],
	reference: ChunkRef,
	at: usize,
	options: &WalkOptions,
	diagnostics: &mut Vec<Diagnostic>,
) -> Result<NodeList> {
	walk_list_at_depth(buf, reference, at, 0, options, diagnostics)
}

fn walk_list_at_depth(
	buf: &[u8],
	reference: ChunkRef,
	at: usize,
	depth: u32,
	options: &WalkOptions,
	diagnostics: &mut Vec<Diagnostic>,
) -> Result<NodeList> {
	if depth >= options.max_depth {
		return Err(OneError::DepthExceeded { max: options.max_depth });
	}

	let Some((start, len)) = reference.byte_range(at, buf.len())? else {
		return Ok(NodeList::default());
	};

	let mut list = NodeList::default();
	let mut visited = HashSet::new();
	let mut fragment = (start, len);

	loop {
		let (frag_start, frag_len) = fragment;
		if !visited.insert(frag_start) || list.fragment_count >= options.max_fragments {
			let err = OneError::CyclicOrDeepList { at: frag_start };
			warn!("stopping fragment chain: {err}");
			diagnostics.push(Diagnostic::new(frag_start, &err));
			break;
		}

		let next = match read_fragment(buf, frag_start, frag_len, depth, options, &mut list, diagnostics) {
			Ok(next) => next,
			Err(err) if list.fragment_count == 0 => return Err(err),
			Err(err) => {
				diagnostics.push(Diagnostic::new(frag_start, &err));
				break;
			}
		};
		list.fragment_count += 1;

		match next.span() {
			Some((stp, cb)) => fragment = (stp as usize, cb as usize),
			None => break,
		}
	}

	debug!("walked list {:#010x}: {} nodes over {} fragments", list.list_id, list.nodes.len(), list.fragment_count);
	Ok(list)
}

fn read_fragment(
	buf: &[u8],
	start: usize,
	len: usize,
	depth: u32,
	options: &WalkOptions,
	list: &mut NodeList,
	diagnostics: &mut Vec<Diagnostic>,
) -> Result<ChunkRef> {
	if len < FRAGMENT_HEADER + FRAGMENT_TAIL {
		return Err(OneError::Truncated {
			at: start,
			need: FRAGMENT_HEADER + FRAGMENT_TAIL,
			rem: len,
		});
	}
	let end = start.checked_add(len).filter(|end| *end <= buf.len()).ok_or(OneError::BadReference {
		at: start,
		stp: start as u64,
		cb: len as u64,
		len: buf.len(),
	})?;

	let mut cursor = Cursor::new(&buf[..end]);
	cursor.seek(start)?;

	let magic = cursor.read_u64_le()?;
	if magic != FRAGMENT_HEADER_MAGIC {
		return Err(OneError::BadMagic {
			at: start,
			expected: FRAGMENT_HEADER_MAGIC,
			got: magic,
		});
	}
	let list_id = cursor.read_u32_le()?;
	let _fragment_sequence = cursor.read_u32_le()?;
	if list.fragment_count == 0 {
		list.list_id = list_id;
	}

	let nodes_end = end - FRAGMENT_TAIL;
	while cursor.pos() + 4 <= nodes_end {
		let offset = cursor.pos();
		let mut raw = [0_u8; 4];
		raw.copy_from_slice(&buf[offset..offset + 4]);
		let header = FileNodeHeader::from_u32(u32::from_le_bytes(raw));

		// Zero ids mark the start of fragment padding.
		if header.id == 0 {
			break;
		}
		if header.is_terminator() {
			break;
		}

		if header.reserved {
			diagnostics.push(Diagnostic::new(offset, &OneError::ReservedBitSet { at: offset }));
		}

		let size = header.size as usize;
		if size < 4 || offset + size > nodes_end {
			let err = OneError::BadNodeSize { at: offset, size: header.size };
			warn!("abandoning fragment at {offset}: {err}");
			diagnostics.push(Diagnostic::new(offset, &err));
			break;
		}

		let mut node_cursor = Cursor::new(&buf[..offset + size]);
		node_cursor.seek(offset)?;
		match FileNode::parse(&mut node_cursor) {
			Ok(node) => {
				if let NodeBody::Unknown { id } = node.body {
					diagnostics.push(Diagnostic::new(offset, &OneError::UnknownNodeId { at: offset, id }));
				}

				let children = match (node.header.base_type, node.reference) {
					(2, Some(reference)) if !reference.is_absent() => {
						match walk_list_at_depth(buf, reference, offset, depth + 1, options, diagnostics) {
							Ok(child) => Some(child),
							Err(err) => {
								diagnostics.push(Diagnostic::new(offset, &err));
								None
							}
						}
					}
					_ => None,
				};

				list.nodes.push(WalkedNode { offset, node, children });
			}
			Err(err) => {
				diagnostics.push(Diagnostic::new(offset, &err));
			}
		}

		cursor.seek(offset + size)?;
	}

	cursor.seek(nodes_end)?;
	let next = ChunkRef::parse_64x32(&mut cursor)?;
	let footer = cursor.read_u64_le()?;
	if footer != FRAGMENT_FOOTER_MAGIC {
		let err = OneError::BadMagic {
			at: end - 8,
			expected: FRAGMENT_FOOTER_MAGIC,
			got: footer,
		};
		diagnostics.push(Diagnostic::new(end - 8, &err));
		return Ok(ChunkRef::Nil);
	}

	Ok(next)
}

#[cfg(test)]
mod tests;
