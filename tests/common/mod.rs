//! Builders assembling synthetic `.one` / `.onetoc2` byte streams for tests.
#![allow(dead_code)]

use onedoc::one::filedata::{STORE_FOOTER_GUID, STORE_HEADER_GUID};
use onedoc::one::list::{FRAGMENT_FOOTER_MAGIC, FRAGMENT_HEADER_MAGIC};
use onedoc::one::node::CHUNK_TERMINATOR_ID;
use onedoc::one::HEADER_SIZE;

/// GUID backing the single object space in scaffolded files.
pub const SPACE_GUID: [u8; 16] = [0x51; 16];

/// GUID backing the single revision in scaffolded files.
pub const REVISION_GUID: [u8; 16] = [0x52; 16];

/// Growable file image: 1024-byte header then appended regions.
pub struct OneBuilder {
	pub bytes: Vec<u8>,
}

impl OneBuilder {
	/// Header with the given signature; every chunk reference starts nil.
	pub fn new(signature: &[u8; 16]) -> Self {
		let mut bytes = vec![0_u8; HEADER_SIZE];
		bytes[..16].copy_from_slice(signature);
		// fcrHashedChunkList through fcrFreeChunkList, then the debug pair.
		bytes[0x094..0x0C4].fill(0xFF);
		bytes[0x100..0x118].fill(0xFF);
		Self { bytes }
	}

	/// Point fcrFileNodeListRoot at a region.
	pub fn set_root(&mut self, reference: (u64, u32)) {
		self.bytes[0x0AC..0x0B4].copy_from_slice(&reference.0.to_le_bytes());
		self.bytes[0x0B4..0x0B8].copy_from_slice(&reference.1.to_le_bytes());
	}

	/// Append raw bytes, returning their (stp, cb) span.
	pub fn append_blob(&mut self, blob: &[u8]) -> (u64, u32) {
		let start = self.bytes.len() as u64;
		self.bytes.extend_from_slice(blob);
		(start, blob.len() as u32)
	}

	/// Append a FileNodeListFragment holding `nodes` plus a terminator.
	pub fn append_fragment(&mut self, list_id: u32, nodes: &[Vec<u8>], next: Option<(u64, u32)>) -> (u64, u32) {
		let start = self.bytes.len();
		self.bytes.extend_from_slice(&FRAGMENT_HEADER_MAGIC.to_le_bytes());
		self.bytes.extend_from_slice(&list_id.to_le_bytes());
		self.bytes.extend_from_slice(&0_u32.to_le_bytes());
		for node in nodes {
			self.bytes.extend_from_slice(node);
		}
		self.bytes.extend_from_slice(&node_header(CHUNK_TERMINATOR_ID, 4, 0, 0, 0).to_le_bytes());
		match next {
			Some((stp, cb)) => {
				self.bytes.extend_from_slice(&stp.to_le_bytes());
				self.bytes.extend_from_slice(&cb.to_le_bytes());
			}
			None => self.bytes.extend_from_slice(&[0xFF; 12]),
		}
		self.bytes.extend_from_slice(&FRAGMENT_FOOTER_MAGIC.to_le_bytes());
		(start as u64, (self.bytes.len() - start) as u32)
	}
}

/// Pack a FileNode header dword.
pub fn node_header(id: u16, size: u32, stp_format: u8, cb_format: u8, base_type: u8) -> u32 {
	u32::from(id) | size << 10 | u32::from(stp_format) << 23 | u32::from(cb_format) << 25 | u32::from(base_type) << 27
}

/// Encode a node. References use StpFormat 1 (u32) and CbFormat 0 (u32).
pub fn node(id: u16, base_type: u8, reference: Option<(u64, u32)>, body: &[u8]) -> Vec<u8> {
	let ref_len = if reference.is_some() { 8 } else { 0 };
	let size = 4 + ref_len + body.len() as u32;
	let mut out = Vec::new();
	out.extend_from_slice(&node_header(id, size, 1, 0, base_type).to_le_bytes());
	if let Some((stp, cb)) = reference {
		out.extend_from_slice(&(stp as u32).to_le_bytes());
		out.extend_from_slice(&cb.to_le_bytes());
	}
	out.extend_from_slice(body);
	out
}

/// Encode an ExtendedGUID body.
pub fn extended_guid(guid: [u8; 16], n: u32) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&guid);
	out.extend_from_slice(&n.to_le_bytes());
	out
}

/// Encode UTF-16LE text.
pub fn utf16(text: &str) -> Vec<u8> {
	text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

/// Encode a StringInStorageBuffer.
pub fn storage_string(text: &str) -> Vec<u8> {
	let data = utf16(text);
	let mut out = Vec::new();
	out.extend_from_slice(&((data.len() / 2) as u32).to_le_bytes());
	out.extend_from_slice(&data);
	out
}

/// ObjectDeclaration2RefCountFND body (after the embedded reference).
pub fn declaration_body(compact_id: u32, jcid: u32) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&compact_id.to_le_bytes());
	out.extend_from_slice(&jcid.to_le_bytes());
	out.push(0); // no oid/osid reference flags
	out.push(1); // cRef
	out
}

/// ObjectDeclarationFileData3RefCountFND body.
pub fn file_data_declaration_body(compact_id: u32, jcid: u32, reference: &str, extension: &str) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&compact_id.to_le_bytes());
	out.extend_from_slice(&jcid.to_le_bytes());
	out.push(1); // cRef
	out.extend_from_slice(&storage_string(reference));
	out.extend_from_slice(&storage_string(extension));
	out
}

/// A property set builder over OIDs-stream ids and (id, payload) properties.
pub struct PropSetBuilder {
	oid_stream: Vec<u32>,
	properties: Vec<(u32, Vec<u8>)>,
}

impl PropSetBuilder {
	pub fn new() -> Self {
		Self {
			oid_stream: Vec::new(),
			properties: Vec::new(),
		}
	}

	/// Push a CompactID onto the OIDs stream.
	pub fn oid(mut self, compact_id: u32) -> Self {
		self.oid_stream.push(compact_id);
		self
	}

	/// A FourBytesOfLengthFollowedByData property carrying UTF-16 text.
	pub fn text(mut self, prop_id: u32, value: &str) -> Self {
		let data = utf16(value);
		let mut payload = Vec::new();
		payload.extend_from_slice(&(data.len() as u32).to_le_bytes());
		payload.extend_from_slice(&data);
		self.properties.push((prop_id, payload));
		self
	}

	/// An ObjectID property consuming the next OIDs-stream entry.
	pub fn object_id(mut self, prop_id: u32) -> Self {
		self.properties.push((prop_id, Vec::new()));
		self
	}

	/// A property with an explicit raw payload.
	pub fn raw(mut self, prop_id: u32, payload: &[u8]) -> Self {
		self.properties.push((prop_id, payload.to_vec()));
		self
	}

	/// Serialize the ObjectSpaceObjectPropSet.
	pub fn build(self) -> Vec<u8> {
		let mut out = Vec::new();
		// OIDs header: count, OsidStreamNotPresent, no extended streams.
		out.extend_from_slice(&(self.oid_stream.len() as u32 | 1 << 31).to_le_bytes());
		for id in &self.oid_stream {
			out.extend_from_slice(&id.to_le_bytes());
		}
		out.extend_from_slice(&(self.properties.len() as u16).to_le_bytes());
		for (prop_id, _) in &self.properties {
			out.extend_from_slice(&prop_id.to_le_bytes());
		}
		for (_, payload) in &self.properties {
			out.extend_from_slice(payload);
		}
		out
	}
}

/// A FileDataStoreObject wrapping `payload`.
pub fn store_object(payload: &[u8]) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&STORE_HEADER_GUID);
	out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
	out.extend_from_slice(&0_u32.to_le_bytes());
	out.extend_from_slice(&0_u64.to_le_bytes());
	out.extend_from_slice(payload);
	out.extend_from_slice(&STORE_FOOTER_GUID);
	out
}

/// Assemble a complete single-space, single-revision file.
///
/// `table` seeds the Global Identification Table; `declarations` are encoded
/// declaration nodes placed after it; `extra_root_nodes` land in the root
/// list after the object-space reference.
pub fn scaffold(
	builder: &mut OneBuilder,
	table: &[[u8; 16]],
	declarations: Vec<Vec<u8>>,
	extra_root_nodes: Vec<Vec<u8>>,
) {
	let mut revision_nodes = vec![
		node(0x014, 0, None, &{
			let mut body = extended_guid(SPACE_GUID, 1);
			body.extend_from_slice(&0_u32.to_le_bytes());
			body
		}),
		node(0x01E, 0, None, &{
			let mut body = extended_guid(REVISION_GUID, 1);
			body.extend_from_slice(&extended_guid([0; 16], 0));
			body.extend_from_slice(&1_u32.to_le_bytes()); // role
			body.extend_from_slice(&0_u16.to_le_bytes()); // odcsDefault
			body
		}),
		node(0x022, 0, None, &[]),
	];
	for (index, guid) in table.iter().enumerate() {
		let mut body = (index as u32).to_le_bytes().to_vec();
		body.extend_from_slice(guid);
		revision_nodes.push(node(0x024, 0, None, &body));
	}
	revision_nodes.push(node(0x028, 0, None, &[]));
	revision_nodes.extend(declarations);
	revision_nodes.push(node(0x01C, 0, None, &[]));

	let revision_list = builder.append_fragment(2, &revision_nodes, None);

	let space_nodes = vec![
		node(0x00C, 0, None, &extended_guid(SPACE_GUID, 1)),
		node(0x010, 2, Some(revision_list), &[]),
	];
	let space_list = builder.append_fragment(3, &space_nodes, None);

	let mut root_nodes = vec![
		node(0x004, 0, None, &extended_guid(SPACE_GUID, 1)),
		node(0x008, 2, Some(space_list), &extended_guid(SPACE_GUID, 1)),
	];
	root_nodes.extend(extra_root_nodes);
	let root_list = builder.append_fragment(1, &root_nodes, None);

	builder.set_root(root_list);
}
