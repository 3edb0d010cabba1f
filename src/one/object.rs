use log::debug;
use uuid::Uuid;

use crate::one::guid::{CompactId, ExtendedGuid, GlobalIdTable};
use crate::one::jcid::Jcid;
use crate::one::list::NodeList;
use crate::one::node::NodeBody;
use crate::one::props::{decode_prop_set, DecodeOptions, PropSet};
use crate::one::refs::ChunkRef;
use crate::one::{filedata, Diagnostic};

/// A named scope of revisions and object declarations.
#[derive(Debug, Clone)]
pub struct ObjectSpace<'a> {
	/// Space identity (gosid).
	pub gosid: ExtendedGuid,
	/// Context the space belongs to, when declared.
	pub context: Option<ExtendedGuid>,
	/// Revisions in document order; the last one is current.
	pub revisions: Vec<Revision<'a>>,
}

impl<'a> ObjectSpace<'a> {
	/// The most recent revision, the only one surfaced downstream.
	pub fn current_revision(&self) -> Option<&Revision<'a>> {
		self.revisions.last()
	}
}

/// One versioned snapshot of an object space's declarations.
#[derive(Debug, Clone)]
pub struct Revision<'a> {
	pub rid: ExtendedGuid,
	pub role: u32,
	pub objects: Vec<ObjectEntry<'a>>,
}

/// One object declaration, with its decoded property set when it has one.
#[derive(Debug, Clone)]
pub struct ObjectEntry<'a> {
	/// File offset of the declaring node.
	pub offset: usize,
	/// Resolved identity; `None` when the CompactID could not be resolved.
	pub oid: Option<ExtendedGuid>,
	pub jcid: Jcid,
	pub props: Option<PropSet<'a>>,
	/// File-data binding for ObjectDeclarationFileData3 declarations.
	pub file_data: Option<FileDataBinding>,
}

/// The `<ifndf>{guid}` reference and extension of a file-data declaration.
#[derive(Debug, Clone)]
pub struct FileDataBinding {
	pub reference: String,
	pub extension: String,
}

impl FileDataBinding {
	/// Store GUID named by an `<ifndf>{...}` reference.
	pub fn store_guid(&self) -> Option<Uuid> {
		let inner = self.reference.strip_prefix("<ifndf>")?.trim();
		Uuid::parse_str(inner.trim_start_matches('{').trim_end_matches('}')).ok()
	}
}

/// One FileDataStoreObject reference: its GUID key and validated payload.
#[derive(Debug, Clone)]
pub struct StoreEntry<'a> {
	pub offset: usize,
	pub guid: Uuid,
	/// `None` when the store object failed validation.
	pub payload: Option<&'a [u8]>,
}

/// Everything the object-space layer produces from one walked tree.
#[derive(Debug, Clone, Default)]
pub struct Assembly<'a> {
	/// Root object space named by the manifest root node.
	pub root_gosid: Option<ExtendedGuid>,
	pub spaces: Vec<ObjectSpace<'a>>,
	pub stores: Vec<StoreEntry<'a>>,
}

/// Assemble object spaces, revisions, and declarations from the walked tree.
///
/// Maintains the per-revision Global Identification Table so every CompactID
/// is resolved against the entries that precede it in document order.
pub fn assemble<'a>(buf: &'a [u8], root: &NodeList, options: &DecodeOptions, diagnostics: &mut Vec<Diagnostic>) -> Assembly<'a> {
	let mut assembler = Assembler {
		buf,
		options,
		diagnostics,
		table: GlobalIdTable::new(),
		out: Assembly::default(),
	};
	assembler.collect(root);
	debug!(
		"assembled {} object spaces, {} store entries",
		assembler.out.spaces.len(),
		assembler.out.stores.len()
	);
	assembler.out
}

struct Assembler<'a, 'b> {
	buf: &'a [u8],
	options: &'b DecodeOptions,
	diagnostics: &'b mut Vec<Diagnostic>,
	table: GlobalIdTable,
	out: Assembly<'a>,
}

impl<'a> Assembler<'a, '_> {
	fn collect(&mut self, list: &NodeList) {
		for walked in &list.nodes {
			let offset = walked.offset;
			match &walked.node.body {
				NodeBody::ObjectSpaceManifestRoot { gosid_root } => {
					self.out.root_gosid = Some(*gosid_root);
				}
				NodeBody::ObjectSpaceManifestListStart { gosid } => {
					self.out.spaces.push(ObjectSpace {
						gosid: *gosid,
						context: None,
						revisions: Vec::new(),
					});
				}
				NodeBody::RevisionManifestStart {
					rid,
					revision_role,
					gctxid,
					..
				} => {
					self.table.clear();
					let rid = *rid;
					let role = *revision_role;
					let gctxid = *gctxid;
					let space = self.ensure_space(offset);
					space.revisions.push(Revision {
						rid,
						role,
						objects: Vec::new(),
					});
					if gctxid.is_some() {
						space.context = gctxid;
					}
				}
				NodeBody::RevisionRoleDeclaration { gctxid: Some(ctx), .. } => {
					let ctx = *ctx;
					let space = self.ensure_space(offset);
					if space.context.is_none() {
						space.context = Some(ctx);
					}
				}
				NodeBody::GlobalIdTableStart => self.table.clear(),
				NodeBody::GlobalIdTableEntry { index, guid } => self.table.insert(*index, *guid),
				NodeBody::ObjectDeclaration2 { oid, jcid, .. } => {
					let oid = self.resolve(offset, *oid);
					let jcid = *jcid;
					let props = if jcid.is_property_set() {
						self.decode_declaration_props(offset, walked.node.reference)
					} else {
						None
					};
					self.ensure_revision(offset).objects.push(ObjectEntry {
						offset,
						oid,
						jcid,
						props,
						file_data: None,
					});
				}
				NodeBody::ObjectDeclarationFileData3 {
					oid,
					jcid,
					file_data_reference,
					extension,
					..
				} => {
					let oid = self.resolve(offset, *oid);
					let jcid = *jcid;
					let binding = FileDataBinding {
						reference: file_data_reference.clone(),
						extension: extension.clone(),
					};
					self.ensure_revision(offset).objects.push(ObjectEntry {
						offset,
						oid,
						jcid,
						props: None,
						file_data: Some(binding),
					});
				}
				NodeBody::FileDataStoreObjectReference { guid_reference } => {
					let reference = walked.node.reference.unwrap_or(ChunkRef::Nil);
					let payload = match filedata::read_store_object(self.buf, reference, offset) {
						Ok(object) => Some(object.payload),
						Err(err) => {
							self.diagnostics.push(Diagnostic::new(offset, &err));
							None
						}
					};
					self.out.stores.push(StoreEntry {
						offset,
						guid: *guid_reference,
						payload,
					});
				}
				_ => {}
			}

			if let Some(children) = &walked.children {
				self.collect(children);
			}
		}
	}

	fn resolve(&mut self, offset: usize, id: CompactId) -> Option<ExtendedGuid> {
		match self.table.resolve(id) {
			Ok(resolved) => Some(resolved),
			Err(err) => {
				self.diagnostics.push(Diagnostic::new(offset, &err));
				None
			}
		}
	}

	fn decode_declaration_props(&mut self, offset: usize, reference: Option<ChunkRef>) -> Option<PropSet<'a>> {
		let range = match reference {
			Some(reference) => match reference.byte_range(offset, self.buf.len()) {
				Ok(range) => range,
				Err(err) => {
					self.diagnostics.push(Diagnostic::new(offset, &err));
					return None;
				}
			},
			None => None,
		}?;

		match decode_prop_set(self.buf, range, &self.table, self.options, self.diagnostics) {
			Ok(set) => Some(set),
			Err(err) => {
				self.diagnostics.push(Diagnostic::new(offset, &err));
				None
			}
		}
	}

	fn ensure_space(&mut self, offset: usize) -> &mut ObjectSpace<'a> {
		if self.out.spaces.is_empty() {
			self.diagnostics.push(Diagnostic::note(offset, "revision data outside any object space manifest"));
			self.out.spaces.push(ObjectSpace {
				gosid: ExtendedGuid {
					guid: Uuid::nil(),
					n: 0,
				},
				context: None,
				revisions: Vec::new(),
			});
		}
		let last = self.out.spaces.len() - 1;
		&mut self.out.spaces[last]
	}

	fn ensure_revision(&mut self, offset: usize) -> &mut Revision<'a> {
		if self.out.spaces.last().map_or(true, |space| space.revisions.is_empty()) {
			self.diagnostics.push(Diagnostic::note(offset, "object declaration outside any revision manifest"));
			let space = self.ensure_space(offset);
			space.revisions.push(Revision {
				rid: ExtendedGuid {
					guid: Uuid::nil(),
					n: 0,
				},
				role: 0,
				objects: Vec::new(),
			});
		}
		let space = self.out.spaces.len() - 1;
		let revision = self.out.spaces[space].revisions.len() - 1;
		&mut self.out.spaces[space].revisions[revision]
	}
}
