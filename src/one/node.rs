use uuid::Uuid;

use crate::one::bytes::Cursor;
use crate::one::guid::{CompactId, ExtendedGuid};
use crate::one::jcid::Jcid;
use crate::one::refs::ChunkRef;
use crate::one::{OneError, Result};

/// FileNodeID of the fragment-terminating ChunkTerminatorFND.
pub const CHUNK_TERMINATOR_ID: u16 = 0x0FF;

/// Bit-unpacked 32-bit FileNode header.
#[derive(Debug, Clone, Copy)]
pub struct FileNodeHeader {
	/// 10-bit node type id.
	pub id: u16,
	/// Total node length in bytes, header included.
	pub size: u32,
	/// Pointer encoding selector for an embedded reference.
	pub stp_format: u8,
	/// Length encoding selector for an embedded reference.
	pub cb_format: u8,
	/// 0 = no reference, 1 = data reference, 2 = FileNodeList reference.
	pub base_type: u8,
	/// Reserved bit (must be 0).
	pub reserved: bool,
}

impl FileNodeHeader {
	/// Unpack from the raw header dword.
	pub fn from_u32(raw: u32) -> Self {
		Self {
			id: (raw & 0x3FF) as u16,
			size: raw >> 10 & 0x1FFF,
			stp_format: (raw >> 23 & 0x3) as u8,
			cb_format: (raw >> 25 & 0x3) as u8,
			base_type: (raw >> 27 & 0xF) as u8,
			reserved: raw >> 31 == 1,
		}
	}

	/// Parse from the byte stream.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self::from_u32(cursor.read_u32_le()?))
	}

	/// Whether this node terminates its fragment.
	pub fn is_terminator(&self) -> bool {
		self.id == CHUNK_TERMINATOR_ID
	}
}

/// One decoded FileNode record: header, optional embedded reference, typed body.
#[derive(Debug, Clone)]
pub struct FileNode {
	pub header: FileNodeHeader,
	/// Embedded chunk reference, present when BaseType is 1 or 2.
	pub reference: Option<ChunkRef>,
	pub body: NodeBody,
}

impl FileNode {
	/// Parse a node at the cursor position. The cursor must be bounded to the
	/// node's declared window; the caller advances past the node afterwards.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		let header = FileNodeHeader::parse(cursor)?;
		let reference = match header.base_type {
			1 | 2 => Some(ChunkRef::parse_packed(cursor, header.stp_format, header.cb_format)?),
			_ => None,
		};
		let body = NodeBody::parse(cursor, &header)?;
		Ok(Self { header, reference, body })
	}
}

/// Typed FileNode bodies.
///
/// Node types the object layer has no use for decode to `Unparsed`; ids
/// outside the known set decode to `Unknown` and are reported as diagnostics
/// by the walker. Both are skipped via the header's Size.
#[derive(Debug, Clone)]
pub enum NodeBody {
	ObjectSpaceManifestRoot {
		gosid_root: ExtendedGuid,
	},
	ObjectSpaceManifestListReference {
		gosid: ExtendedGuid,
	},
	ObjectSpaceManifestListStart {
		gosid: ExtendedGuid,
	},
	RevisionManifestListReference,
	RevisionManifestListStart {
		gosid: ExtendedGuid,
	},
	RevisionManifestStart {
		rid: ExtendedGuid,
		rid_dependent: ExtendedGuid,
		revision_role: u32,
		/// Context the revision belongs to (RevisionManifestStart7FND only).
		gctxid: Option<ExtendedGuid>,
	},
	RevisionManifestEnd,
	GlobalIdTableStart,
	GlobalIdTableEntry {
		index: u32,
		guid: Uuid,
	},
	GlobalIdTableEnd,
	ObjectDeclaration2 {
		oid: CompactId,
		jcid: Jcid,
		has_oid_references: bool,
		has_osid_references: bool,
		ref_count: u32,
		/// MD5 of the object data, carried by the read-only declaration forms.
		read_only_hash: Option<[u8; 16]>,
	},
	ObjectDeclarationFileData3 {
		oid: CompactId,
		jcid: Jcid,
		ref_count: u32,
		/// `<file>`, `<ifndf>{guid}`, or `<invfdo>` per MS-ONESTORE.
		file_data_reference: String,
		extension: String,
	},
	ObjectGroupListReference {
		group_id: ExtendedGuid,
	},
	ObjectGroupStart {
		oid: ExtendedGuid,
	},
	ObjectGroupEnd,
	RootObjectReference2 {
		oid_root: CompactId,
		root_role: u32,
	},
	RootObjectReference3 {
		oid_root: ExtendedGuid,
		root_role: u32,
	},
	RevisionRoleDeclaration {
		rid: ExtendedGuid,
		revision_role: u32,
		gctxid: Option<ExtendedGuid>,
	},
	DataSignatureGroupDefinition {
		signature: ExtendedGuid,
	},
	ObjectInfoDependencyOverrides,
	FileDataStoreListReference,
	FileDataStoreObjectReference {
		guid_reference: Uuid,
	},
	ChunkTerminator,
	/// Known id whose body carries nothing the entity tree needs.
	Unparsed {
		id: u16,
	},
	/// Id outside the known set.
	Unknown {
		id: u16,
	},
}

impl NodeBody {
	fn parse(cursor: &mut Cursor<'_>, header: &FileNodeHeader) -> Result<Self> {
		let body = match header.id {
			0x004 => Self::ObjectSpaceManifestRoot {
				gosid_root: ExtendedGuid::parse(cursor)?,
			},
			0x008 => Self::ObjectSpaceManifestListReference {
				gosid: ExtendedGuid::parse(cursor)?,
			},
			0x00C => Self::ObjectSpaceManifestListStart {
				gosid: ExtendedGuid::parse(cursor)?,
			},
			0x010 => Self::RevisionManifestListReference,
			0x014 => {
				let gosid = ExtendedGuid::parse(cursor)?;
				let _n_instance = cursor.read_u32_le()?;
				Self::RevisionManifestListStart { gosid }
			}
			0x01B => {
				let rid = ExtendedGuid::parse(cursor)?;
				let rid_dependent = ExtendedGuid::parse(cursor)?;
				let _time_creation = cursor.read_u64_le()?;
				let revision_role = cursor.read_u32_le()?;
				let _odcs_default = cursor.read_u16_le()?;
				Self::RevisionManifestStart {
					rid,
					rid_dependent,
					revision_role,
					gctxid: None,
				}
			}
			0x01C => Self::RevisionManifestEnd,
			0x01E | 0x01F => {
				let rid = ExtendedGuid::parse(cursor)?;
				let rid_dependent = ExtendedGuid::parse(cursor)?;
				let revision_role = cursor.read_u32_le()?;
				let _odcs_default = cursor.read_u16_le()?;
				let gctxid = if header.id == 0x01F { Some(ExtendedGuid::parse(cursor)?) } else { None };
				Self::RevisionManifestStart {
					rid,
					rid_dependent,
					revision_role,
					gctxid,
				}
			}
			0x021 | 0x022 => Self::GlobalIdTableStart,
			0x024 => Self::GlobalIdTableEntry {
				index: cursor.read_u32_le()?,
				guid: cursor.read_guid()?,
			},
			0x028 => Self::GlobalIdTableEnd,
			0x0A4 | 0x0A5 | 0x0C4 | 0x0C5 => {
				let oid = CompactId::parse(cursor)?;
				let jcid = Jcid::parse(cursor)?;
				let flags = cursor.read_u8()?;
				let ref_count = if matches!(header.id, 0x0A5 | 0x0C5) {
					cursor.read_u32_le()?
				} else {
					u32::from(cursor.read_u8()?)
				};
				let read_only_hash = if matches!(header.id, 0x0C4 | 0x0C5) {
					let mut hash = [0_u8; 16];
					hash.copy_from_slice(cursor.read_exact(16)?);
					Some(hash)
				} else {
					None
				};
				Self::ObjectDeclaration2 {
					oid,
					jcid,
					has_oid_references: flags & 0x1 != 0,
					has_osid_references: flags & 0x2 != 0,
					ref_count,
					read_only_hash,
				}
			}
			0x072 | 0x073 => {
				let oid = CompactId::parse(cursor)?;
				let jcid = Jcid::parse(cursor)?;
				let ref_count = if header.id == 0x073 {
					cursor.read_u32_le()?
				} else {
					u32::from(cursor.read_u8()?)
				};
				let file_data_reference = read_storage_string(cursor)?;
				let extension = read_storage_string(cursor)?;
				Self::ObjectDeclarationFileData3 {
					oid,
					jcid,
					ref_count,
					file_data_reference,
					extension,
				}
			}
			0x0B0 => Self::ObjectGroupListReference {
				group_id: ExtendedGuid::parse(cursor)?,
			},
			0x0B4 => Self::ObjectGroupStart {
				oid: ExtendedGuid::parse(cursor)?,
			},
			0x0B8 => Self::ObjectGroupEnd,
			0x059 => Self::RootObjectReference2 {
				oid_root: CompactId::parse(cursor)?,
				root_role: cursor.read_u32_le()?,
			},
			0x05A => Self::RootObjectReference3 {
				oid_root: ExtendedGuid::parse(cursor)?,
				root_role: cursor.read_u32_le()?,
			},
			0x05C | 0x05D => {
				let rid = ExtendedGuid::parse(cursor)?;
				let revision_role = cursor.read_u32_le()?;
				let gctxid = if header.id == 0x05D { Some(ExtendedGuid::parse(cursor)?) } else { None };
				Self::RevisionRoleDeclaration { rid, revision_role, gctxid }
			}
			0x08C => Self::DataSignatureGroupDefinition {
				signature: ExtendedGuid::parse(cursor)?,
			},
			0x084 => Self::ObjectInfoDependencyOverrides,
			0x090 => Self::FileDataStoreListReference,
			0x094 => Self::FileDataStoreObjectReference {
				guid_reference: cursor.read_guid()?,
			},
			CHUNK_TERMINATOR_ID => Self::ChunkTerminator,
			// Legacy declaration/revision forms, encryption keys, hashed chunk
			// descriptors, id-table remap entries.
			0x025 | 0x026 | 0x02D | 0x02E | 0x041 | 0x042 | 0x07C | 0x0C2 => Self::Unparsed { id: header.id },
			id => Self::Unknown { id },
		};
		Ok(body)
	}
}

/// Read a StringInStorageBuffer: a UTF-16 code-unit count then the text.
fn read_storage_string(cursor: &mut Cursor<'_>) -> Result<String> {
	let cch = cursor.read_u32_le()?;
	let byte_len = (cch as usize).checked_mul(2).ok_or(OneError::Truncated {
		at: cursor.pos(),
		need: usize::MAX,
		rem: cursor.remaining(),
	})?;
	let raw = cursor.read_exact(byte_len)?;
	Ok(crate::one::props::utf16_lossy(raw))
}
