use std::fmt;

use crate::one::bytes::Cursor;
use crate::one::Result;

/// 4-byte object-class identifier: a 16-bit index plus behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jcid {
	/// Raw 32-bit value.
	pub raw: u32,
}

impl Jcid {
	/// jcidSectionNode.
	pub const SECTION_NODE: u32 = 0x0006_0007;
	/// jcidPageNode.
	pub const PAGE_NODE: u32 = 0x0006_000B;
	/// jcidOutlineNode.
	pub const OUTLINE_NODE: u32 = 0x0006_000C;
	/// jcidRichTextOENode.
	pub const RICH_TEXT_OE_NODE: u32 = 0x0006_000E;
	/// jcidImageNode.
	pub const IMAGE_NODE: u32 = 0x0006_0011;
	/// jcidEmbeddedFileNode.
	pub const EMBEDDED_FILE_NODE: u32 = 0x0006_0035;

	/// Parse from the byte stream.
	pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self { raw: cursor.read_u32_le()? })
	}

	/// Class index (low 16 bits).
	pub fn index(&self) -> u16 {
		(self.raw & 0xFFFF) as u16
	}

	/// Object holds raw binary data.
	pub fn is_binary(&self) -> bool {
		self.raw >> 16 & 1 == 1
	}

	/// Object body is an ObjectSpaceObjectPropSet.
	pub fn is_property_set(&self) -> bool {
		self.raw >> 17 & 1 == 1
	}

	/// Object participates in the content graph.
	pub fn is_graph_node(&self) -> bool {
		self.raw >> 18 & 1 == 1
	}

	/// Object carries embedded file data.
	pub fn is_file_data(&self) -> bool {
		self.raw >> 19 & 1 == 1
	}

	/// Object is read-only.
	pub fn is_read_only(&self) -> bool {
		self.raw >> 20 & 1 == 1
	}

	/// Whether this class routes to the file-data extractor.
	pub fn bears_file_data(&self) -> bool {
		self.is_file_data() || matches!(self.raw, Self::EMBEDDED_FILE_NODE | Self::IMAGE_NODE)
	}

	/// Known class name, when this index appears in MS-ONE.
	pub fn name(&self) -> Option<&'static str> {
		let name = match self.raw {
			0x0012_0001 => "jcidReadOnlyPersistablePropertyContainerForAuthor",
			0x0002_0001 => "jcidPersistablePropertyContainerForTOC",
			Self::SECTION_NODE => "jcidSectionNode",
			0x0006_0008 => "jcidPageSeriesNode",
			Self::PAGE_NODE => "jcidPageNode",
			Self::OUTLINE_NODE => "jcidOutlineNode",
			0x0006_000D => "jcidOutlineElementNode",
			Self::RICH_TEXT_OE_NODE => "jcidRichTextOENode",
			Self::IMAGE_NODE => "jcidImageNode",
			0x0006_0012 => "jcidNumberListNode",
			0x0006_0019 => "jcidOutlineGroup",
			0x0006_0022 => "jcidTableNode",
			0x0006_0023 => "jcidTableRowNode",
			0x0006_0024 => "jcidTableCellNode",
			0x0006_002C => "jcidTitleNode",
			0x0002_0030 => "jcidPageMetaData",
			0x0002_0031 => "jcidSectionMetaData",
			Self::EMBEDDED_FILE_NODE => "jcidEmbeddedFileNode",
			0x0006_0037 => "jcidPageManifestNode",
			0x0002_0038 => "jcidConflictPageMetaData",
			0x0006_003C => "jcidVersionHistoryContent",
			0x0006_003D => "jcidVersionProxy",
			0x0012_0043 => "jcidNoteTagSharedDefinitionContainer",
			0x0002_0044 => "jcidRevisionMetaData",
			0x0002_0046 => "jcidVersionHistoryMetaData",
			0x0012_004D => "jcidParagraphStyleObject",
			_ => return None,
		};
		Some(name)
	}
}

impl fmt::Display for Jcid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.name() {
			Some(name) => f.write_str(name),
			None => write!(f, "jcid:{:#010x}", self.raw),
		}
	}
}
