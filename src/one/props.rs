use crate::one::bytes::Cursor;
use crate::one::guid::{CompactId, ExtendedGuid, GlobalIdTable};
use crate::one::{Diagnostic, OneError, Result};

/// Runtime limits for property-set decoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
	/// Maximum nested PropertySet depth.
	pub max_depth: u32,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self { max_depth: 16 }
	}
}

/// A decoded ObjectSpaceObjectPropSet.
#[derive(Debug, Clone, PartialEq)]
pub struct PropSet<'a> {
	/// Absolute file offset the set was decoded from.
	pub offset: usize,
	/// The root property set body.
	pub body: PropertySet<'a>,
}

/// Ordered bag of typed properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet<'a> {
	pub entries: Vec<PropertyEntry<'a>>,
}

impl<'a> PropertySet<'a> {
	/// First value carried by property id `raw` (ignoring the type-tag bits).
	pub fn get(&self, raw: u32) -> Option<&PropertyValue<'a>> {
		let want = raw & 0x03FF_FFFF;
		self.entries.iter().find(|entry| entry.id.id() == want).map(|entry| &entry.value)
	}
}

/// One property: its wire id and decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry<'a> {
	pub id: PropertyId,
	pub value: PropertyValue<'a>,
}

/// 32-bit property id: name in the low 26 bits, type tag in bits 26-30,
/// boolean payload in bit 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyId {
	pub raw: u32,
}

impl PropertyId {
	/// Property name bits.
	pub fn id(&self) -> u32 {
		self.raw & 0x03FF_FFFF
	}

	/// Physical-encoding selector.
	pub fn tag(&self) -> u8 {
		(self.raw >> 26 & 0x1F) as u8
	}

	/// Boolean payload carried in the id itself.
	pub fn bool_value(&self) -> bool {
		self.raw >> 31 == 1
	}

	/// Known property name, when the id appears in MS-ONE.
	///
	/// Bit 31 is masked off so true-valued Bool properties still resolve.
	pub fn name(&self) -> Option<&'static str> {
		property_name(self.raw & 0x7FFF_FFFF)
	}
}

/// Decoded property value, one variant per physical encoding.
///
/// ID-family values are resolved through the Global Identification Table at
/// decode time, so they carry full identities rather than table indices.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<'a> {
	/// NoData.
	Empty,
	/// Bool carried in the property id.
	Bool(bool),
	U8(u8),
	U16(u16),
	U32(u32),
	U64(u64),
	/// FourBytesOfLengthFollowedByData, borrowed from the file buffer.
	Blob(&'a [u8]),
	ObjectId(ExtendedGuid),
	ObjectIds(Vec<ExtendedGuid>),
	ObjectSpaceId(ExtendedGuid),
	ObjectSpaceIds(Vec<ExtendedGuid>),
	ContextId(ExtendedGuid),
	ContextIds(Vec<ExtendedGuid>),
	PropertySet(PropertySet<'a>),
	/// ArrayOfPropertyValues.
	PropertySets(Vec<PropertySet<'a>>),
}

impl<'a> PropertyValue<'a> {
	/// Blob payload decoded as UTF-16 text, when this is a blob.
	pub fn as_text(&self) -> Option<String> {
		match self {
			Self::Blob(raw) => Some(utf16_lossy(raw)),
			_ => None,
		}
	}

	/// Single object identity, when this is an ObjectID value.
	pub fn as_object_id(&self) -> Option<ExtendedGuid> {
		match self {
			Self::ObjectId(id) => Some(*id),
			Self::ObjectIds(ids) => ids.first().copied(),
			_ => None,
		}
	}
}

/// Positional cursor over one CompactID stream.
///
/// Properties consume entries strictly in order; random access is deliberately
/// not offered.
struct IdStream {
	label: &'static str,
	ids: Vec<ExtendedGuid>,
	head: usize,
}

impl IdStream {
	fn absent(label: &'static str) -> Self {
		Self {
			label,
			ids: Vec::new(),
			head: 0,
		}
	}

	fn take_one(&mut self, at: usize) -> Result<ExtendedGuid> {
		let id = self.ids.get(self.head).copied().ok_or(OneError::PropertyStreamExhausted { stream: self.label, at })?;
		self.head += 1;
		Ok(id)
	}

	fn take_n(&mut self, at: usize, n: usize) -> Result<Vec<ExtendedGuid>> {
		if n > self.ids.len() - self.head {
			return Err(OneError::PropertyStreamExhausted { stream: self.label, at });
		}
		let mut out = Vec::with_capacity(n);
		for _ in 0..n {
			out.push(self.take_one(at)?);
		}
		Ok(out)
	}

	fn fully_consumed(&self) -> bool {
		self.head == self.ids.len()
	}
}

/// Decode the ObjectSpaceObjectPropSet spanning `range` of `buf`.
///
/// CompactIDs are resolved through `table`. Under-consumed ID streams are
/// recorded as diagnostics; structural failures are errors.
pub fn decode_prop_set<'a>(
	buf: &'a [u8],
	range: (usize, usize),
	table: &GlobalIdTable,
	options: &DecodeOptions,
	diagnostics: &mut Vec<Diagnostic>,
) -> Result<PropSet<'a>> {
	let (start, len) = range;
	let end = start.checked_add(len).filter(|end| *end <= buf.len()).ok_or(OneError::BadReference {
		at: start,
		stp: start as u64,
		cb: len as u64,
		len: buf.len(),
	})?;

	let mut cursor = Cursor::new(&buf[..end]);
	cursor.seek(start)?;

	let (mut oids, osid_stream_not_present, mut extended_streams_present) = read_id_stream(&mut cursor, table, "OIDs")?;
	let mut osids = if osid_stream_not_present {
		IdStream::absent("OSIDs")
	} else {
		let (stream, _, extended) = read_id_stream(&mut cursor, table, "OSIDs")?;
		// The successor rule: once OSIDs is present, its header governs
		// whether ContextIDs follows.
		extended_streams_present = extended;
		stream
	};
	let mut context_ids = if extended_streams_present {
		read_id_stream(&mut cursor, table, "ContextIDs")?.0
	} else {
		IdStream::absent("ContextIDs")
	};

	let body = read_property_set(&mut cursor, &mut oids, &mut osids, &mut context_ids, options, 0)?;

	for stream in [&oids, &osids, &context_ids] {
		if !stream.fully_consumed() {
			diagnostics.push(Diagnostic::note(
				start,
				format!("{} stream under-consumed: {} of {} ids used", stream.label, stream.head, stream.ids.len()),
			));
		}
	}

	Ok(PropSet { offset: start, body })
}

fn read_id_stream(cursor: &mut Cursor<'_>, table: &GlobalIdTable, label: &'static str) -> Result<(IdStream, bool, bool)> {
	let header = cursor.read_u32_le()?;
	let count = header & 0x00FF_FFFF;
	let extended_streams_present = header >> 30 & 1 == 1;
	let osid_stream_not_present = header >> 31 == 1;

	// Counts are attacker-controlled; bound the allocation by what the
	// buffer can actually hold.
	if count as usize * 4 > cursor.remaining() {
		return Err(OneError::Truncated {
			at: cursor.pos(),
			need: count as usize * 4,
			rem: cursor.remaining(),
		});
	}
	let mut ids = Vec::with_capacity(count as usize);
	for _ in 0..count {
		let compact = CompactId::parse(cursor)?;
		ids.push(table.resolve(compact)?);
	}

	Ok((IdStream { label, ids, head: 0 }, osid_stream_not_present, extended_streams_present))
}

fn read_property_set<'a>(
	cursor: &mut Cursor<'a>,
	oids: &mut IdStream,
	osids: &mut IdStream,
	context_ids: &mut IdStream,
	options: &DecodeOptions,
	depth: u32,
) -> Result<PropertySet<'a>> {
	if depth >= options.max_depth {
		return Err(OneError::DepthExceeded { max: options.max_depth });
	}

	let count = cursor.read_u16_le()? as usize;
	let mut ids = Vec::with_capacity(count);
	for _ in 0..count {
		ids.push(PropertyId { raw: cursor.read_u32_le()? });
	}

	let mut entries = Vec::with_capacity(count);
	for id in ids {
		let value = read_property_value(cursor, id, oids, osids, context_ids, options, depth)?;
		entries.push(PropertyEntry { id, value });
	}

	Ok(PropertySet { entries })
}

fn read_property_value<'a>(
	cursor: &mut Cursor<'a>,
	id: PropertyId,
	oids: &mut IdStream,
	osids: &mut IdStream,
	context_ids: &mut IdStream,
	options: &DecodeOptions,
	depth: u32,
) -> Result<PropertyValue<'a>> {
	let at = cursor.pos();
	let value = match id.tag() {
		0x01 => PropertyValue::Empty,
		0x02 => PropertyValue::Bool(id.bool_value()),
		0x03 => PropertyValue::U8(cursor.read_u8()?),
		0x04 => PropertyValue::U16(cursor.read_u16_le()?),
		0x05 => PropertyValue::U32(cursor.read_u32_le()?),
		0x06 => PropertyValue::U64(cursor.read_u64_le()?),
		0x07 => {
			let len = cursor.read_u32_le()? as usize;
			PropertyValue::Blob(cursor.read_exact(len)?)
		}
		0x08 => PropertyValue::ObjectId(oids.take_one(at)?),
		0x09 => {
			let n = cursor.read_u32_le()? as usize;
			PropertyValue::ObjectIds(oids.take_n(at, n)?)
		}
		0x0A => PropertyValue::ObjectSpaceId(osids.take_one(at)?),
		0x0B => {
			let n = cursor.read_u32_le()? as usize;
			PropertyValue::ObjectSpaceIds(osids.take_n(at, n)?)
		}
		0x0C => PropertyValue::ContextId(context_ids.take_one(at)?),
		0x0D => {
			let n = cursor.read_u32_le()? as usize;
			PropertyValue::ContextIds(context_ids.take_n(at, n)?)
		}
		0x10 => {
			let n = cursor.read_u32_le()? as usize;
			let mut sets = Vec::new();
			if n > 0 {
				// One shared PropertyID prefixes the elements; each must be a
				// property set.
				let element_id = PropertyId { raw: cursor.read_u32_le()? };
				if element_id.tag() != 0x11 {
					return Err(OneError::UnknownPropertyType { at, tag: element_id.tag() });
				}
				for _ in 0..n {
					sets.push(read_property_set(cursor, oids, osids, context_ids, options, depth + 1)?);
				}
			}
			PropertyValue::PropertySets(sets)
		}
		0x11 => PropertyValue::PropertySet(read_property_set(cursor, oids, osids, context_ids, options, depth + 1)?),
		tag => return Err(OneError::UnknownPropertyType { at, tag }),
	};
	Ok(value)
}

/// Decode little-endian UTF-16 bytes, trimming trailing NULs.
pub fn utf16_lossy(bytes: &[u8]) -> String {
	let units: Vec<u16> = bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
	let mut text = String::from_utf16_lossy(&units);
	while text.ends_with('\0') {
		text.pop();
	}
	text
}

/// Well-known property id.
pub mod prop {
	/// Section display name.
	pub const SECTION_DISPLAY_NAME: u32 = 0x1C00_349B;
	/// Cached page/section title.
	pub const CACHED_TITLE_STRING: u32 = 0x1C00_1CF3;
	/// Unicode rich text run.
	pub const RICH_EDIT_TEXT_UNICODE: u32 = 0x1C00_1C22;
	/// Hyperlink target URL.
	pub const WZ_HYPERLINK_URL: u32 = 0x1C00_1E20;
	/// ObjectID of the file-data declaration backing an embedded file.
	pub const EMBEDDED_FILE_CONTAINER: u32 = 0x2000_1D9B;
	/// Embedded file display name.
	pub const EMBEDDED_FILE_NAME: u32 = 0x1C00_1D9C;
	/// ObjectID of the file-data declaration backing an image.
	pub const PICTURE_CONTAINER: u32 = 0x2000_1C3F;
	/// Image display filename.
	pub const IMAGE_FILENAME: u32 = 0x1C00_1DD7;
}

/// Known property name from MS-ONE, by full 32-bit id.
pub fn property_name(raw: u32) -> Option<&'static str> {
	let name = match raw {
		0x0800_1C00 => "LayoutTightLayout",
		0x1400_1C01 => "PageWidth",
		0x1400_1C02 => "PageHeight",
		0x0C00_1C03 => "OutlineElementChildLevel",
		0x0800_1C04 => "Bold",
		0x0800_1C05 => "Italic",
		0x0800_1C06 => "Underline",
		0x0800_1C07 => "Strikethrough",
		0x0800_1C08 => "Superscript",
		0x0800_1C09 => "Subscript",
		0x1C00_1C0A => "Font",
		0x1000_1C0B => "FontSize",
		0x1400_1C0C => "FontColor",
		0x1400_1C0D => "Highlight",
		0x1C00_1C12 => "RgOutlineIndentDistance",
		0x0C00_1C13 => "BodyTextAlignment",
		0x1400_1C14 => "OffsetFromParentHoriz",
		0x1400_1C15 => "OffsetFromParentVert",
		0x1C00_1C1A => "NumberListFormat",
		0x1400_1C1B => "LayoutMaxWidth",
		0x1400_1C1C => "LayoutMaxHeight",
		0x2400_1C1F => "ContentChildNodes",
		0x2400_1C20 => "ElementChildNodes",
		0x0800_1E1E => "EnableHistory",
		0x1C00_1C22 => "RichEditTextUnicode",
		0x2400_1C26 => "ListNodes",
		0x1C00_1C30 => "NotebookManagementEntityGuid",
		0x0800_1C34 => "OutlineElementRTL",
		0x1400_1C3B => "LanguageID",
		0x1400_1C3E => "LayoutAlignmentInParent",
		0x2000_1C3F => "PictureContainer",
		0x1400_1C4C => "PageMarginTop",
		0x1400_1C4D => "PageMarginBottom",
		0x1400_1C4E => "PageMarginLeft",
		0x1400_1C4F => "PageMarginRight",
		0x1C00_1C52 => "ListFont",
		0x1800_1C65 => "TopologyCreationTimeStamp",
		0x1400_1C84 => "LayoutAlignmentSelf",
		0x0800_1C87 => "IsTitleTime",
		0x0800_1C88 => "IsBoilerText",
		0x1400_1C8B => "PageSize",
		0x0800_1C8E => "PortraitPage",
		0x0800_1C91 => "EnforceOutlineStructure",
		0x0800_1C92 => "EditRootRTL",
		0x0800_1CB2 => "CannotBeSelected",
		0x0800_1CB4 => "IsTitleText",
		0x0800_1CB5 => "IsTitleDate",
		0x1400_1CB7 => "ListRestart",
		0x0800_1CBD => "IsLayoutSizeSetByUser",
		0x1400_1CCB => "ListSpacingMu",
		0x1400_1CDB => "LayoutOutlineReservedWidth",
		0x0800_1CDC => "LayoutResolveChildCollisions",
		0x0800_1CDE => "IsReadOnly",
		0x1400_1CEC => "LayoutMinimumOutlineWidth",
		0x1400_1CF1 => "LayoutCollisionPriority",
		0x1C00_1CF3 => "CachedTitleString",
		0x0800_1CF9 => "DescendantsCannotBeMoved",
		0x1000_1CFE => "RichEditTextLangID",
		0x0800_1CFF => "LayoutTightAlignment",
		0x0C00_1D01 => "Charset",
		0x1400_1D09 => "CreationTimeStamp",
		0x0800_1D0C => "Deletable",
		0x1000_1D0E => "ListMSAAIndex",
		0x0800_1D13 => "IsBackground",
		0x1400_1D24 => "IRecordMedia",
		0x1C00_1D3C => "CachedTitleStringFromPage",
		0x1400_1D57 => "RowCount",
		0x1400_1D58 => "ColumnCount",
		0x0800_1D5E => "TableBordersVisible",
		0x2400_1D5F => "StructureElementChildNodes",
		0x2C00_1D63 => "ChildGraphSpaceElementNodes",
		0x1C00_1D66 => "TableColumnWidths",
		0x1C00_1D75 => "Author",
		0x1800_1D77 => "LastModifiedTimeStamp",
		0x2000_1D78 => "AuthorOriginal",
		0x2000_1D79 => "AuthorMostRecent",
		0x1400_1D7A => "LastModifiedTime",
		0x0800_1D7C => "IsConflictPage",
		0x1C00_1D7D => "TableColumnsLocked",
		0x1400_1D82 => "SchemaRevisionInOrderToRead",
		0x0800_1D96 => "IsConflictObjectForRender",
		0x2000_1D9B => "EmbeddedFileContainer",
		0x1C00_1D9C => "EmbeddedFileName",
		0x1C00_1D9D => "SourceFilepath",
		0x1C00_1D9E => "ConflictingUserName",
		0x1C00_1DD7 => "ImageFilename",
		0x0800_1DDB => "IsConflictObjectForSelection",
		0x1400_1DFF => "PageLevel",
		0x1C00_1E12 => "TextRunIndex",
		0x2400_1E13 => "TextRunFormatting",
		0x0800_1E14 => "Hyperlink",
		0x0C00_1E15 => "UnderlineType",
		0x0800_1E16 => "Hidden",
		0x0800_1E19 => "HyperlinkProtected",
		0x0800_1E22 => "TextRunIsEmbeddedObject",
		0x1400_1E26 => "CellShadingColor",
		0x1C00_1E58 => "ImageAltText",
		0x0800_3401 => "MathFormatting",
		0x2000_342C => "ParagraphStyle",
		0x1400_342E => "ParagraphSpaceBefore",
		0x1400_342F => "ParagraphSpaceAfter",
		0x1400_3430 => "ParagraphLineSpacingExact",
		0x2400_3442 => "MetaDataObjectsAboveGraphSpace",
		0x2400_3458 => "TextRunDataObject",
		0x4000_3499 => "TextRunData",
		0x1C00_345A => "ParagraphStyleId",
		0x0800_3462 => "HasVersionPages",
		0x1000_3463 => "ActionItemType",
		0x1000_3464 => "NoteTagShape",
		0x1400_3465 => "NoteTagHighlightColor",
		0x1400_3466 => "NoteTagTextColor",
		0x1400_3467 => "NoteTagPropertyStatus",
		0x1C00_3468 => "NoteTagLabel",
		0x1400_346E => "NoteTagCreated",
		0x1400_346F => "NoteTagCompleted",
		0x2000_3488 => "NoteTagDefinitionOid",
		0x0400_3489 => "NoteTagStates",
		0x1000_3470 => "ActionItemStatus",
		0x0C00_3473 => "ActionItemSchemaVersion",
		0x0800_3476 => "ReadingOrderRTL",
		0x0C00_3477 => "ParagraphAlignment",
		0x3400_347B => "VersionHistoryGraphSpaceContextNodes",
		0x1400_3480 => "DisplayedPageNumber",
		0x1C00_349B => "SectionDisplayName",
		0x1C00_348A => "NextStyle",
		0x2000_34C8 => "WebPictureContainer14",
		0x1400_34CB => "ImageUploadState",
		0x1C00_3498 => "TextExtendedAscii",
		0x1400_34CD => "PictureWidth",
		0x1400_34CE => "PictureHeight",
		0x1400_1D0F => "PageMarginOriginX",
		0x1400_1D10 => "PageMarginOriginY",
		0x1C00_1E20 => "WzHyperlinkUrl",
		0x1400_346B => "TaskTagDueDate",
		0x1C00_1DE9 => "IsDeletedGraphSpaceContent",
		_ => return None,
	};
	Some(name)
}
