use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::{debug, info};
use uuid::Uuid;

use crate::one::bytes::Cursor;
use crate::one::guid::ExtendedGuid;
use crate::one::header::Header;
use crate::one::jcid::Jcid;
use crate::one::list::{walk_list, WalkOptions};
use crate::one::object::{assemble, Assembly, ObjectEntry, ObjectSpace, StoreEntry};
use crate::one::props::{prop, DecodeOptions};
use crate::one::{Diagnostic, OneError, Result};

/// Limits applied to one parse run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
	/// FileNodeList traversal limits.
	pub walk: WalkOptions,
	/// Property-set decoding limits.
	pub props: DecodeOptions,
}

/// An opened OneNote file: the owned byte buffer plus its validated header.
pub struct OneFile {
	bytes: Vec<u8>,
	header: Header,
}

impl OneFile {
	/// Read and validate a file from disk.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let file = Self::from_bytes(fs::read(path)?)?;
		info!("opened {} ({} bytes, kind {})", path.display(), file.bytes.len(), file.header.file_kind.as_str());
		Ok(file)
	}

	/// Validate an in-memory buffer.
	pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
		let header = Header::parse(&mut Cursor::new(&bytes))?;
		Ok(Self { bytes, header })
	}

	/// The parsed 1024-byte header.
	pub fn header(&self) -> &Header {
		&self.header
	}

	/// The whole file buffer.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Parse with default limits.
	pub fn parse(&self) -> Result<Document<'_>> {
		self.parse_with(&ParseOptions::default())
	}

	/// Decode the full entity tree.
	///
	/// Truncation at or before the root list is fatal; everything else is
	/// recorded as a diagnostic, the offending subtree pruned, and the walk
	/// continued, so damaged inputs still produce a partial tree.
	pub fn parse_with(&self, options: &ParseOptions) -> Result<Document<'_>> {
		let mut diagnostics = Vec::new();

		let root_reference = self.header.fcr_file_node_list_root;
		if root_reference.is_absent() {
			return Ok(Document::empty(diagnostics));
		}

		let root = match walk_list(&self.bytes, root_reference, 0, &options.walk, &mut diagnostics) {
			Ok(root) => root,
			Err(err @ OneError::Truncated { .. }) => return Err(err),
			Err(err) => {
				diagnostics.push(Diagnostic::new(0, &err));
				return Ok(Document::empty(diagnostics));
			}
		};

		let assembly = assemble(&self.bytes, &root, &options.props, &mut diagnostics);
		let files = build_files(&assembly);
		let links = build_links(&assembly.spaces);
		debug!("document: {} files, {} links, {} diagnostics", files.len(), links.len(), diagnostics.len());

		Ok(Document {
			root_gosid: assembly.root_gosid,
			spaces: assembly.spaces,
			stores: assembly.stores,
			files,
			links,
			diagnostics,
		})
	}
}

/// The decoded entity tree of one parse run.
#[derive(Debug, Clone, Default)]
pub struct Document<'a> {
	/// Identity of the root object space, when declared.
	pub root_gosid: Option<ExtendedGuid>,
	/// Object spaces in document order.
	pub spaces: Vec<ObjectSpace<'a>>,
	/// File-data store entries keyed by reference GUID.
	pub stores: Vec<StoreEntry<'a>>,
	/// Embedded files merged from both extraction paths.
	pub files: Vec<EmbeddedFile<'a>>,
	/// Harvested hyperlinks.
	pub links: Vec<Link>,
	/// Recoverable problems, in discovery order.
	pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Document<'a> {
	fn empty(diagnostics: Vec<Diagnostic>) -> Self {
		Self {
			diagnostics,
			..Self::default()
		}
	}

	/// Object declarations of every space's current revision.
	pub fn objects(&self) -> impl Iterator<Item = &ObjectEntry<'a>> {
		self.spaces
			.iter()
			.filter_map(|space| space.current_revision())
			.flat_map(|revision| revision.objects.iter())
	}
}

/// One embedded file: payload from its store object, metadata from its
/// file-data declaration, display name from the declaring container object.
#[derive(Debug, Clone)]
pub struct EmbeddedFile<'a> {
	/// Store GUID joining the extraction paths.
	pub guid: Uuid,
	/// Extension recorded by the file-data declaration ("" when unknown).
	pub extension: String,
	/// Identity of the declaring object.
	pub identity: Option<ExtendedGuid>,
	/// Verbatim payload; `None` when the store object failed validation.
	pub content: Option<&'a [u8]>,
	/// Filename from the sibling EmbeddedFileName / ImageFilename property.
	pub suggested_name: Option<String>,
}

/// Where a harvested link came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
	/// A WzHyperlinkUrl property.
	HyperlinkProperty,
	/// A URL found inside rich text.
	RichText,
}

impl LinkSource {
	/// Property name the link was sourced from.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::HyperlinkProperty => "WzHyperlinkUrl",
			Self::RichText => "RichEditTextUnicode",
		}
	}
}

/// One harvested hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
	/// Class name of the declaring object.
	pub object_type: String,
	/// Identity of the declaring object ("" when unresolved).
	pub identity: String,
	pub url: String,
	pub source: LinkSource,
}

fn build_files<'a>(assembly: &Assembly<'a>) -> Vec<EmbeddedFile<'a>> {
	let mut files: BTreeMap<Uuid, EmbeddedFile<'a>> = BTreeMap::new();

	for store in &assembly.stores {
		let entry = files.entry(store.guid).or_insert_with(|| blank_file(store.guid));
		entry.content = store.payload;
	}

	let mut names: HashMap<ExtendedGuid, String> = HashMap::new();
	for object in current_objects(&assembly.spaces) {
		if let Some(binding) = &object.file_data {
			if let Some(guid) = binding.store_guid() {
				let entry = files.entry(guid).or_insert_with(|| blank_file(guid));
				entry.extension = binding.extension.clone();
				entry.identity = object.oid;
			}
		}

		let Some(props) = &object.props else { continue };
		let (container, name) = match object.jcid.raw {
			Jcid::IMAGE_NODE => (prop::PICTURE_CONTAINER, prop::IMAGE_FILENAME),
			_ if object.jcid.bears_file_data() => (prop::EMBEDDED_FILE_CONTAINER, prop::EMBEDDED_FILE_NAME),
			_ => continue,
		};
		let target = props.body.get(container).and_then(|value| value.as_object_id());
		let file_name = props.body.get(name).and_then(|value| value.as_text());
		if let (Some(target), Some(file_name)) = (target, file_name) {
			if !file_name.is_empty() {
				names.insert(target, file_name);
			}
		}
	}

	let mut out: Vec<EmbeddedFile<'a>> = files.into_values().collect();
	for file in &mut out {
		if let Some(identity) = file.identity {
			file.suggested_name = names.get(&identity).cloned();
		}
	}
	out
}

fn blank_file<'a>(guid: Uuid) -> EmbeddedFile<'a> {
	EmbeddedFile {
		guid,
		extension: String::new(),
		identity: None,
		content: None,
		suggested_name: None,
	}
}

fn current_objects<'a, 'b>(spaces: &'b [ObjectSpace<'a>]) -> impl Iterator<Item = &'b ObjectEntry<'a>> {
	spaces
		.iter()
		.filter_map(|space| space.current_revision())
		.flat_map(|revision| revision.objects.iter())
}

fn build_links<'a>(spaces: &[ObjectSpace<'a>]) -> Vec<Link> {
	let mut links = Vec::new();
	let mut seen: HashSet<(String, String)> = HashSet::new();

	for object in current_objects(spaces) {
		let Some(props) = &object.props else { continue };
		let object_type = object.jcid.to_string();
		let identity = object.oid.map(|oid| oid.to_string()).unwrap_or_default();

		if let Some(url) = props.body.get(prop::WZ_HYPERLINK_URL).and_then(|value| value.as_text()) {
			let url = url.trim().to_owned();
			if !url.is_empty() && seen.insert((identity.clone(), url.clone())) {
				links.push(Link {
					object_type: object_type.clone(),
					identity: identity.clone(),
					url,
					source: LinkSource::HyperlinkProperty,
				});
			}
		}

		if let Some(text) = props.body.get(prop::RICH_EDIT_TEXT_UNICODE).and_then(|value| value.as_text()) {
			for url in extract_urls(&text) {
				if seen.insert((identity.clone(), url.clone())) {
					links.push(Link {
						object_type: object_type.clone(),
						identity: identity.clone(),
						url,
						source: LinkSource::RichText,
					});
				}
			}
		}
	}

	links
}

const URL_SCHEMES: [&str; 4] = ["https://", "http://", "mailto:", "onenote:"];

/// Pull URLs out of free text: scheme-prefixed runs up to whitespace or an
/// enclosing quote/bracket, with trailing punctuation trimmed.
fn extract_urls(text: &str) -> Vec<String> {
	let bytes = text.as_bytes();
	let mut urls = Vec::new();
	let mut seen = HashSet::new();
	let mut i = 0;

	while i < bytes.len() {
		let Some(scheme_len) = URL_SCHEMES
			.iter()
			.find(|scheme| {
				bytes.len() - i >= scheme.len() && bytes[i..i + scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
			})
			.map(|scheme| scheme.len())
		else {
			i += 1;
			continue;
		};

		let mut end = i + scheme_len;
		while end < bytes.len() && !matches!(bytes[end], b' ' | b'\t' | b'\r' | b'\n' | b'<' | b'>' | b'"' | b'\'') {
			end += 1;
		}

		const TRAILING: &[char] = &[')', ']', '.', ',', ';', ':', '!', '?', '"', '\'', '\u{3001}', '\u{3002}'];
		let raw = String::from_utf8_lossy(&bytes[i..end]);
		let url = raw.trim_end_matches(TRAILING);
		if url.len() > scheme_len && seen.insert(url.to_owned()) {
			urls.push(url.to_owned());
		}
		i = end;
	}

	urls
}

#[cfg(test)]
mod tests;
