use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use onedoc::one::props::{PropertySet, PropertyValue};
use onedoc::one::refs::ChunkRef;
use onedoc::one::{Document, EmbeddedFile, Header, OneError, Result};

use crate::cmd::util::{hex_preview, hex_string, sha256_hex};

/// One of the four report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
	Headers,
	Properties,
	Links,
	Files,
}

/// Report shaping switches.
pub struct ReportOptions {
	/// Sections to include, in report order.
	pub sections: Vec<Section>,
	/// Replace file content hex with a SHA-256 digest.
	pub files_no_content: bool,
}

/// Resolve `--json-include` names; an empty list means every section.
pub fn parse_sections(names: &[String]) -> Result<Vec<Section>> {
	if names.is_empty() {
		return Ok(vec![Section::Headers, Section::Properties, Section::Links, Section::Files]);
	}

	let mut sections = Vec::with_capacity(names.len());
	for name in names {
		let section = match name.trim().to_ascii_lowercase().as_str() {
			"headers" => Section::Headers,
			"properties" => Section::Properties,
			"links" => Section::Links,
			"files" => Section::Files,
			_ => return Err(OneError::UnknownReportSection { name: name.clone() }),
		};
		if !sections.contains(&section) {
			sections.push(section);
		}
	}
	Ok(sections)
}

/// Build the JSON report for one parsed document.
pub fn build(header: &Header, document: &Document<'_>, options: &ReportOptions) -> Value {
	let mut report = Map::new();
	for section in &options.sections {
		match section {
			Section::Headers => {
				let mut map = Map::new();
				for (key, value) in header_entries(header) {
					map.insert(key.to_owned(), value);
				}
				report.insert("headers".to_owned(), Value::Object(map));
			}
			Section::Properties => {
				report.insert("properties".to_owned(), properties_json(document));
			}
			Section::Links => {
				report.insert("links".to_owned(), links_json(document));
			}
			Section::Files => {
				report.insert("files".to_owned(), files_json(document, options.files_no_content));
			}
		}
	}
	Value::Object(report)
}

/// Write the report to `target`, or pretty-print it to stdout.
pub fn emit(report: &Value, target: Option<&Path>) -> Result<()> {
	let rendered = serde_json::to_string_pretty(report)?;
	match target {
		Some(path) => fs::write(path, rendered.as_bytes())?,
		None => println!("{rendered}"),
	}
	Ok(())
}

/// Print the human-readable report, mirroring the JSON sections.
pub fn print_text(header: &Header, document: &Document<'_>) {
	println!("Headers\n####################################################################");
	for (key, value) in header_entries(header) {
		println!("\t{key}: {}", plain(&value));
	}

	println!("\n\nProperties\n####################################################################");
	for object in document.objects() {
		let Some(props) = &object.props else { continue };
		let identity = object.oid.map(|oid| oid.to_string()).unwrap_or_default();
		println!("\t{}({identity}):", object.jcid);
		for (name, value) in render_property_map(&props.body) {
			println!("\t\t{name}: {}", plain(&value));
		}
		println!();
	}

	println!("\n\nEmbedded Files\n####################################################################");
	for file in &document.files {
		let identity = file.identity.map(|oid| oid.to_string()).unwrap_or_default();
		println!("\t{} ({identity}):", file.guid);
		println!("\t\tExtension: {}", file.extension);
		if let Some(name) = &file.suggested_name {
			println!("\t\tName: {name}");
		}
		match file.content {
			Some(content) => print!("{}", hex_preview(content, 16, 256, "\t\t")),
			None => println!("\t\t<payload unavailable>"),
		}
	}

	if !document.diagnostics.is_empty() {
		println!("\n\nDiagnostics\n####################################################################");
		for diagnostic in &document.diagnostics {
			println!("\toffset {}: {}", diagnostic.offset, diagnostic.message);
		}
	}
}

fn plain(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn header_entries(header: &Header) -> Vec<(&'static str, Value)> {
	vec![
		("fileType", json!(header.file_kind.as_str())),
		("guidFileType", json!(header.guid_file_type.to_string())),
		("guidFile", json!(header.guid_file.to_string())),
		("guidLegacyFileVersion", json!(header.guid_legacy_file_version.to_string())),
		("guidFileFormat", json!(header.guid_file_format.to_string())),
		("ffvLastCodeThatWroteToThisFile", json!(header.ffv_last_writer)),
		("ffvOldestCodeThatHasWrittenToThisFile", json!(header.ffv_oldest_writer)),
		("ffvNewestCodeThatHasWrittenToThisFile", json!(header.ffv_newest_writer)),
		("ffvOldestCodeThatMayReadThisFile", json!(header.ffv_oldest_reader)),
		("fcrLegacyFreeChunkList", json!(chunk_ref_label(header.fcr_legacy_free_chunk_list))),
		("fcrLegacyTransactionLog", json!(chunk_ref_label(header.fcr_legacy_transaction_log))),
		("cTransactionsInLog", json!(header.transactions_in_log)),
		("cbLegacyExpectedFileLength", json!(header.cb_legacy_expected_file_length)),
		("fcrLegacyFileNodeListRoot", json!(chunk_ref_label(header.fcr_legacy_file_node_list_root))),
		("cbLegacyFreeSpaceInFreeChunkList", json!(header.cb_legacy_free_space)),
		("fNeedsDefrag", json!(header.needs_defrag)),
		("fRepairedFile", json!(header.repaired)),
		("fNeedsGarbageCollect", json!(header.needs_garbage_collect)),
		("fHasNoEmbeddedFileObjects", json!(header.has_no_embedded_file_objects)),
		("guidAncestor", json!(header.guid_ancestor.to_string())),
		("crcName", json!(header.crc_name)),
		("fcrHashedChunkList", json!(chunk_ref_label(header.fcr_hashed_chunk_list))),
		("fcrTransactionLog", json!(chunk_ref_label(header.fcr_transaction_log))),
		("fcrFileNodeListRoot", json!(chunk_ref_label(header.fcr_file_node_list_root))),
		("fcrFreeChunkList", json!(chunk_ref_label(header.fcr_free_chunk_list))),
		("cbExpectedFileLength", json!(header.cb_expected_file_length)),
		("cbFreeSpaceInFreeChunkList", json!(header.cb_free_space_in_free_chunk_list)),
		("guidFileVersion", json!(header.guid_file_version.to_string())),
		("nFileVersionGeneration", json!(header.file_version_generation)),
		("guidDenyReadFileVersion", json!(header.guid_deny_read_file_version.to_string())),
		("grfDebugLogFlags", json!(header.debug_log_flags)),
		("fcrDebugLog", json!(chunk_ref_label(header.fcr_debug_log))),
		(
			"fcrAllocVerificationFreeChunkList",
			json!(chunk_ref_label(header.fcr_alloc_verification_free_chunk_list)),
		),
		("bnCreated", json!(header.bn_created)),
		("bnLastWroteToThisFile", json!(header.bn_last_wrote)),
		("bnOldestWritten", json!(header.bn_oldest_written)),
		("bnNewestWritten", json!(header.bn_newest_written)),
	]
}

fn chunk_ref_label(reference: ChunkRef) -> String {
	match reference.span() {
		Some((stp, cb)) => format!("stp={stp} cb={cb}"),
		None if reference == ChunkRef::Zero => "zero".to_owned(),
		None => "nil".to_owned(),
	}
}

fn properties_json(document: &Document<'_>) -> Value {
	let mut out = Vec::new();
	for object in document.objects() {
		let Some(props) = &object.props else { continue };
		let identity = object.oid.map(|oid| oid.to_string()).unwrap_or_default();
		out.push(json!({
			"type": object.jcid.to_string(),
			"identity": identity,
			"val": Value::Object(render_property_map(&props.body)),
		}));
	}
	Value::Array(out)
}

fn links_json(document: &Document<'_>) -> Value {
	let links: Vec<Value> = document
		.links
		.iter()
		.map(|link| {
			json!({
				"type": link.object_type,
				"identity": link.identity,
				"url": link.url,
				"source": link.source.as_str(),
			})
		})
		.collect();
	Value::Array(links)
}

fn files_json(document: &Document<'_>, no_content: bool) -> Value {
	let mut out = Map::new();
	for file in &document.files {
		out.insert(file.guid.to_string(), file_json(file, no_content));
	}
	Value::Object(out)
}

fn file_json(file: &EmbeddedFile<'_>, no_content: bool) -> Value {
	let identity = file.identity.map(|oid| oid.to_string()).unwrap_or_default();
	let mut map = Map::new();
	map.insert("extension".to_owned(), json!(file.extension));
	map.insert("identity".to_owned(), json!(identity));
	if let Some(name) = &file.suggested_name {
		map.insert("name".to_owned(), json!(name));
	}
	if no_content {
		map.insert("sha256".to_owned(), file.content.map(sha256_hex).map_or(Value::Null, Value::String));
	} else {
		map.insert("content".to_owned(), json!(file.content.map(hex_string).unwrap_or_default()));
	}
	Value::Object(map)
}

fn render_property_map(set: &PropertySet<'_>) -> Map<String, Value> {
	let mut map = Map::new();
	for entry in &set.entries {
		let Some(name) = entry.id.name() else { continue };
		map.insert(name.to_owned(), render_property_value(name, &entry.value));
	}
	map
}

/// Render one property the way an analyst wants to read it: text for UTF-16
/// blobs, GUIDs for guid-named blobs, unix seconds for timestamps, pixels for
/// layout sizes, identity strings for ID-family values.
fn render_property_value(name: &str, value: &PropertyValue<'_>) -> Value {
	let lower = name.to_ascii_lowercase();
	match value {
		PropertyValue::Empty => Value::Null,
		PropertyValue::Bool(flag) => json!(flag),
		PropertyValue::U8(n) => json!(n),
		PropertyValue::U16(n) => json!(n),
		PropertyValue::U32(n) if lower.contains("time") => json!(time32_to_unix(*n)),
		PropertyValue::U32(n)
			if lower.contains("height") || lower.contains("width") || lower.contains("offset") || lower.contains("margin") =>
		{
			json!(half_inch_to_pixels(f32::from_bits(*n)))
		}
		PropertyValue::U32(n) => json!(n),
		PropertyValue::U64(n) if lower.contains("time") => json!(filetime_to_unix(*n)),
		PropertyValue::U64(n) => json!(n),
		PropertyValue::Blob(raw) => render_blob(&lower, raw),
		PropertyValue::ObjectId(id) | PropertyValue::ObjectSpaceId(id) | PropertyValue::ContextId(id) => json!(id.to_string()),
		PropertyValue::ObjectIds(ids) | PropertyValue::ObjectSpaceIds(ids) | PropertyValue::ContextIds(ids) => {
			Value::Array(ids.iter().map(|id| json!(id.to_string())).collect())
		}
		PropertyValue::PropertySet(nested) => Value::Object(render_property_map(nested)),
		PropertyValue::PropertySets(sets) => Value::Array(sets.iter().map(|nested| Value::Object(render_property_map(nested))).collect()),
	}
}

fn render_blob(lower_name: &str, raw: &[u8]) -> Value {
	if lower_name.contains("guid") && raw.len() == 16 {
		let mut bytes = [0_u8; 16];
		bytes.copy_from_slice(raw);
		return json!(uuid::Uuid::from_bytes_le(bytes).to_string());
	}

	match decode_utf16_strict(raw) {
		Some(text) => json!(text),
		None => json!(hex_string(raw)),
	}
}

fn decode_utf16_strict(raw: &[u8]) -> Option<String> {
	if raw.len() % 2 != 0 {
		return None;
	}
	let units: Vec<u16> = raw.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
	let mut text = String::from_utf16(&units).ok()?;
	while text.ends_with('\0') {
		text.pop();
	}
	if text.chars().any(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t')) {
		return None;
	}
	Some(text)
}

/// FILETIME (100ns ticks since 1601) to unix seconds.
fn filetime_to_unix(filetime: u64) -> i64 {
	(filetime / 10_000_000) as i64 - 11_644_473_600
}

/// Time32 (seconds since 1980) to unix seconds.
fn time32_to_unix(time32: u32) -> i64 {
	315_532_800 + i64::from(time32)
}

/// Layout sizes are stored in half-inches; render as pixels at 96 dpi.
fn half_inch_to_pixels(size: f32) -> i64 {
	(size * 48.0) as i64
}
