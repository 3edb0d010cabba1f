#![allow(missing_docs)]

mod common;

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use common::*;
use serde_json::Value;
use sha2::{Digest, Sha256};

use onedoc::one::props::prop;
use onedoc::one::{Jcid, ONE_FILE_TYPE};

fn compact(n: u8, index: u32) -> u32 {
	u32::from(n) | index << 8
}

/// A `.one` with one embedded file (`a.bin`, payload DE AD BE EF).
fn embedded_file_bytes() -> Vec<u8> {
	let mut builder = OneBuilder::new(&ONE_FILE_TYPE);

	let store_at = builder.append_blob(&store_object(&[0xDE, 0xAD, 0xBE, 0xEF]));
	let embedded_props = builder.append_blob(
		&PropSetBuilder::new()
			.oid(compact(1, 1))
			.object_id(prop::EMBEDDED_FILE_CONTAINER)
			.text(prop::EMBEDDED_FILE_NAME, "a.bin")
			.build(),
	);

	let store_list = {
		let reference_node = node(0x094, 1, Some(store_at), &[0x0A_u8; 16]);
		builder.append_fragment(4, &[reference_node], None)
	};

	let declarations = vec![
		node(0x0A4, 1, Some(embedded_props), &declaration_body(compact(1, 0), Jcid::EMBEDDED_FILE_NODE)),
		node(
			0x072,
			0,
			None,
			&file_data_declaration_body(
				compact(1, 1),
				Jcid::EMBEDDED_FILE_NODE,
				"<ifndf>{0a0a0a0a-0a0a-0a0a-0a0a-0a0a0a0a0a0a}",
				".bin",
			),
		),
	];
	let store_list_node = node(0x090, 2, Some(store_list), &[]);
	scaffold(&mut builder, &[[0x61_u8; 16], [0x62_u8; 16]], declarations, vec![store_list_node]);

	builder.bytes
}

fn work_dir(name: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("onedoc_cli_{}_{name}", std::process::id()));
	let _ = fs::remove_dir_all(&dir);
	fs::create_dir_all(&dir).expect("temp dir creates");
	dir
}

fn run_json(args: &[&str]) -> Value {
	let output = Command::new(env!("CARGO_BIN_EXE_onedoc")).args(args).output().expect("command executes");
	assert!(
		output.status.success(),
		"command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

#[test]
fn json_report_covers_all_sections() {
	let dir = work_dir("report");
	let input = dir.join("sample.one");
	fs::write(&input, embedded_file_bytes()).expect("input writes");

	let json = run_json(&["-f", input.to_str().expect("utf8 path"), "-j", "--log-level", "error"]);

	assert_eq!(json["headers"]["fileType"], "one");
	assert!(json["properties"].as_array().is_some_and(|items| !items.is_empty()), "expected properties");

	let file = &json["files"]["0a0a0a0a-0a0a-0a0a-0a0a-0a0a0a0a0a0a"];
	assert_eq!(file["content"], "deadbeef");
	assert_eq!(file["extension"], ".bin");
	assert_eq!(file["name"], "a.bin");
}

#[test]
fn json_include_and_digest_switch() {
	let dir = work_dir("digest");
	let input = dir.join("sample.one");
	fs::write(&input, embedded_file_bytes()).expect("input writes");

	let json = run_json(&[
		"-f",
		input.to_str().expect("utf8 path"),
		"-j",
		"--json-include",
		"files",
		"--json-files-no-content",
		"--log-level",
		"error",
	]);

	assert!(json.get("headers").is_none(), "headers section excluded");
	assert!(json.get("properties").is_none(), "properties section excluded");

	let mut hasher = Sha256::new();
	hasher.update([0xDE, 0xAD, 0xBE, 0xEF]);
	let expected = format!("{:x}", hasher.finalize());
	let file = &json["files"]["0a0a0a0a-0a0a-0a0a-0a0a-0a0a0a0a0a0a"];
	assert_eq!(file["sha256"], expected.as_str());
	assert!(file.get("content").is_none(), "content omitted");
}

#[test]
fn json_report_writes_to_path() {
	let dir = work_dir("to_path");
	let input = dir.join("sample.one");
	let report = dir.join("report.json");
	fs::write(&input, embedded_file_bytes()).expect("input writes");

	let output = Command::new(env!("CARGO_BIN_EXE_onedoc"))
		.args([
			"-f",
			input.to_str().expect("utf8 path"),
			"-j",
			report.to_str().expect("utf8 path"),
			"--log-level",
			"error",
		])
		.output()
		.expect("command executes");
	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&fs::read(&report).expect("report written")).expect("valid json");
	assert_eq!(json["files"]["0a0a0a0a-0a0a-0a0a-0a0a-0a0a0a0a0a0a"]["content"], "deadbeef");
}

#[test]
fn extraction_writes_named_payload_with_suffix() {
	let dir = work_dir("extract");
	let input = dir.join("sample.one");
	let out = dir.join("out");
	fs::write(&input, embedded_file_bytes()).expect("input writes");

	let output = Command::new(env!("CARGO_BIN_EXE_onedoc"))
		.args([
			"-f",
			input.to_str().expect("utf8 path"),
			"-o",
			out.to_str().expect("utf8 path"),
			"-e",
			"xyz",
			"--log-level",
			"error",
		])
		.output()
		.expect("command executes");
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

	let payload = fs::read(out.join("a.bin.xyz")).expect("extracted file exists");
	assert_eq!(payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn invalid_signature_exits_nonzero() {
	let dir = work_dir("invalid");
	let input = dir.join("not_onenote.bin");
	fs::write(&input, vec![0xAB; 2048]).expect("input writes");

	let output = Command::new(env!("CARGO_BIN_EXE_onedoc"))
		.args(["-f", input.to_str().expect("utf8 path"), "--log-level", "error"])
		.output()
		.expect("command executes");
	assert!(!output.status.success(), "bad signature must fail");
	assert!(String::from_utf8_lossy(&output.stderr).contains("not a OneNote file"));
}
