use std::fs;
use std::path::Path;

use log::{info, warn};

use onedoc::one::{Document, Result};

use crate::cmd::util::sanitize_file_name;

/// Write every extracted payload under `output_dir`.
///
/// Files are named by their sibling filename property when one exists, else
/// `file_<n>` plus the extension their declaration recorded; `suffix` is
/// appended to everything.
pub fn run(document: &Document<'_>, output_dir: &Path, suffix: &str) -> Result<()> {
	if document.files.is_empty() {
		return Ok(());
	}
	fs::create_dir_all(output_dir)?;

	let suffix = normalize_suffix(suffix);
	let mut counter = 0_usize;
	for file in &document.files {
		let Some(content) = file.content else {
			warn!("skipping {}: payload unavailable", file.guid);
			continue;
		};

		let base = match &file.suggested_name {
			Some(name) => sanitize_file_name(name),
			None => format!("file_{counter}{}", file.extension),
		};
		let path = output_dir.join(format!("{base}{suffix}"));
		fs::write(&path, content)?;
		info!("wrote {} ({} bytes)", path.display(), content.len());
		counter += 1;
	}

	Ok(())
}

fn normalize_suffix(suffix: &str) -> String {
	if suffix.is_empty() || suffix.starts_with('.') {
		suffix.to_owned()
	} else {
		format!(".{suffix}")
	}
}
