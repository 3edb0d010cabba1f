use sha2::{Digest, Sha256};

/// Render bytes as a lowercase hex string.
pub(crate) fn hex_string(bytes: &[u8]) -> String {
	let mut out = String::with_capacity(bytes.len() * 2);
	for byte in bytes {
		out.push_str(&format!("{byte:02x}"));
	}
	out
}

/// SHA-256 digest of `bytes` as lowercase hex.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
	let mut hasher = Sha256::new();
	hasher.update(bytes);
	hex_string(&hasher.finalize())
}

/// Render up to `limit` bytes as indented hex rows of `cols` bytes each.
pub(crate) fn hex_preview(bytes: &[u8], cols: usize, limit: usize, indent: &str) -> String {
	let mut out = String::new();
	for row in bytes[..bytes.len().min(limit)].chunks(cols) {
		out.push_str(indent);
		let rendered: Vec<String> = row.iter().map(|byte| format!("{byte:02x}")).collect();
		out.push_str(&rendered.join(" "));
		out.push('\n');
	}
	out
}

/// Strip path separators and control characters from an output filename.
pub(crate) fn sanitize_file_name(name: &str) -> String {
	let cleaned: String = name
		.chars()
		.map(|ch| match ch {
			'/' | '\\' | ':' => '_',
			ch if ch.is_control() => '_',
			ch => ch,
		})
		.collect();
	let cleaned = cleaned.trim_matches(&['.', ' '][..]).to_owned();
	if cleaned.is_empty() { "unnamed".to_owned() } else { cleaned }
}

#[cfg(test)]
mod tests;
