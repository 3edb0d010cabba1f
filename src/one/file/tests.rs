use super::*;

#[test]
fn extracts_and_trims_urls() {
	let text = "see https://example.com/a). then HTTP://other.net/x, mailto:a@b.c; done";
	let urls = extract_urls(text);
	assert_eq!(urls, vec!["https://example.com/a", "HTTP://other.net/x", "mailto:a@b.c"]);
}

#[test]
fn bare_scheme_is_not_a_link() {
	assert!(extract_urls("https:// and nothing").is_empty());
}

#[test]
fn duplicate_urls_collapse() {
	let urls = extract_urls("https://a.example https://a.example");
	assert_eq!(urls.len(), 1);
}
