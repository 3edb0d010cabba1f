//! Public library API for inspecting OneNote `.one` and `.onetoc2` files.

/// OneNote revision-store parsing, node-list traversal, property decoding, and embedded-file extraction.
pub mod one;
