//! Stable text hashing for catalog keys.

use xxhash_rust::xxh3::xxh3_64;

/// Hash arbitrary text with XXH3-64.
#[must_use]
pub(crate) fn hash_text(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Derive the stable per-film key from an IMDb identifier.
///
/// The key is what joins the analyzer output to the catalog, so it must be
/// insensitive to incidental formatting of the id (whitespace, case).
#[must_use]
pub fn movie_key(imdb_id: &str) -> String {
    let canonical = imdb_id.trim().to_ascii_lowercase();
    format!("mk-{:016x}", hash_text(&canonical))
}
