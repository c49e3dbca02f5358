//! Text helpers

/// Case-insensitive substring containment.
///
/// Uses Unicode lowercasing on both sides; an empty needle is contained in
/// every haystack.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
