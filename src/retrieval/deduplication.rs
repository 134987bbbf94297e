//! Content-prefix deduplication keys

/// Leading `max_chars` characters of `content`, used to group duplicates
///
/// Distinct documents that share a long common prefix collapse into one key,
/// and near-duplicates that differ in leading whitespace or casing do not.
pub fn dedup_key(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}
