//! Turning raw command text into name tokens.

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive comparison key for a name (full Unicode case folding).
pub fn name_key(name: &str) -> String {
    caseless::default_case_fold_str(name)
}

/// Split a full command message (`/add Ann, Bob`) into normalized name tokens.
///
/// The leading command token is dropped. A payload containing a comma is split
/// on commas so multi-word names survive; otherwise it is split on whitespace.
/// Malformed input yields fewer (or zero) tokens, never an error.
pub fn parse_args(raw: &str) -> Vec<String> {
    let Some((_, payload)) = raw.trim_start().split_once(char::is_whitespace) else {
        return Vec::new();
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Vec::new();
    }

    let pieces: Vec<&str> = if payload.contains(',') {
        payload.split(',').collect()
    } else {
        payload.split_whitespace().collect()
    };

    pieces
        .into_iter()
        .map(|piece| normalize(piece.trim().trim_matches(',')))
        .filter(|token| !token.is_empty())
        .collect()
}
