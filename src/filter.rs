//! Off-topic detection for inbound candidate messages

/// Substrings that mark a message as unrelated to the interview
pub const UNRELATED_KEYWORDS: &[&str] = &[
    "chat",
    "game",
    "fun",
    "something else",
    "not interview",
    "joke",
    "random",
];

/// True when the lowercased text contains any unrelated keyword.
///
/// Matching is plain substring search, so "function" and "chatter" count.
pub fn is_unrelated(text: &str) -> bool {
    let lower = text.to_lowercase();
    UNRELATED_KEYWORDS.iter().any(|k| lower.contains(k))
}
