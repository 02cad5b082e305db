//! Interviewer instructions seeded as the first history entry

/// Base system prompt establishing the interviewer role
pub const INTERVIEWER_PROMPT: &str = "You are an interviewer. Ask natural, context-aware follow-up questions. Avoid repeating yourself. Keep tone professional and concise.";

/// Resolve the system prompt, preferring an operator override.
///
/// Blank overrides are ignored so an empty env var cannot leave the
/// interviewer without instructions.
pub fn resolve(override_prompt: Option<&str>) -> String {
    override_prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(INTERVIEWER_PROMPT)
        .to_string()
}
