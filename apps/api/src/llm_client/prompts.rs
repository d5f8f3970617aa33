// Shared prompt fragments.
// Each flow defines its own templates in assistant/prompts.rs; only the
// cross-cutting pieces live here.

/// Appended to prompts whose answer is parsed as JSON without a declared schema.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Wraps a labelled block of user-supplied text so the model can tell
/// instructions from material.
pub fn fenced(label: &str, body: &str) -> String {
    format!("{label}:\n---\n{}\n---", body.trim())
}
