// Shared prompt fragments for structured-output calls.
// Each stage keeps its own templates in pipeline::prompts; the chat persona lives in chat::prompts.

/// Appended to every prompt whose response is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Format the response as valid JSON only. \
    Ensure the JSON is syntactically correct and directly parsable. \
    Do NOT include any text outside the JSON value. \
    Do NOT include explanations or apologies.";
