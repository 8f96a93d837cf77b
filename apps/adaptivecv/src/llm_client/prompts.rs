// Shared prompt fragments.
// Each stage that calls the model keeps its own prompts alongside it
// (see pipeline/prompts.rs); only cross-cutting text lives here.

/// System persona sent with every completion.
pub const CV_EXPERT_SYSTEM: &str = "You are an expert resume writer and career coach \
    with deep knowledge of applicant tracking systems. \
    You tailor resumes and cover letters to specific job descriptions, \
    keep every statement concise and impactful, \
    and follow the requested output format exactly.";

/// Appended to prompts whose answer must be a single JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with a single valid JSON object only. \
    Do not include any text outside the JSON object. \
    Do not use markdown code fences.";

/// Renders the output-format block that closes a structured prompt.
pub fn format_instructions(schema: &str) -> String {
    format!(
        "<output_format>\nThe output must be a JSON object matching this schema:\n{schema}\n{JSON_ONLY_INSTRUCTION}\n</output_format>"
    )
}
