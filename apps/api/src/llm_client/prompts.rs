// Prompt fragments shared by every caller of the LLM client.
// Feature-specific prompts live beside the feature (see suggestions/prompts.rs).

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated claims tied to what the caller actually supplied.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only describe work that is plausible given the context provided. \
    Do NOT invent employers, certifications or products that are not mentioned. \
    If a number is not supported by the context, prefer a modest, realistic figure.";
