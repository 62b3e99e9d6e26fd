// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompts.rs alongside it and builds on these.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended wherever the model must answer strictly from supplied material.
pub const EVIDENCE_ONLY_INSTRUCTION: &str = "\
    CRITICAL: Use ONLY the evidence provided in the request. Do NOT infer, \
    interpolate, or invent details. If the evidence does not clearly support an \
    answer, the answer is null. A null answer is always better than a guess.";
