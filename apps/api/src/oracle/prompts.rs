use std::sync::LazyLock;

use crate::llm_client::prompts::{EVIDENCE_ONLY_INSTRUCTION, JSON_ONLY_SYSTEM};

pub static ORACLE_SYSTEM: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{JSON_ONLY_SYSTEM} You fill in job application form fields on behalf of a \
         candidate, using only facts about that candidate supplied with each request. \
         {EVIDENCE_ONLY_INSTRUCTION}"
    )
});

/// Rules sent with every request, inside the payload.
pub const ORACLE_RULES: &[&str] = &[
    "Use ONLY the provided candidates. Do not invent anything.",
    "If the answer is not clearly supported by candidates, return source_type='unknown' and value=null.",
    "If options are provided (radio/select), value must exactly match one option or be null.",
    "source_ref must name the evidence used: the fact key (e.g. profile.firstName) or resume_chunk:<chunk_index>.",
    "confidence is a number between 0 and 1 reflecting how directly the evidence answers the question.",
];

pub const ORACLE_PROMPT: &str = r#"Answer the form field described in the JSON payload below.

Payload:
{payload}

Respond with exactly one JSON object of this shape:
{
  "value": string or null,
  "source_type": "profile" | "preferences" | "resume" | "unknown",
  "source_ref": string or null,
  "confidence": number between 0 and 1,
  "note": optional short string
}"#;
