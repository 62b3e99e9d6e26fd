//! Decision oracle: the external reasoning service that picks a value from
//! supplied evidence when deterministic and statistical methods are not enough.
//!
//! Every answer is validated before the pipeline trusts it. Anything outside
//! the contract is an error, which the arbiter turns into an unresolved field.

pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::facts::ScoredFact;
use crate::llm_client::{LlmClient, LlmError};
use crate::oracle::prompts::{ORACLE_PROMPT, ORACLE_RULES, ORACLE_SYSTEM};
use crate::resume::ScoredChunk;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle answer out of contract: {0}")]
    OutOfContract(String),

    #[error("Failed to encode oracle payload: {0}")]
    Payload(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OracleField {
    pub question: String,
    pub field_type: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OracleCandidates {
    pub facts: Vec<ScoredFact>,
    pub resume_chunks: Vec<ScoredChunk>,
}

/// Everything the oracle sees for one field. Serialized as-is into the
/// prompt and into the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest {
    pub field: OracleField,
    pub rules: Vec<&'static str>,
    pub candidates: OracleCandidates,
}

impl OracleRequest {
    pub fn new(
        question: String,
        field_type: String,
        options: Vec<String>,
        facts: Vec<ScoredFact>,
        resume_chunks: Vec<ScoredChunk>,
    ) -> Self {
        Self {
            field: OracleField {
                question,
                field_type,
                options,
            },
            rules: ORACLE_RULES.to_vec(),
            candidates: OracleCandidates {
                facts,
                resume_chunks,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleSourceType {
    Profile,
    Preferences,
    Resume,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleDecision {
    #[serde(default)]
    pub value: Option<String>,
    pub source_type: OracleSourceType,
    #[serde(default)]
    pub source_ref: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl OracleDecision {
    /// Checks the answer against the contract. A blank value is read as null.
    pub fn validate(mut self, options: &[String]) -> Result<Self, OracleError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(OracleError::OutOfContract(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            self.value = None;
        }
        if let Some(value) = &self.value {
            if !options.is_empty() && !options.iter().any(|o| o == value) {
                return Err(OracleError::OutOfContract(format!(
                    "value {value:?} is not one of the {} options",
                    options.len()
                )));
            }
        }
        Ok(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle implementations
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Returns the raw answer; callers validate it with [`OracleDecision::validate`].
    async fn decide(&self, request: &OracleRequest) -> Result<OracleDecision, OracleError>;

    fn name(&self) -> &str;
}

/// Oracle backed by the Anthropic Messages API.
pub struct LlmOracle {
    llm: LlmClient,
}

impl LlmOracle {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

pub fn render_prompt(request: &OracleRequest) -> Result<String, OracleError> {
    let payload = serde_json::to_string_pretty(request)?;
    Ok(ORACLE_PROMPT.replace("{payload}", &payload))
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    async fn decide(&self, request: &OracleRequest) -> Result<OracleDecision, OracleError> {
        let prompt = render_prompt(request)?;
        let decision: OracleDecision = self.llm.complete_json(&ORACLE_SYSTEM, &prompt).await?;
        debug!(
            "Oracle answered {:?} ({:?}, {:.2})",
            decision.value, decision.source_type, decision.confidence
        );
        Ok(decision)
    }

    fn name(&self) -> &str {
        crate::llm_client::MODEL
    }
}
