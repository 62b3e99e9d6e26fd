//! Decision Arbiter — resolves every field of a request through the evidence
//! cascade, first satisfied stage wins:
//!
//! 1. sensitive classification → blocked
//! 2. correction hit → the human-confirmed value
//! 3. no usable canonical mapping → blocked
//! 4. strong canonical mapping with a stored value → that value
//! 5. deterministic fast path (GPA regex over the resume)
//! 6. retrieval + oracle, audited, then gated by confidence
//!
//! Fields are independent and resolved concurrently. Every failure along the
//! way degrades to the unresolved decision; nothing here returns an error.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::answers::models::{AnswerRequest, Decision, SourceType};
use crate::answers::question::field_question;
use crate::audit::{AuditRecord, AuditSink};
use crate::canonical::CanonicalKey;
use crate::classify::merger::ClassificationResult;
use crate::classify::FieldClassifier;
use crate::config::RagConfig;
use crate::corrections::fingerprint::{domain_from_url, CorrectionKey};
use crate::corrections::store::CorrectionStore;
use crate::embeddings::Embedder;
use crate::facts::{build_facts, source_value, FactIndex};
use crate::models::field::FieldDescriptor;
use crate::oracle::{DecisionOracle, OracleDecision, OracleError, OracleRequest};
use crate::resume::gpa::asks_for_gpa;
use crate::resume::ResumeIndex;

pub const CORRECTION_CONFIDENCE: f64 = 0.99;
pub const GPA_CONFIDENCE: f64 = 0.95;
pub const GPA_SOURCE_REF: &str = "resume_regex:gpa";

/// Read-only state shared by every field of one request.
struct RequestContext {
    domain: String,
    profile: Map<String, Value>,
    preferences: Map<String, Value>,
    resume_id: Option<Uuid>,
    facts: FactIndex,
}

pub struct DecisionArbiter {
    classifier: FieldClassifier,
    embedder: Arc<dyn Embedder>,
    corrections: Arc<dyn CorrectionStore>,
    resumes: Arc<ResumeIndex>,
    oracle: Arc<dyn DecisionOracle>,
    audit: Arc<dyn AuditSink>,
    config: RagConfig,
    oracle_permits: Arc<Semaphore>,
}

impl DecisionArbiter {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        corrections: Arc<dyn CorrectionStore>,
        resumes: Arc<ResumeIndex>,
        oracle: Arc<dyn DecisionOracle>,
        audit: Arc<dyn AuditSink>,
        config: RagConfig,
    ) -> Self {
        Self {
            classifier: FieldClassifier::new(embedder.clone(), config.semantic_min_confidence),
            oracle_permits: Arc::new(Semaphore::new(config.oracle_max_concurrency)),
            embedder,
            corrections,
            resumes,
            oracle,
            audit,
            config,
        }
    }

    pub fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    /// Resolves every field, returning one decision per field in request order.
    pub async fn resolve_all(self: &Arc<Self>, request: AnswerRequest) -> Vec<Decision> {
        let AnswerRequest {
            job_info,
            profile,
            preferences,
            resume_id,
            fields,
        } = request;

        let domain = job_info
            .and_then(|j| j.url)
            .map(|u| domain_from_url(&u))
            .unwrap_or_default();

        let classifications = self.classifier.classify(&fields).await;

        let facts = build_facts(&profile, &preferences);
        let fact_count = facts.len();
        let facts = match FactIndex::build(self.embedder.as_ref(), facts).await {
            Ok(index) => index,
            Err(e) => {
                warn!("Embedding {fact_count} facts failed, continuing without facts: {e}");
                FactIndex::empty()
            }
        };

        let ctx = Arc::new(RequestContext {
            domain,
            profile,
            preferences,
            resume_id,
            facts,
        });

        let field_ids: Vec<String> = fields.iter().map(|f| f.id.clone()).collect();
        let mut tasks = JoinSet::new();
        for (i, (field, classification)) in fields.into_iter().zip(classifications).enumerate() {
            let arbiter = Arc::clone(self);
            let ctx = Arc::clone(&ctx);
            tasks.spawn(async move { (i, arbiter.resolve_field(&ctx, &field, classification).await) });
        }

        let mut decisions: Vec<Option<Decision>> = vec![None; field_ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, decision)) => decisions[i] = Some(decision),
                Err(e) => warn!("Field resolution task failed: {e}"),
            }
        }

        decisions
            .into_iter()
            .zip(&field_ids)
            .map(|(decision, id)| decision.unwrap_or_else(|| Decision::unresolved(id, 0.0)))
            .collect()
    }

    async fn resolve_field(
        &self,
        ctx: &RequestContext,
        field: &FieldDescriptor,
        classification: ClassificationResult,
    ) -> Decision {
        let id = field.id.as_str();

        if classification.sensitive {
            debug!("Field {id}: blocked, {} is sensitive", classification.canonical_key);
            return Decision::unresolved(id, classification.confidence);
        }

        let key = CorrectionKey::for_field(&ctx.domain, field);
        match self.corrections.lookup(&key).await {
            Ok(Some(correction)) => {
                debug!("Field {id}: correction {} (hits={})", correction.id, correction.hits);
                return Decision::autofilled(
                    id,
                    correction.correct_value,
                    CORRECTION_CONFIDENCE,
                    SourceType::Correction,
                    Some(correction.id.to_string()),
                );
            }
            Ok(None) => {}
            Err(e) => warn!("Field {id}: correction lookup failed: {e}"),
        }

        if !classification.autofill_allowed {
            debug!("Field {id}: blocked, no usable mapping ({})", classification.canonical_key);
            return Decision::unresolved(id, classification.confidence);
        }

        if classification.confidence >= self.config.canonical_confidence_strong {
            if let Some(value) = source_value(classification.source, &ctx.profile, &ctx.preferences) {
                debug!("Field {id}: strong canonical {}", classification.source);
                return Decision::autofilled(
                    id,
                    value,
                    classification.confidence,
                    classification.source.into(),
                    Some(classification.source.to_string()),
                );
            }
        }

        let question = field_question(field);

        if let Some(decision) = self.gpa_fast_path(ctx, id, &question, &classification).await {
            return decision;
        }

        self.ask_oracle(ctx, field, question).await
    }

    async fn gpa_fast_path(
        &self,
        ctx: &RequestContext,
        id: &str,
        question: &str,
        classification: &ClassificationResult,
    ) -> Option<Decision> {
        let resume_id = ctx.resume_id?;
        if classification.canonical_key != CanonicalKey::Gpa && !asks_for_gpa(question) {
            return None;
        }
        match self.resumes.extract_gpa(resume_id).await {
            Ok(Some(gpa)) => {
                debug!("Field {id}: GPA {gpa} from resume {resume_id}");
                Some(Decision::autofilled(
                    id,
                    gpa,
                    GPA_CONFIDENCE,
                    SourceType::Resume,
                    Some(GPA_SOURCE_REF.to_string()),
                ))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Field {id}: GPA extraction failed: {e}");
                None
            }
        }
    }

    /// Retrieval-augmented decision followed by the confidence gate.
    async fn ask_oracle(&self, ctx: &RequestContext, field: &FieldDescriptor, question: String) -> Decision {
        let id = field.id.as_str();

        let (facts, chunks) = match self.embedder.embed_one(&question).await {
            Ok(query) => {
                let facts = ctx.facts.rank(&query, self.config.max_facts_to_send);
                let chunks = match ctx.resume_id {
                    Some(resume_id) => self
                        .resumes
                        .search_by_vector(resume_id, &query, self.config.max_chunks_to_send)
                        .await
                        .unwrap_or_else(|e| {
                            warn!("Field {id}: resume search failed: {e}");
                            Vec::new()
                        }),
                    None => Vec::new(),
                };
                (facts, chunks)
            }
            Err(e) => {
                warn!("Field {id}: query embedding failed, asking with no evidence: {e}");
                (Vec::new(), Vec::new())
            }
        };

        let request = OracleRequest::new(
            question,
            field.field_type().to_string(),
            field.options.clone(),
            facts,
            chunks,
        );

        let started = Instant::now();
        let outcome = self.call_oracle(&request).await;
        self.record(ctx, id, &request, &outcome, started).await;

        match outcome.and_then(|d| d.validate(&field.options)) {
            Ok(decision) => self.gate(id, decision),
            Err(e) => {
                warn!("Field {id}: oracle unusable, leaving unresolved: {e}");
                Decision::unresolved(id, 0.0)
            }
        }
    }

    async fn call_oracle(&self, request: &OracleRequest) -> Result<OracleDecision, OracleError> {
        let _permit = self
            .oracle_permits
            .acquire()
            .await
            .map_err(|_| OracleError::OutOfContract("oracle permits closed".to_string()))?;
        let timeout = self.config.oracle_timeout;
        tokio::time::timeout(timeout, self.oracle.decide(request))
            .await
            .map_err(|_| OracleError::Timeout(timeout))?
    }

    async fn record(
        &self,
        ctx: &RequestContext,
        field_id: &str,
        request: &OracleRequest,
        outcome: &Result<OracleDecision, OracleError>,
        started: Instant,
    ) {
        let (response, error) = match outcome {
            Ok(decision) => (serde_json::to_value(decision).ok(), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let record = AuditRecord {
            id: Uuid::new_v4(),
            domain: ctx.domain.clone(),
            field_id: field_id.to_string(),
            oracle: self.oracle.name().to_string(),
            request: serde_json::to_value(request).unwrap_or(Value::Null),
            response,
            error,
            latency_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
        };
        if let Err(e) = self.audit.append(record).await {
            warn!("Field {field_id}: audit write failed: {e}");
        }
    }

    /// Only answers at or above the autofill threshold carry a value. Both
    /// thresholds stay configurable; anything below autofill comes back null.
    fn gate(&self, id: &str, decision: OracleDecision) -> Decision {
        let confidence = decision.confidence;
        let Some(value) = decision.value else {
            return Decision::unresolved(id, confidence);
        };

        if confidence >= self.config.min_confidence_to_autofill {
            debug!("Field {id}: oracle autofill at {confidence:.2}");
            Decision::autofilled(
                id,
                value,
                confidence,
                decision.source_type.into(),
                decision.source_ref,
            )
        } else {
            let band = if confidence >= self.config.min_confidence_to_return_value {
                "below autofill"
            } else {
                "below return"
            };
            debug!("Field {id}: oracle answer withheld at {confidence:.2} ({band})");
            Decision::unresolved(id, confidence)
        }
    }
}
