//! Fact Builder & Retriever.
//!
//! Profile and preferences arrive with every request, so facts are rebuilt per
//! call and never cached across requests.

mod builder;
mod retrieval;

pub use builder::{build_facts, humanize, source_value, Fact};
pub use retrieval::{retrieve, FactIndex, ScoredFact};
