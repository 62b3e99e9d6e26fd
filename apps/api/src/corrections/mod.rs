//! Correction memory: user-confirmed answers that take precedence over every
//! inferred value for the same field on the same domain.

pub mod fingerprint;
pub mod handlers;
pub mod store;

pub use store::CorrectionStore;
