//! Field value resolution: the Decision Arbiter and its HTTP surface.

pub mod arbiter;
pub mod handlers;
pub mod models;
pub mod question;

pub use arbiter::DecisionArbiter;
