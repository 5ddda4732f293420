// src/findings/mod.rs
// =============================================================================
// Findings: fixed-id rules over the signal record, then the severity gate.
//
//   let findings = enforce_policy(evaluate(&signals));
// =============================================================================

pub mod catalog;
pub mod model;
pub mod policy;
pub mod rules;

pub use model::{Confidence, Evidence, Finding, PolicyAction, ProofCompleteness, Severity, CATEGORY};
pub use policy::enforce_policy;
pub use rules::evaluate;
