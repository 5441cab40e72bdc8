//! Directive selection and application

mod directives;
mod engine;

pub use directives::*;
pub use engine::{PolicyDecision, PolicyEngine, PolicyInputs, PolicyReason};
