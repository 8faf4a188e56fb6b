//! The rule evaluation and correction engine.
//!
//! Data flows document + ruleset → [`Validator`] → violations →
//! [`Corrector`] → corrected document → [`Validator`] again → report.
//! [`Engine::process`] runs the whole cycle; the stages are public for
//! callers that need only part of it.

mod corrector;
mod evaluate;
mod options;
mod pipeline;
mod select;
mod validator;
mod violation;

pub use corrector::{correct, AppliedFix, Correction, Corrector};
pub use evaluate::{evaluate, evaluate_element, Assertion};
pub use options::EngineOptions;
pub use pipeline::{process_batch, Engine, ProcessOutput};
pub use select::{select, select_located};
pub use validator::{validate, Validation, Validator};
pub use violation::{Outcome, Violation};
