//! Rules, rulesets and the property registry.
//!
//! A [`Ruleset`] is loaded once (from JSON or YAML, see [`loader`]) and is
//! read-only afterwards. Rules name their elements with a [`Selector`],
//! assert properties with [`Check`]s and repair them with [`FixAction`]s;
//! all property access goes through [`Property`].

mod action;
mod check;
pub mod loader;
mod property;
mod ruleset;
mod selector;
mod value;

pub use action::{FixAction, MarginSide};
pub use check::{Check, Comparator, Severity, DEFAULT_TOLERANCE};
pub use loader::LoadOptions;
pub use property::{Property, Reading, ValueKind, WriteError};
pub use ruleset::{Rule, RuleStats, Ruleset, RulesetMetadata, LOWEST_PRIORITY};
pub use selector::{Containment, OrdinalSelection, Position, Selector};
pub use value::{TextCase, Value};

#[cfg(feature = "async")]
pub use loader::load_ruleset_async;
