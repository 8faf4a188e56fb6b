//! Engine options.

use crate::rules::{Rule, Severity};

/// Options for validation and correction passes.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Only run rules of these scopes (empty = all scopes)
    pub scopes: Vec<String>,

    /// Skip warning-severity checks
    pub skip_warnings: bool,
}

impl EngineOptions {
    /// Create new engine options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the pass to the given scopes.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Add one scope to the filter.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Skip warning-severity checks.
    pub fn skip_warnings(mut self) -> Self {
        self.skip_warnings = true;
        self
    }

    /// Whether a rule takes part in a pass.
    pub fn admits(&self, rule: &Rule) -> bool {
        rule.enabled && (self.scopes.is_empty() || self.scopes.iter().any(|s| *s == rule.scope))
    }

    /// Whether checks of this severity are evaluated.
    pub fn admits_severity(&self, severity: Severity) -> bool {
        !(self.skip_warnings && severity == Severity::Warning)
    }
}
