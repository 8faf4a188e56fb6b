//! Rules and the versioned ruleset store.

use super::{Check, FixAction, Property, Selector, Severity, Value};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Priority of a rule that does not declare one.
pub const LOWEST_PRIORITY: i64 = i64::MIN;

/// A formatting rule: where to look, what to assert, how to fix it.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique identifier within a ruleset
    pub id: String,

    /// Human-readable description
    pub description: String,

    /// Categorical grouping (e.g., "cover", "financial_tables")
    pub scope: String,

    /// Higher wins when fixes conflict
    pub priority: i64,

    /// Disabled rules are skipped by validation and correction
    pub enabled: bool,

    /// Elements the rule applies to
    pub selector: Selector,

    /// Assertions, in evaluation order
    pub checks: Vec<Check>,

    /// Fixes, in declaration order
    pub fix_actions: Vec<FixAction>,
}

impl Rule {
    /// Create an enabled rule with the lowest priority and no checks.
    pub fn new(id: impl Into<String>, selector: Selector) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            scope: String::new(),
            priority: LOWEST_PRIORITY,
            enabled: true,
            selector,
            checks: Vec::new(),
            fix_actions: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Add a check.
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Add a fix action.
    pub fn fix(mut self, action: FixAction) -> Self {
        self.fix_actions.push(action);
        self
    }

    /// The value this rule's fixes assign to `property`.
    ///
    /// When several actions target the same property the first one counts.
    pub fn fix_for(&self, property: Property) -> Option<Value> {
        self.fix_actions.iter().find_map(|a| a.target(property))
    }

    /// Checks and fixes that name a property the selected element kind does not have.
    pub fn inapplicable_properties(&self) -> Vec<Property> {
        let kind = self.selector.element;
        let mut out: Vec<Property> = self
            .checks
            .iter()
            .map(|c| c.property)
            .chain(
                self.fix_actions
                    .iter()
                    .flat_map(|a| a.assignments().into_iter().map(|(p, _)| p)),
            )
            .filter(|p| !p.applies_to(kind))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Free-form ruleset description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesetMetadata {
    /// Ruleset name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ruleset description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A versioned, ordered, immutable collection of rules.
///
/// Rule order is the tie-break when priorities are equal. A ruleset is
/// read-only once built and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Ruleset {
    version: String,
    metadata: RulesetMetadata,
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl Ruleset {
    /// Build a ruleset, rejecting structural configuration errors.
    pub fn new(version: impl Into<String>, rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(ConfigError::MissingVersion);
        }

        let mut index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(ConfigError::EmptyRuleId(i));
            }
            if index.insert(rule.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateRuleId(rule.id.clone()));
            }
            validate_rule(rule)?;
        }

        Ok(Self {
            version,
            metadata: RulesetMetadata::default(),
            rules,
            index,
        })
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: RulesetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn metadata(&self) -> &RulesetMetadata {
        &self.metadata
    }

    /// All rules in ruleset order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// Position of a rule in ruleset order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Enabled rules with their ruleset position.
    pub fn enabled_rules(&self) -> impl Iterator<Item = (usize, &Rule)> {
        self.rules.iter().enumerate().filter(|(_, r)| r.enabled)
    }

    /// Enabled rules of one scope.
    pub fn rules_in_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.enabled && r.scope == scope)
    }

    /// Distinct scopes, sorted.
    pub fn scopes(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .rules
            .iter()
            .map(|r| r.scope.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        set.into_iter().collect()
    }

    /// Summary counts.
    pub fn stats(&self) -> RuleStats {
        let mut stats = RuleStats {
            total: self.rules.len(),
            scopes: self.scopes().into_iter().map(String::from).collect(),
            ..Default::default()
        };
        for rule in &self.rules {
            if rule.enabled {
                stats.enabled += 1;
            } else {
                stats.disabled += 1;
            }
            stats.checks += rule.checks.len();
            stats.fix_actions += rule.fix_actions.len();
            for check in &rule.checks {
                match check.severity {
                    Severity::Error => stats.error_checks += 1,
                    Severity::Warning => stats.warning_checks += 1,
                }
            }
        }
        stats
    }
}

/// Ruleset statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub checks: usize,
    pub fix_actions: usize,
    pub error_checks: usize,
    pub warning_checks: usize,
    pub scopes: Vec<String>,
}

fn validate_rule(rule: &Rule) -> Result<(), ConfigError> {
    if rule.checks.is_empty() {
        return Err(ConfigError::NoChecks(rule.id.clone()));
    }

    for check in &rule.checks {
        if !check.comparator.supports(check.property) {
            return Err(ConfigError::InvalidComparator {
                rule: rule.id.clone(),
                comparator: check.comparator.as_str().to_string(),
                property: check.property.as_str().to_string(),
            });
        }
        if !value_fits(check.property, &check.expected) {
            return Err(ConfigError::InvalidValue {
                rule: rule.id.clone(),
                property: check.property.as_str().to_string(),
                reason: format!("{} is not a {:?} value", check.expected, check.property.value_kind()),
            });
        }
    }

    for action in &rule.fix_actions {
        for (property, value) in action.assignments() {
            if !value_fits(property, &value) {
                return Err(ConfigError::InvalidValue {
                    rule: rule.id.clone(),
                    property: property.as_str().to_string(),
                    reason: format!("{} cannot assign {}", action.verb(), value),
                });
            }
        }
    }

    Ok(())
}

fn value_fits(property: Property, value: &Value) -> bool {
    use super::ValueKind;
    match (property.value_kind(), value) {
        (ValueKind::Alignment, Value::Alignment(_)) => true,
        (ValueKind::Text, Value::Text(s)) => !s.trim().is_empty(),
        (ValueKind::Number, Value::Number(n)) => n.is_finite() && *n >= 0.0,
        (ValueKind::Bool, Value::Bool(_)) => true,
        (ValueKind::Case, Value::Case(_)) => true,
        _ => false,
    }
}
