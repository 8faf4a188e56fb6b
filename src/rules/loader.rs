//! Ruleset loading from JSON and YAML.
//!
//! Rule files are deserialized into plain definition structs first and then
//! compiled into [`Ruleset`]. Every configuration problem (unknown property,
//! duplicate id, malformed selector and so on) is reported here, before any
//! document is touched.

use super::{
    Check, Comparator, Containment, FixAction, MarginSide, OrdinalSelection, Position, Property,
    Rule, Ruleset, RulesetMetadata, Selector, Severity, TextCase, Value, ValueKind,
    DEFAULT_TOLERANCE, LOWEST_PRIORITY,
};
use crate::error::{ConfigError, Error, Result};
use crate::model::{Alignment, ElementKind};
use regex::RegexBuilder;
use serde::Deserialize;
use std::path::Path;

/// Options for loading rulesets.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Tolerance for measurement checks that do not declare one
    pub default_tolerance: f64,

    /// Reject rules that check or fix a property their element type does not have
    /// (otherwise they only log a warning and end as failed fixes)
    pub reject_inapplicable: bool,
}

impl LoadOptions {
    /// Create new load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default measurement tolerance.
    pub fn with_default_tolerance(mut self, tolerance: f64) -> Self {
        self.default_tolerance = tolerance;
        self
    }

    /// Reject inapplicable properties instead of warning.
    pub fn strict(mut self) -> Self {
        self.reject_inapplicable = true;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            default_tolerance: DEFAULT_TOLERANCE,
            reject_inapplicable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesetDef {
    #[serde(default)]
    version: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    rules: Vec<RuleDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    #[serde(default)]
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "category")]
    scope: String,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    selector: Option<SelectorDef>,
    #[serde(default)]
    checks: Vec<CheckDef>,
    #[serde(default, alias = "fixes")]
    fix_actions: Vec<FixActionDef>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SelectorDef {
    element: String,
    #[serde(default)]
    text_contains: Option<String>,
    #[serde(default)]
    text_matches: Option<String>,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    position: Option<PositionDef>,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    within: Option<ContainmentDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PositionDef {
    First(usize),
    Ordinals(String),
    Row(i64),
    Column(i64),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ContainmentDef {
    Table,
    Body,
    Section(usize),
    TableIndex(usize),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckDef {
    property: String,
    expected: serde_json::Value,
    #[serde(default)]
    comparator: Option<String>,
    #[serde(default)]
    tolerance: Option<f64>,
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixActionDef {
    action: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    side: Option<String>,
}

impl Ruleset {
    /// Load a ruleset from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json_str_with_options(s, &LoadOptions::default())
    }

    /// Load a ruleset from a JSON string with custom options.
    pub fn from_json_str_with_options(s: &str, options: &LoadOptions) -> Result<Self> {
        let def: RulesetDef = serde_json::from_str(s)?;
        compile(def, options)
    }

    /// Load a ruleset from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Self::from_yaml_str_with_options(s, &LoadOptions::default())
    }

    /// Load a ruleset from a YAML string with custom options.
    pub fn from_yaml_str_with_options(s: &str, options: &LoadOptions) -> Result<Self> {
        let def: RulesetDef = serde_yaml::from_str(s)?;
        compile(def, options)
    }

    /// Load a ruleset file; the format follows the extension (`.json`, `.yaml`, `.yml`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_options(path, &LoadOptions::default())
    }

    /// Load a ruleset file with custom options.
    pub fn from_path_with_options<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = RuleFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loading ruleset from {}", path.display());
        format.load(&content, options)
    }
}

/// Load a ruleset file without blocking the async runtime.
#[cfg(feature = "async")]
pub async fn load_ruleset_async<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Ruleset> {
    let path = path.as_ref();
    let format = RuleFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path).await?;
    format.load(&content, options)
}

#[derive(Debug, Clone, Copy)]
enum RuleFormat {
    Json,
    Yaml,
}

impl RuleFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(RuleFormat::Json),
            "yaml" | "yml" => Ok(RuleFormat::Yaml),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn load(self, content: &str, options: &LoadOptions) -> Result<Ruleset> {
        match self {
            RuleFormat::Json => Ruleset::from_json_str_with_options(content, options),
            RuleFormat::Yaml => Ruleset::from_yaml_str_with_options(content, options),
        }
    }
}

fn compile(def: RulesetDef, options: &LoadOptions) -> Result<Ruleset> {
    let mut rules = Vec::with_capacity(def.rules.len());
    for (i, rule) in def.rules.into_iter().enumerate() {
        rules.push(compile_rule(i, rule, options)?);
    }

    for rule in &rules {
        for property in rule.inapplicable_properties() {
            if options.reject_inapplicable {
                return Err(ConfigError::InapplicableProperty {
                    rule: rule.id.clone(),
                    property: property.as_str().to_string(),
                    element: rule.selector.element.as_str().to_string(),
                }
                .into());
            }
            log::warn!(
                "Rule '{}': {} does not apply to {} elements; its fixes will fail",
                rule.id,
                property,
                rule.selector.element
            );
        }
    }

    let ruleset = Ruleset::new(def.version, rules)?.with_metadata(RulesetMetadata {
        name: def.name,
        description: def.description,
    });

    let stats = ruleset.stats();
    log::info!(
        "Loaded ruleset {} with {} rules ({} enabled, {} checks)",
        ruleset.version(),
        stats.total,
        stats.enabled,
        stats.checks
    );
    Ok(ruleset)
}

fn compile_rule(index: usize, def: RuleDef, options: &LoadOptions) -> Result<Rule> {
    let id = def.id;
    if id.trim().is_empty() {
        return Err(ConfigError::EmptyRuleId(index).into());
    }

    let selector = def
        .selector
        .ok_or_else(|| ConfigError::MissingSelector(id.clone()))?;
    let selector = compile_selector(&id, selector)?;

    let mut rule = Rule::new(id.clone(), selector)
        .description(def.description)
        .scope(def.scope)
        .priority(def.priority.unwrap_or(LOWEST_PRIORITY))
        .enabled(def.enabled);

    for check in def.checks {
        rule = rule.check(compile_check(&id, check, options)?);
    }
    for action in def.fix_actions {
        rule = rule.fix(compile_action(&id, action)?);
    }
    Ok(rule)
}

fn compile_selector(rule: &str, def: SelectorDef) -> std::result::Result<Selector, ConfigError> {
    let element: ElementKind = def.element.parse().map_err(|_| ConfigError::UnknownElement {
        rule: rule.to_string(),
        element: def.element.clone(),
    })?;
    let invalid = |reason: String| ConfigError::InvalidSelector {
        rule: rule.to_string(),
        reason,
    };

    let mut selector = Selector::new(element);

    if let Some(needle) = def.text_contains {
        if needle.is_empty() {
            return Err(invalid("text_contains must not be empty".into()));
        }
        selector = selector.containing(&needle);
    }

    if let Some(pattern) = def.text_matches {
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| invalid(format!("invalid regex '{}': {}", pattern, e)))?;
        selector = selector.matching(re);
    }

    if let Some(position) = def.position {
        let position = match position {
            PositionDef::First(n) => Position::First(n),
            PositionDef::Ordinals(s) => {
                Position::Ordinals(OrdinalSelection::parse(&s).map_err(invalid)?)
            }
            PositionDef::Row(k) | PositionDef::Column(k)
                if !matches!(element, ElementKind::Row | ElementKind::Cell) =>
            {
                return Err(invalid(format!(
                    "row/column position {} needs a row or cell element, not {}",
                    k, element
                )));
            }
            PositionDef::Row(k) => Position::Row(k),
            PositionDef::Column(k) => {
                if element != ElementKind::Cell {
                    return Err(invalid(format!(
                        "column position needs cell elements, not {}",
                        element
                    )));
                }
                Position::Column(k)
            }
        };
        selector = selector.at(position);
    }

    if let Some(within) = def.within {
        selector = selector.within(match within {
            ContainmentDef::Table => Containment::Table,
            ContainmentDef::Body => Containment::Body,
            ContainmentDef::Section(s) => Containment::Section(s),
            ContainmentDef::TableIndex(t) => Containment::TableIndex(t),
        });
    }

    Ok(selector)
}

fn compile_check(rule: &str, def: CheckDef, options: &LoadOptions) -> Result<Check> {
    let property: Property = def.property.parse().map_err(|_| ConfigError::UnknownProperty {
        rule: rule.to_string(),
        property: def.property.clone(),
    })?;
    let invalid = |reason: String| ConfigError::InvalidValue {
        rule: rule.to_string(),
        property: property.as_str().to_string(),
        reason,
    };

    let expected = parse_value(property, &def.expected).map_err(invalid)?;

    let tolerance = def.tolerance.unwrap_or(options.default_tolerance);
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(invalid(format!("tolerance {} must be a non-negative number", tolerance)).into());
    }

    let comparator = match def.comparator.as_deref().map(|c| c.trim().to_ascii_lowercase()) {
        None => Comparator::default_for(property, tolerance),
        Some(name) => match name.as_str() {
            "equals" | "eq" => Comparator::Equals,
            "approx" | "tolerance" => Comparator::Approx { tolerance },
            "case" | "case_transform" => Comparator::Case,
            _ => {
                return Err(ConfigError::InvalidComparator {
                    rule: rule.to_string(),
                    comparator: name,
                    property: property.as_str().to_string(),
                }
                .into())
            }
        },
    };

    let severity = match def.severity {
        None => Severity::default(),
        Some(s) => s.parse::<Severity>().map_err(invalid)?,
    };

    Ok(Check::new(property, expected)
        .with_comparator(comparator)
        .with_severity(severity))
}

fn compile_action(rule: &str, def: FixActionDef) -> Result<FixAction> {
    let verb = def.action.trim().to_ascii_lowercase();
    let invalid = |property: Property, reason: String| ConfigError::InvalidValue {
        rule: rule.to_string(),
        property: property.as_str().to_string(),
        reason,
    };
    let value_for = |property: Property| -> std::result::Result<Value, ConfigError> {
        let raw = def
            .value
            .as_ref()
            .ok_or_else(|| invalid(property, format!("{} needs a value", verb)))?;
        parse_value(property, raw).map_err(|reason| invalid(property, reason))
    };
    let number = |property: Property| -> std::result::Result<f64, ConfigError> {
        value_for(property)?
            .as_f64()
            .ok_or_else(|| invalid(property, "expected a number".into()))
    };

    let action = match verb.as_str() {
        "set_alignment" => FixAction::SetAlignment(
            value_for(Property::Alignment)?
                .as_alignment()
                .ok_or_else(|| invalid(Property::Alignment, "expected an alignment".into()))?,
        ),
        "set_font" => {
            if def.name.is_none() && def.size.is_none() {
                return Err(
                    invalid(Property::FontName, "set_font needs a name or a size".into()).into(),
                );
            }
            FixAction::SetFont {
                name: def.name.clone(),
                size: def.size,
            }
        }
        "set_bold" => FixAction::SetBold(
            bool_value(&def, Property::Bold).map_err(|r| invalid(Property::Bold, r))?,
        ),
        "set_italic" => FixAction::SetItalic(
            bool_value(&def, Property::Italic).map_err(|r| invalid(Property::Italic, r))?,
        ),
        "set_row_height" => FixAction::SetRowHeight(number(Property::RowHeight)?),
        "set_cell_margin" => {
            let side = match def.side.as_deref() {
                None => MarginSide::All,
                Some(s) => s
                    .parse::<MarginSide>()
                    .map_err(|r| invalid(Property::CellMarginLeft, r))?,
            };
            FixAction::SetCellMargin {
                side,
                value: number(Property::CellMarginLeft)?,
            }
        }
        "set_column_width" => FixAction::SetColumnWidth(number(Property::ColumnWidth)?),
        "set_text_case" => FixAction::SetTextCase(
            value_for(Property::TextCase)?
                .as_case()
                .ok_or_else(|| invalid(Property::TextCase, "expected a text case".into()))?,
        ),
        _ => {
            return Err(ConfigError::UnknownAction {
                rule: rule.to_string(),
                action: def.action.clone(),
            }
            .into())
        }
    };
    Ok(action)
}

/// `set_bold` and `set_italic` default to `true` when no value is given.
fn bool_value(def: &FixActionDef, property: Property) -> std::result::Result<bool, String> {
    match def.value {
        None => Ok(true),
        Some(ref raw) => match parse_value(property, raw)? {
            Value::Bool(b) => Ok(b),
            other => Err(format!("expected a boolean, got {}", other)),
        },
    }
}

/// Convert a raw rule-file value into a typed value for a property.
fn parse_value(property: Property, raw: &serde_json::Value) -> std::result::Result<Value, String> {
    use serde_json::Value as Raw;
    match (property.value_kind(), raw) {
        (ValueKind::Alignment, Raw::String(s)) => s.parse::<Alignment>().map(Value::Alignment),
        (ValueKind::Text, Raw::String(s)) if !s.trim().is_empty() => Ok(Value::Text(s.clone())),
        (ValueKind::Number, Raw::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(Value::Number)
            .ok_or_else(|| format!("{} is not a non-negative number", n)),
        (ValueKind::Bool, Raw::Bool(b)) => Ok(Value::Bool(*b)),
        (ValueKind::Case, Raw::String(s)) => s.parse::<TextCase>().map(Value::Case),
        (kind, other) => Err(format!("expected a {:?} value, got {}", kind, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMERLY: &str = r#"{
        "version": "2024.1",
        "name": "Cover page",
        "rules": [{
            "id": "FORMERLY_LINE",
            "scope": "cover",
            "priority": 10,
            "selector": {"element": "paragraph", "text_contains": "formerly"},
            "checks": [
                {"property": "alignment", "expected": "center"},
                {"property": "font_name", "expected": "Arial"},
                {"property": "font_size", "expected": 14},
                {"property": "bold", "expected": true, "severity": "warning"}
            ],
            "fix_actions": [
                {"action": "set_alignment", "value": "center"},
                {"action": "set_font", "name": "Arial", "size": 14},
                {"action": "set_bold"}
            ]
        }]
    }"#;

    fn config_err(result: Result<Ruleset>) -> ConfigError {
        match result {
            Err(Error::Config(e)) => e,
            other => panic!("expected a configuration error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_load_json() {
        let rs = Ruleset::from_json_str(FORMERLY).unwrap();
        assert_eq!(rs.version(), "2024.1");
        assert_eq!(rs.metadata().name.as_deref(), Some("Cover page"));

        let rule = rs.rule("FORMERLY_LINE").unwrap();
        assert_eq!(rule.priority, 10);
        assert_eq!(rule.scope, "cover");
        assert_eq!(rule.checks.len(), 4);
        assert_eq!(rule.checks[3].severity, Severity::Warning);
        assert_eq!(
            rule.checks[2].comparator,
            Comparator::Approx { tolerance: 0.01 }
        );
        assert_eq!(rule.fix_actions[2], FixAction::SetBold(true));
        assert_eq!(rule.selector.text_contains.as_deref(), Some("formerly"));
    }

    #[test]
    fn test_load_yaml_with_positions() {
        let yaml = r#"
version: "3"
rules:
  - id: LAST_COLUMN_BOLD
    category: financial
    selector:
      element: cell
      position:
        column: -1
      within:
        table_index: 0
    checks:
      - property: column_width
        expected: 2.3
        tolerance: 0.05
    fixes:
      - action: set_column_width
        value: 2.3
  - id: TOP_ROWS
    selector:
      element: paragraph
      position:
        ordinals: "1-18"
      within: body
    checks:
      - property: text_case
        expected: upper
"#;
        let rs = Ruleset::from_yaml_str(yaml).unwrap();
        let last = rs.rule("LAST_COLUMN_BOLD").unwrap();
        assert_eq!(last.scope, "financial");
        assert_eq!(last.priority, LOWEST_PRIORITY);
        assert_eq!(last.selector.position, Some(Position::Column(-1)));
        assert_eq!(last.selector.within, Some(Containment::TableIndex(0)));
        assert_eq!(
            last.checks[0].comparator,
            Comparator::Approx { tolerance: 0.05 }
        );

        let top = rs.rule("TOP_ROWS").unwrap();
        assert_eq!(
            top.selector.position,
            Some(Position::Ordinals(OrdinalSelection::Range(0..=17)))
        );
        assert_eq!(top.checks[0].comparator, Comparator::Case);
        assert!(top.fix_actions.is_empty());
    }

    #[test]
    fn test_unknown_property() {
        let json = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "paragraph"},
            "checks": [{"property": "colour", "expected": "red"}]
        }]}"#;
        assert_eq!(
            config_err(Ruleset::from_json_str(json)),
            ConfigError::UnknownProperty {
                rule: "R1".into(),
                property: "colour".into()
            }
        );
    }

    #[test]
    fn test_duplicate_id_and_missing_selector() {
        let dup = r#"{"version": "1", "rules": [
            {"id": "R1", "selector": {"element": "run"}, "checks": [{"property": "bold", "expected": true}]},
            {"id": "R1", "selector": {"element": "run"}, "checks": [{"property": "bold", "expected": false}]}
        ]}"#;
        assert_eq!(
            config_err(Ruleset::from_json_str(dup)),
            ConfigError::DuplicateRuleId("R1".into())
        );

        let missing = r#"{"version": "1", "rules": [
            {"id": "R1", "checks": [{"property": "bold", "expected": true}]}
        ]}"#;
        assert_eq!(
            config_err(Ruleset::from_json_str(missing)),
            ConfigError::MissingSelector("R1".into())
        );
    }

    #[test]
    fn test_invalid_definitions() {
        let bad_action = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "run"},
            "checks": [{"property": "bold", "expected": true}],
            "fix_actions": [{"action": "set_colour", "value": "red"}]
        }]}"#;
        assert!(matches!(
            config_err(Ruleset::from_json_str(bad_action)),
            ConfigError::UnknownAction { .. }
        ));

        let bad_value = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "paragraph"},
            "checks": [{"property": "alignment", "expected": "diagonal"}]
        }]}"#;
        assert!(matches!(
            config_err(Ruleset::from_json_str(bad_value)),
            ConfigError::InvalidValue { .. }
        ));

        let bad_regex = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "run", "text_matches": "[0-9"},
            "checks": [{"property": "bold", "expected": true}]
        }]}"#;
        assert!(matches!(
            config_err(Ruleset::from_json_str(bad_regex)),
            ConfigError::InvalidSelector { .. }
        ));

        let bad_element = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "footnote"},
            "checks": [{"property": "bold", "expected": true}]
        }]}"#;
        assert!(matches!(
            config_err(Ruleset::from_json_str(bad_element)),
            ConfigError::UnknownElement { .. }
        ));

        let no_version = r#"{"rules": []}"#;
        assert_eq!(
            config_err(Ruleset::from_json_str(no_version)),
            ConfigError::MissingVersion
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "run"}, "prio": 3,
            "checks": [{"property": "bold", "expected": true}]
        }]}"#;
        assert!(matches!(Ruleset::from_json_str(json), Err(Error::Json(_))));
    }

    #[test]
    fn test_inapplicable_property() {
        let json = r#"{"version": "1", "rules": [{
            "id": "R1", "selector": {"element": "paragraph"},
            "checks": [{"property": "row_height", "expected": 0.37}],
            "fix_actions": [{"action": "set_row_height", "value": 0.37}]
        }]}"#;
        assert!(Ruleset::from_json_str(json).is_ok());

        let strict = LoadOptions::new().strict();
        assert!(matches!(
            config_err(Ruleset::from_json_str_with_options(json, &strict)),
            ConfigError::InapplicableProperty { .. }
        ));
    }

    #[test]
    fn test_from_path_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yml");
        std::fs::write(
            &path,
            "version: '1'\nrules:\n  - id: R1\n    selector: {element: run}\n    checks:\n      - {property: italic, expected: false}\n",
        )
        .unwrap();
        assert_eq!(Ruleset::from_path(&path).unwrap().len(), 1);

        let txt = dir.path().join("rules.txt");
        std::fs::write(&txt, "").unwrap();
        assert!(matches!(
            Ruleset::from_path(&txt),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
