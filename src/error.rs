//! Error types for docrule.
//!
//! Only configuration problems (and the I/O around loading inputs) are
//! errors. Per-element outcomes of a pass such as failed or overridden
//! fixes are recorded on violations, never raised.

use std::io;
use thiserror::Error;

/// Result type alias for docrule operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading inputs or rendering output.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON input.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML input.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The ruleset is invalid and was rejected before any document was touched.
    #[error("Invalid ruleset: {0}")]
    Config(#[from] ConfigError),

    /// The document model violates a structural invariant.
    #[error("Invalid document model: {0}")]
    Model(String),

    /// The file extension is not a recognized ruleset or document format.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Error while rendering a report.
    #[error("Rendering error: {0}")]
    Render(String),
}

/// Load-time configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The ruleset has no version identifier.
    #[error("ruleset version must not be empty")]
    MissingVersion,

    /// A rule has an empty id.
    #[error("rule #{0} has an empty id")]
    EmptyRuleId(usize),

    /// Two rules share an id.
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),

    /// A rule has no selector.
    #[error("rule '{0}' has no selector")]
    MissingSelector(String),

    /// A rule has no checks.
    #[error("rule '{0}' has no checks")]
    NoChecks(String),

    /// A check names a property outside the closed vocabulary.
    #[error("rule '{rule}': unknown property '{property}'")]
    UnknownProperty { rule: String, property: String },

    /// A selector names an unknown element type.
    #[error("rule '{rule}': unknown element type '{element}'")]
    UnknownElement { rule: String, element: String },

    /// A fix action uses an unknown verb.
    #[error("rule '{rule}': unknown fix action '{action}'")]
    UnknownAction { rule: String, action: String },

    /// An expected value or fix target does not fit the property.
    #[error("rule '{rule}': invalid value for {property}: {reason}")]
    InvalidValue {
        rule: String,
        property: String,
        reason: String,
    },

    /// A comparator cannot be used with the property.
    #[error("rule '{rule}': comparator '{comparator}' cannot be used with {property}")]
    InvalidComparator {
        rule: String,
        comparator: String,
        property: String,
    },

    /// A property is checked on an element kind it does not apply to.
    #[error("rule '{rule}': property {property} does not apply to {element} elements")]
    InapplicableProperty {
        rule: String,
        property: String,
        element: String,
    },

    /// A selector predicate is malformed.
    #[error("rule '{rule}': invalid selector: {reason}")]
    InvalidSelector { rule: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config(ConfigError::DuplicateRuleId("COVER_TITLE".into()));
        assert_eq!(
            err.to_string(),
            "Invalid ruleset: duplicate rule id 'COVER_TITLE'"
        );

        let err = ConfigError::UnknownProperty {
            rule: "R1".into(),
            property: "colour".into(),
        };
        assert_eq!(err.to_string(), "rule 'R1': unknown property 'colour'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
