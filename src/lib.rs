//! # docrule
//!
//! Rule-based validation and auto-correction of document formatting.
//!
//! Documents arrive already parsed into a [`Document`] model (sections of
//! paragraphs and tables). A versioned [`Ruleset`] says which elements must
//! have which formatting; the engine reports every violation, applies the
//! rules' fixes, re-validates the result and summarizes it in a [`Report`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use docrule::{load_document, Engine, Ruleset};
//!
//! fn main() -> docrule::Result<()> {
//!     let ruleset = Ruleset::from_path("rules.yaml")?;
//!     let document = load_document("annual_report.json")?;
//!
//!     let output = Engine::new(&ruleset).process(document);
//!     println!("{}", docrule::report::to_text(&output.report));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Declarative rules**: JSON or YAML rulesets with selectors, checks and fix actions
//! - **Deterministic**: identical inputs give identical violation lists
//! - **Conflict policy**: rule priority, then ruleset order, decides competing fixes
//! - **Self-checking**: every correction is re-validated
//! - **Parallel batches**: independent documents are processed with Rayon

pub mod engine;
pub mod error;
pub mod model;
pub mod report;
pub mod rules;

// Re-export commonly used types
pub use engine::{
    correct, process_batch, select, validate, Correction, Corrector, Engine, EngineOptions,
    Outcome, ProcessOutput, Validation, Validator, Violation,
};
pub use error::{ConfigError, Error, Result};
pub use model::{
    Alignment, Block, CellMargins, Document, ElementKind, ElementPath, Metadata, Paragraph, Run,
    Section, Table, TableCell, TableRow,
};
pub use report::{JsonFormat, Report, Status, Summary};
pub use rules::{
    Check, Comparator, FixAction, LoadOptions, Property, Rule, Ruleset, Selector, Severity,
    TextCase, Value,
};

use std::path::Path;

/// Load a document model from a JSON file.
///
/// # Example
///
/// ```no_run
/// use docrule::load_document;
///
/// let doc = load_document("report.json").unwrap();
/// println!("{}", doc.plain_text());
/// ```
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    document_from_json(&content)
}

/// Load a document model from a JSON file without blocking the async runtime.
#[cfg(feature = "async")]
pub async fn load_document_async<P: AsRef<Path>>(path: P) -> Result<Document> {
    let content = tokio::fs::read_to_string(path).await?;
    document_from_json(&content)
}

/// Parse a document model from JSON and check its structural invariants.
pub fn document_from_json(json: &str) -> Result<Document> {
    let document: Document = serde_json::from_str(json)?;
    document.check_invariants().map_err(Error::Model)?;
    Ok(document)
}

/// Serialize a document model to JSON.
pub fn document_to_json(document: &Document, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(document),
        JsonFormat::Compact => serde_json::to_string(document),
    };
    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Validate, correct and re-validate a document with every enabled rule.
///
/// # Example
///
/// ```no_run
/// use docrule::{load_document, process, Ruleset};
///
/// let ruleset = Ruleset::from_path("rules.json").unwrap();
/// let output = process(load_document("report.json").unwrap(), &ruleset);
/// assert!(output.report.summary.reconciles());
/// ```
pub fn process(document: Document, ruleset: &Ruleset) -> ProcessOutput {
    Engine::new(ruleset).process(document)
}
