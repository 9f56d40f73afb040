//! Consistency module for checking SBML documents before translation.
//!
//! This module validates the structure of an SBML document by checking:
//! - Presence of a model
//! - Uniqueness of compartment, species, reaction and parameter ids
//! - Compartment references of species
//! - Species references of reactions
//!
//! The main entry point is the `check_consistency` function which runs all validation
//! checks and returns a `Report` with the results.

use std::fmt;

use colored::Colorize;

use crate::sbml::document::SbmlDocument;
use crate::validation::identifiers::check_identifiers;
use crate::validation::references::{check_reaction_references, check_species_references};

/// Checks the consistency of an `SbmlDocument`.
///
/// # Arguments
///
/// * `document` - A reference to the `SbmlDocument` to be checked.
///
/// # Returns
///
/// Returns a `Report` containing the results of the consistency checks.
pub fn check_consistency(document: &SbmlDocument) -> Report {
    let mut report = Report::new();

    let Some(model) = &document.model else {
        report.add_result(ValidationResult::new(
            "/sbml".to_string(),
            "Document does not contain a model".to_string(),
            Severity::Error,
            None,
        ));
        return report;
    };

    check_identifiers(model, &mut report);
    check_species_references(model, &mut report);
    check_reaction_references(model, &mut report);

    report
}

/// The `Report` struct stores the results of the validation checks.
///
/// The document is considered invalid if any validation result has Error severity.
#[derive(Debug, serde::Serialize, Clone, Default)]
pub struct Report {
    /// Whether the document is valid overall. False if any errors were found.
    pub is_valid: bool,
    /// Individual validation results found during checks.
    pub errors: Vec<ValidationResult>,
}

impl Report {
    pub(crate) fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Adds a validation result to the report.
    ///
    /// If the result has Error severity, marks the overall report as invalid.
    pub fn add_result(&mut self, result: ValidationResult) {
        if result.severity == Severity::Error {
            self.is_valid = false;
        }
        self.errors.push(result);
    }

    /// Filters the results by the identifier of the offending object.
    pub fn filter_results(&self, identifier: &str) -> Vec<ValidationResult> {
        self.errors
            .iter()
            .filter(|result| result.identifier.as_deref() == Some(identifier))
            .cloned()
            .collect()
    }

    /// Plain-text listing of all error messages, one per line.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .filter(|result| result.severity == Severity::Error)
            .map(|result| format!("[{}] {}", result.location, result.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.errors {
            writeln!(f, "{result}")?;
        }
        Ok(())
    }
}

/// A single validation issue found during checking.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationResult {
    /// Path to the offending element, e.g. `/model/listOfSpecies/2`
    location: String,
    /// Human readable description of the validation issue
    message: String,
    severity: Severity,
    /// The identifier of the object, if any
    identifier: Option<String>,
}

impl ValidationResult {
    /// Creates a new `ValidationResult`.
    ///
    /// # Arguments
    ///
    /// * `location` - The location of the validation issue inside the document.
    /// * `message` - A message describing the validation issue.
    /// * `severity` - The severity of the validation issue.
    /// * `identifier` - The id of the offending object, if any.
    pub fn new(
        location: String,
        message: String,
        severity: Severity,
        identifier: Option<String>,
    ) -> Self {
        Self {
            location,
            message,
            severity,
            identifier,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    pub fn identifier(&self) -> &Option<String> {
        &self.identifier
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.severity {
            Severity::Error => self.message.bold().red(),
            Severity::Warning => self.message.bold().yellow(),
            Severity::Info => self.message.bold().green(),
        };

        write!(
            f,
            "[{}] {}:\n\t└── {}",
            self.location.bold(),
            self.severity.colored(),
            message
        )
    }
}

/// Severity levels for validation issues and translation diagnostics.
///
/// - Error: The document is invalid and should not be used
/// - Warning: Part of the document was skipped or needs review
/// - Info: Informational message
#[derive(Debug, Clone, PartialEq, Eq, Copy, serde::Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Severity label in its terminal color.
    pub fn colored(&self) -> colored::ColoredString {
        match self {
            Severity::Error => "Error".bold().red(),
            Severity::Warning => "Warning".bold().yellow(),
            Severity::Info => "Info".bold().green(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Info => write!(f, "Info"),
        }
    }
}
