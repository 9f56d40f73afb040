//! Non-fatal messages collected while translating a model.
//!
//! Every stage appends to one [`Diagnostics`] list. A diagnostic is also logged at `warn`
//! level the moment it is recorded, so a caller running with `RUST_LOG=warn` sees the same
//! messages in order.

use std::fmt;

use serde::Serialize;

use crate::validation::consistency::Severity;

/// Translation stage a diagnostic was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Validation,
    Compartment,
    Group,
    Species,
    Reaction,
    Rule,
    ModelInfo,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Validation => "validation",
            Stage::Compartment => "compartment",
            Stage::Group => "group",
            Stage::Species => "species",
            Stage::Reaction => "reaction",
            Stage::Rule => "rule",
            Stage::ModelInfo => "model info",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.severity, self.message)
    }
}

/// Ordered list of the diagnostics of one translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message and logs it.
    pub fn push(&mut self, stage: Stage, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => log::info!("{stage}: {message}"),
            Severity::Warning | Severity::Error => log::warn!("{stage}: {message}"),
        }

        self.0.push(Diagnostic {
            stage,
            severity,
            message,
        });
    }

    pub fn warn(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(stage, Severity::Warning, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics raised by one stage, in order.
    pub fn of_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |diagnostic| diagnostic.stage == stage)
    }

    /// Whether any message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|diagnostic| diagnostic.message.contains(needle))
    }
}

/// Messages joined by newlines, without stage or severity.
impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self
            .0
            .iter()
            .map(|diagnostic| diagnostic.message.as_str())
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join("\n"))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
