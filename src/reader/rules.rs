use itertools::Itertools;

use crate::network::{ElementKind, Function};
use crate::reader::diagnostics::Stage;
use crate::reader::translate::Translator;
use crate::sbml::document::Rule;
use crate::sbml::error::SBMLError;
use crate::sbml::mathml::Expr;
use crate::sbml::walker::collect_symbols;

/// Name of the function element created below a rule's target pool.
const FUNCTION_NAME: &str = "func";

impl Translator<'_> {
    /// Turns every assignment rule on a species into a function driving that pool.
    ///
    /// Rate and algebraic rules are reported and ignored. A rule whose math refers to
    /// anything but species and global parameters is skipped with a diagnostic.
    pub(crate) fn build_rules(&mut self) -> Result<(), SBMLError> {
        let model = self.model;
        for rule in &model.rules {
            match rule {
                Rule::Assignment { variable, math } => {
                    self.build_assignment(variable, math.as_ref())?
                }
                Rule::Rate { variable, .. } => self.diagnostics.warn(
                    Stage::Rule,
                    format!("Rate rule on '{variable}' is not handled"),
                ),
                Rule::Algebraic { .. } => self
                    .diagnostics
                    .warn(Stage::Rule, "Algebraic rule is not handled"),
            }
        }

        Ok(())
    }

    fn build_assignment(&mut self, variable: &str, math: Option<&Expr>) -> Result<(), SBMLError> {
        let Some(target) = self.species.get(variable).copied() else {
            self.diagnostics.warn(
                Stage::Rule,
                format!("Assignment rule on '{variable}' is not handled, only species can be assigned"),
            );
            return Ok(());
        };
        let Some(math) = math else {
            self.diagnostics.warn(
                Stage::Rule,
                format!("Assignment rule on '{variable}' has no math"),
            );
            return Ok(());
        };

        let scan = collect_symbols(math);
        if !scan.is_complete() {
            self.diagnostics.warn(
                Stage::Rule,
                format!("Assignment rule on '{variable}' is skipped: {}", scan.message()),
            );
            return Ok(());
        }

        let mut inputs = Vec::new();
        let mut undefined = Vec::new();
        let expr = math.render_with(&mut |symbol| {
            if let Some(parameter) = self.parameters.global(symbol) {
                format!("{}", parameter.value)
            } else if let Some(entry) = self.species.get(symbol) {
                inputs.push(*entry);
                format!("x{}", inputs.len() - 1)
            } else {
                undefined.push(symbol.to_string());
                symbol.to_string()
            }
        });

        if !undefined.is_empty() {
            self.diagnostics.warn(
                Stage::Rule,
                format!(
                    "Assignment rule on '{variable}' refers to undefined symbols {}, skipping it",
                    undefined.iter().unique().join(", ")
                ),
            );
            return Ok(());
        }

        if inputs
            .iter()
            .any(|input| input.compartment != target.compartment)
        {
            self.diagnostics.warn(
                Stage::Rule,
                format!("Assignment rule on '{variable}' reads species from several compartments"),
            );
        }

        if self.network.child(target.element, FUNCTION_NAME).is_some() {
            self.diagnostics.warn(
                Stage::Rule,
                format!("Species '{variable}' already has an assignment rule, ignoring the next one"),
            );
            return Ok(());
        }

        self.network.create(
            target.element,
            FUNCTION_NAME,
            ElementKind::Function(Function {
                expr,
                inputs: inputs.iter().map(|input| input.element).collect(),
                target: target.element,
            }),
        )?;

        Ok(())
    }
}
