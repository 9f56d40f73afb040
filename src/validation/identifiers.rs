use std::collections::HashMap;

use crate::sbml::document::Model;
use crate::validation::consistency::{Report, Severity, ValidationResult};

/// Checks that compartment, species, reaction and parameter ids are unique across the model
///
/// # Arguments
/// * `model` - The SBML model to check
/// * `report` - Validation report to add any errors to
///
/// # Details
/// SBML shares one id namespace between these components. Every id that is declared more
/// than once is reported at each of its later declarations.
pub fn check_identifiers(model: &Model, report: &mut Report) {
    let declared = model
        .compartments
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.id.as_str(), format!("/model/listOfCompartments/{idx}")))
        .chain(
            model
                .species
                .iter()
                .enumerate()
                .map(|(idx, s)| (s.id.as_str(), format!("/model/listOfSpecies/{idx}"))),
        )
        .chain(
            model
                .reactions
                .iter()
                .enumerate()
                .map(|(idx, r)| (r.id.as_str(), format!("/model/listOfReactions/{idx}"))),
        )
        .chain(
            model
                .parameters
                .iter()
                .enumerate()
                .map(|(idx, p)| (p.id.as_str(), format!("/model/listOfParameters/{idx}"))),
        );

    let mut seen: HashMap<&str, String> = HashMap::new();
    for (id, location) in declared {
        match seen.get(id) {
            Some(first) => report.add_result(ValidationResult::new(
                location,
                format!("Identifier '{id}' is already declared at {first}"),
                Severity::Error,
                Some(id.to_string()),
            )),
            None => {
                seen.insert(id, location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbml::document::SbmlDocument;

    #[test]
    fn test_duplicate_ids_across_components() {
        let document = SbmlDocument::parse(
            r#"<sbml level="3" version="1"><model>
                <listOfCompartments><compartment id="cell" size="1"/></listOfCompartments>
                <listOfSpecies><species id="A" compartment="cell" initialConcentration="1"/></listOfSpecies>
                <listOfParameters><parameter id="A" value="2"/></listOfParameters>
            </model></sbml>"#,
        )
        .unwrap();
        let model = document.model.unwrap();
        let mut report = Report::new();

        check_identifiers(&model, &mut report);

        assert!(!report.is_valid);
        let results = report.filter_results("A");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location(), "/model/listOfParameters/0");
    }

    #[test]
    fn test_unique_ids_pass() {
        let document = SbmlDocument::parse(
            r#"<sbml level="3" version="1"><model>
                <listOfCompartments><compartment id="cell" size="1"/></listOfCompartments>
                <listOfSpecies><species id="A" compartment="cell" initialConcentration="1"/></listOfSpecies>
            </model></sbml>"#,
        )
        .unwrap();
        let mut report = Report::new();

        check_identifiers(&document.model.unwrap(), &mut report);

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }
}
