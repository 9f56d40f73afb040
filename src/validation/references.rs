use crate::sbml::document::{Model, Reaction};
use crate::validation::consistency::{Report, Severity, ValidationResult};

/// Checks that every species lives in a declared compartment
pub fn check_species_references(model: &Model, report: &mut Report) {
    for (species_idx, species) in model.species.iter().enumerate() {
        if model.compartment_by_id(&species.compartment).is_none() {
            report.add_result(ValidationResult::new(
                format!("/model/listOfSpecies/{species_idx}"),
                format!(
                    "Species '{}' refers to compartment '{}', which is not defined in the model.",
                    species.id, species.compartment
                ),
                Severity::Error,
                Some(species.id.clone()),
            ));
        }
    }
}

/// Checks that reactants, products and modifiers of every reaction are declared species
pub fn check_reaction_references(model: &Model, report: &mut Report) {
    for (reaction_idx, reaction) in model.reactions.iter().enumerate() {
        check_reaction_species(model, report, reaction, reaction_idx);
    }
}

fn check_reaction_species(model: &Model, report: &mut Report, reaction: &Reaction, reaction_idx: usize) {
    let references = reaction
        .reactants
        .iter()
        .map(|reference| ("listOfReactants", reference.species.as_str()))
        .chain(
            reaction
                .products
                .iter()
                .map(|reference| ("listOfProducts", reference.species.as_str())),
        )
        .chain(
            reaction
                .modifiers
                .iter()
                .map(|modifier| ("listOfModifiers", modifier.as_str())),
        );

    for (list, species) in references {
        if model.species_by_id(species).is_none() {
            report.add_result(ValidationResult::new(
                format!("/model/listOfReactions/{reaction_idx}/{list}"),
                format!(
                    "Species '{species}' in reaction '{}' is not defined in the model.",
                    reaction.id
                ),
                Severity::Error,
                Some(reaction.id.clone()),
            ));
        }
    }
}
