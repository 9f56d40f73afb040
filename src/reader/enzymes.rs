//! Two-stage enzymatic reactions.
//!
//! An enzyme written by MOOSE is stored in SBML as two reactions sharing a group name:
//! stage 1 binds enzyme and substrates into a complex, stage 2 breaks the complex down into
//! enzyme and products. Both halves are accumulated in an [`EnzymeTable`] first; a group
//! becomes one `Enz` element only once both halves are known, i.e. its stage total is 3.

use std::collections::HashMap;

use crate::network::{ElementId, ElementKind, Enz, Info, Reaction};
use crate::reader::diagnostics::Stage;
use crate::reader::reactions::unbounded_reference;
use crate::reader::translate::Translator;
use crate::sbml::annotations::{EnzymaticAnnotation, EnzymeStage, ObjectAnnotation};
use crate::sbml::document::SpeciesReference;
use crate::sbml::error::SBMLError;
use crate::sbml::utils::{display_name, element_name};

/// What stage 1 contributes to an enzyme.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Binding {
    pub enzyme: String,
    pub substrates: Vec<String>,
    /// Reactants of the stage-1 reaction with their stoichiometries
    pub reactants: Vec<SpeciesReference>,
    pub k1: f64,
    pub k2: f64,
}

/// What stage 2 contributes to an enzyme.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Breakdown {
    pub complex: String,
    pub products: Vec<String>,
    /// Products of the stage-2 reaction with their stoichiometries
    pub product_references: Vec<SpeciesReference>,
    pub k3: f64,
    /// Index of the stage-2 reaction in the model
    pub reaction: usize,
}

/// Accumulated knowledge about one enzyme group.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum EnzymeGroupState {
    #[default]
    NoInfo,
    Binding(Binding),
    Breakdown(Breakdown),
    Materializable(Binding, Breakdown),
}

impl EnzymeGroupState {
    /// Sum of the stages seen so far; 3 once both are known.
    pub fn stage_total(&self) -> u8 {
        match self {
            EnzymeGroupState::NoInfo => 0,
            EnzymeGroupState::Binding(_) => EnzymeStage::Binding.value(),
            EnzymeGroupState::Breakdown(_) => EnzymeStage::Breakdown.value(),
            EnzymeGroupState::Materializable(..) => {
                EnzymeStage::Binding.value() + EnzymeStage::Breakdown.value()
            }
        }
    }

    /// Records stage 1. A repeated stage replaces what was recorded before.
    pub fn with_binding(self, binding: Binding) -> Self {
        match self {
            EnzymeGroupState::Breakdown(breakdown) | EnzymeGroupState::Materializable(_, breakdown) => {
                EnzymeGroupState::Materializable(binding, breakdown)
            }
            EnzymeGroupState::NoInfo | EnzymeGroupState::Binding(_) => EnzymeGroupState::Binding(binding),
        }
    }

    /// Records stage 2. A repeated stage replaces what was recorded before.
    pub fn with_breakdown(self, breakdown: Breakdown) -> Self {
        match self {
            EnzymeGroupState::Binding(binding) | EnzymeGroupState::Materializable(binding, _) => {
                EnzymeGroupState::Materializable(binding, breakdown)
            }
            EnzymeGroupState::NoInfo | EnzymeGroupState::Breakdown(_) => {
                EnzymeGroupState::Breakdown(breakdown)
            }
        }
    }
}

/// Enzyme groups keyed by group name, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EnzymeTable {
    order: Vec<String>,
    groups: HashMap<String, EnzymeGroupState>,
}

impl EnzymeTable {
    fn update(&mut self, group: &str, apply: impl FnOnce(EnzymeGroupState) -> EnzymeGroupState) {
        if !self.groups.contains_key(group) {
            self.order.push(group.to_string());
        }
        let state = self.groups.remove(group).unwrap_or_default();
        self.groups.insert(group.to_string(), apply(state));
    }

    pub fn record_binding(&mut self, group: &str, binding: Binding) {
        self.update(group, |state| state.with_binding(binding));
    }

    pub fn record_breakdown(&mut self, group: &str, breakdown: Breakdown) {
        self.update(group, |state| state.with_breakdown(breakdown));
    }

    pub fn state(&self, group: &str) -> Option<&EnzymeGroupState> {
        self.groups.get(group)
    }

    /// Complete groups ordered by their stage-2 reaction.
    pub fn materializable(&self) -> Vec<(&str, &Binding, &Breakdown)> {
        let mut complete = self
            .order
            .iter()
            .filter_map(|name| match self.groups.get(name) {
                Some(EnzymeGroupState::Materializable(binding, breakdown)) => {
                    Some((name.as_str(), binding, breakdown))
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        complete.sort_by_key(|(_, _, breakdown)| breakdown.reaction);
        complete
    }

    /// Names of groups that never reached a stage total of 3.
    pub fn incomplete(&self) -> Vec<(&str, u8)> {
        self.order
            .iter()
            .filter_map(|name| {
                let total = self.groups.get(name)?.stage_total();
                (total != 3).then_some((name.as_str(), total))
            })
            .collect()
    }
}

impl Translator<'_> {
    /// Records the stage of every reaction carrying an enzymatic annotation.
    ///
    /// # Returns
    /// The filled table and the indices of all annotated reactions; those reactions are
    /// not translated on their own.
    pub(crate) fn accumulate_enzymes(&mut self) -> Result<(EnzymeTable, Vec<usize>), SBMLError> {
        let mut table = EnzymeTable::default();
        let mut annotated = Vec::new();

        let model = self.model;
        for (index, reaction) in model.reactions.iter().enumerate() {
            let Some(annotation) =
                EnzymaticAnnotation::read(reaction.annotation.as_deref(), &reaction.id)?
            else {
                continue;
            };
            annotated.push(index);

            let Some(stage) = annotation.stage else {
                self.diagnostics.warn(
                    Stage::Reaction,
                    format!(
                        "Enzymatic reaction '{}' has no stage 1 or 2, skipping it",
                        reaction.id
                    ),
                );
                continue;
            };

            if let Some(reference) =
                unbounded_reference(reaction.reactants.iter().chain(&reaction.products))
            {
                self.diagnostics.warn(
                    Stage::Reaction,
                    format!(
                        "Enzymatic reaction '{}': stoichiometry {} of '{}' is out of range, skipping it",
                        reaction.id, reference.stoichiometry, reference.species
                    ),
                );
                continue;
            }

            let orders = (
                annotation.substrates.len() as f64,
                annotation.products.len() as f64,
            );
            let Some(constants) = self.rate_constants(reaction, orders)? else {
                continue;
            };

            match stage {
                EnzymeStage::Binding => {
                    let Some(enzyme) = annotation.enzyme else {
                        self.diagnostics.warn(
                            Stage::Reaction,
                            format!("Enzymatic reaction '{}' does not name its enzyme", reaction.id),
                        );
                        continue;
                    };
                    table.record_binding(
                        &annotation.group_name,
                        Binding {
                            enzyme,
                            substrates: annotation.substrates,
                            reactants: reaction.reactants.clone(),
                            k1: constants.kf,
                            k2: constants.kb,
                        },
                    );
                }
                EnzymeStage::Breakdown => {
                    let Some(complex) = annotation.complex else {
                        self.diagnostics.warn(
                            Stage::Reaction,
                            format!("Enzymatic reaction '{}' does not name its complex", reaction.id),
                        );
                        continue;
                    };
                    table.record_breakdown(
                        &annotation.group_name,
                        Breakdown {
                            complex,
                            products: annotation.products,
                            product_references: reaction.products.clone(),
                            k3: constants.kf,
                            reaction: index,
                        },
                    );
                }
            }
        }

        Ok((table, annotated))
    }

    /// Creates one `Enz` per complete group.
    ///
    /// # Returns
    /// The original complex pools, to be deleted once all reactions exist
    pub(crate) fn materialize_enzymes(&mut self, table: &EnzymeTable) -> Result<Vec<ElementId>, SBMLError> {
        let mut originals = Vec::new();

        for (group, total) in table.incomplete() {
            self.diagnostics.warn(
                Stage::Reaction,
                format!(
                    "Enzyme '{group}' is missing its {} stage and is not created",
                    if total == 1 { "complex breakdown" } else { "substrate binding" }
                ),
            );
        }

        let model = self.model;
        for (group, binding, breakdown) in table.materializable() {
            let stage2 = &model.reactions[breakdown.reaction];
            let (Some(enzyme), Some(complex)) = (
                self.species.get(&binding.enzyme).copied(),
                self.species.get(&breakdown.complex).copied(),
            ) else {
                self.diagnostics.warn(
                    Stage::Reaction,
                    format!("Enzyme '{group}' refers to an unknown enzyme or complex species"),
                );
                continue;
            };

            let substrates = match self.connections(&binding.substrates, &binding.reactants, None) {
                Ok(substrates) => substrates,
                Err(missing) => {
                    self.unknown_participant(group, &missing);
                    continue;
                }
            };
            let products = match self.connections(
                &breakdown.products,
                &breakdown.product_references,
                Some(&binding.enzyme),
            ) {
                Ok(products) => products,
                Err(missing) => {
                    self.unknown_participant(group, &missing);
                    continue;
                }
            };

            let mut name = display_name(stage2.name.as_deref(), &stage2.id);
            if self.network.child(enzyme.element, &name).is_some() {
                name = element_name(&stage2.id);
            }

            let placeholder = ElementKind::Reaction(Reaction::Enzyme(Enz {
                enzyme: enzyme.element,
                complex: complex.element,
                substrates: Vec::new(),
                products: Vec::new(),
                conc_k1: binding.k1,
                k2: binding.k2,
                k3: breakdown.k3,
                ratio: 4.0,
            }));
            let enz = self.network.create(enzyme.element, &name, placeholder)?;

            let complex_name = self.network.get(complex.element)?.name.clone();
            let copied = match self.network.child(enz, &complex_name) {
                Some(existing) => existing,
                None => self.network.copy(complex.element, enz)?,
            };
            if !originals.contains(&complex.element) {
                originals.push(complex.element);
            }
            if let Some(entry) = self.species.get_mut(&breakdown.complex) {
                entry.element = copied;
            }

            if let ElementKind::Reaction(Reaction::Enzyme(payload)) = &mut self.network.get_mut(enz)?.kind {
                payload.complex = copied;
                payload.substrates = substrates;
                payload.products = products;
            }

            let annotation = ObjectAnnotation::read(stage2.annotation.as_deref(), &stage2.id)?;
            let mut info = Info {
                notes: stage2.notes.clone(),
                ..Default::default()
            };
            annotation.apply(&mut info);
            self.network.set_info(enz, info)?;

            log::debug!("Created enzyme {}", self.network.path(enz));
        }

        Ok(originals)
    }

    /// Pools of the annotated participants, each repeated by its stoichiometry in the stage
    /// reaction (1 when the reaction does not list it).
    ///
    /// With `parent` set, a participant that is the enzyme pool itself is connected one time
    /// less, since the enzyme is already linked to its parent.
    fn connections(
        &self,
        participants: &[String],
        references: &[SpeciesReference],
        parent: Option<&str>,
    ) -> Result<Vec<ElementId>, String> {
        let mut connected = Vec::new();

        for participant in participants {
            let entry = self
                .species
                .get(participant)
                .ok_or_else(|| participant.clone())?;

            let mut count = references
                .iter()
                .find(|reference| &reference.species == participant)
                .and_then(SpeciesReference::multiplicity)
                .unwrap_or(1);
            if parent == Some(participant.as_str()) && count > 1 {
                count -= 1;
            }

            connected.extend(std::iter::repeat_n(entry.element, count));
        }

        Ok(connected)
    }

    fn unknown_participant(&mut self, group: &str, species: &str) {
        self.diagnostics.warn(
            Stage::Reaction,
            format!("Enzyme '{group}' refers to unknown species '{species}' and is not created"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::translate::{read_sbml_str, ReadOptions};

    /// Enzyme `E` turning `S` into `P`, with `stage` spliced into the breakdown annotation
    /// and `products` as the stage-2 product references.
    fn enzyme_model(stage: &str, products: &str) -> String {
        format!(
            r#"<sbml xmlns:moose="http://www.moose.ncbs.res.in" level="3" version="1"><model id="m">
              <listOfCompartments><compartment id="cyt" size="1e-15"/></listOfCompartments>
              <listOfSpecies>
                <species id="E" compartment="cyt" initialConcentration="1"/>
                <species id="S" compartment="cyt" initialConcentration="1"/>
                <species id="P" compartment="cyt" initialConcentration="0"/>
                <species id="ES" compartment="cyt" initialConcentration="0"/>
              </listOfSpecies>
              <listOfReactions>
                <reaction id="bind">
                  <annotation><moose:EnzymaticReaction>
                    <moose:enzyme>E</moose:enzyme>
                    <moose:substrates>S</moose:substrates>
                    <moose:product>ES</moose:product>
                    <moose:groupName>E_enz</moose:groupName>
                    <moose:stage>1</moose:stage>
                  </moose:EnzymaticReaction></annotation>
                  <listOfReactants>
                    <speciesReference species="E"/>
                    <speciesReference species="S"/>
                  </listOfReactants>
                  <listOfProducts><speciesReference species="ES"/></listOfProducts>
                </reaction>
                <reaction id="release" name="E_enz">
                  <annotation><moose:EnzymaticReaction>
                    <moose:complex>ES</moose:complex>
                    <moose:product>E</moose:product>
                    <moose:product>P</moose:product>
                    <moose:groupName>E_enz</moose:groupName>
                    <moose:stage>{stage}</moose:stage>
                  </moose:EnzymaticReaction></annotation>
                  <listOfReactants><speciesReference species="ES"/></listOfReactants>
                  <listOfProducts>{products}</listOfProducts>
                </reaction>
              </listOfReactions>
            </model></sbml>"#
        )
    }

    #[test]
    fn test_enzyme_product_is_connected_once_less() {
        let xml = enzyme_model(
            "2",
            r#"<speciesReference species="E" stoichiometry="2"/>
               <speciesReference species="P" stoichiometry="3"/>"#,
        );

        let translation = read_sbml_str(&xml, &ReadOptions::default()).unwrap();

        let enzyme = translation.lookup("cyt/E").unwrap();
        let product = translation.lookup("cyt/P").unwrap();
        let enz = translation.lookup("cyt/E/E_enz").unwrap();
        let Ok(Reaction::Enzyme(payload)) = translation.network.reaction(enz) else {
            panic!("expected an enzyme");
        };
        assert_eq!(payload.products, vec![enzyme, product, product, product]);
        assert_eq!(payload.products.iter().filter(|id| **id == enzyme).count(), 1);
        assert_eq!(payload.substrates, vec![translation.lookup("cyt/S").unwrap()]);
    }

    #[test]
    fn test_unknown_stage_skips_reaction() {
        let xml = enzyme_model("5", r#"<speciesReference species="E"/><speciesReference species="P"/>"#);

        let translation = read_sbml_str(&xml, &ReadOptions::default()).unwrap();

        assert!(translation.lookup("cyt/E/E_enz").is_none());
        assert!(translation.lookup("cyt/release").is_none());
        assert!(translation.lookup("cyt/E_enz").is_none());
        assert!(translation.diagnostics.mentions("no stage 1 or 2"));
        assert!(translation.diagnostics.mentions("complex breakdown"));
    }

    fn binding() -> Binding {
        Binding {
            enzyme: "E".to_string(),
            substrates: vec!["S".to_string()],
            reactants: vec![],
            k1: 1.0,
            k2: 2.0,
        }
    }

    fn breakdown(reaction: usize) -> Breakdown {
        Breakdown {
            complex: "ES".to_string(),
            products: vec!["P".to_string()],
            product_references: vec![],
            k3: 3.0,
            reaction,
        }
    }

    #[test]
    fn test_stage_total_reaches_three_only_with_both_stages() {
        let state = EnzymeGroupState::NoInfo;
        assert_eq!(state.stage_total(), 0);

        let state = state.with_binding(binding());
        assert_eq!(state.stage_total(), 1);

        let state = state.with_binding(binding());
        assert_eq!(state.stage_total(), 1);

        let state = state.with_breakdown(breakdown(1));
        assert_eq!(state.stage_total(), 3);
        assert!(matches!(state, EnzymeGroupState::Materializable(..)));
    }

    #[test]
    fn test_breakdown_before_binding_is_materializable() {
        let state = EnzymeGroupState::NoInfo.with_breakdown(breakdown(0));
        assert_eq!(state.stage_total(), 2);
        assert_eq!(state.with_binding(binding()).stage_total(), 3);
    }

    #[test]
    fn test_table_orders_complete_groups_by_stage_two() {
        let mut table = EnzymeTable::default();
        table.record_binding("first", binding());
        table.record_binding("second", binding());
        table.record_breakdown("second", breakdown(3));
        table.record_breakdown("first", breakdown(5));
        table.record_binding("stuck", binding());

        let names = table
            .materializable()
            .into_iter()
            .map(|(name, _, _)| name)
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(table.incomplete(), vec![("stuck", 1)]);
        assert_eq!(table.state("stuck").map(EnzymeGroupState::stage_total), Some(1));
    }
}
