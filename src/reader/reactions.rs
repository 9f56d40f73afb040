use crate::network::{
    ConcChan, ElementId, ElementKind, Info, MMEnz, Reac, Reaction as NetworkReaction,
};
use crate::reader::diagnostics::Stage;
use crate::reader::translate::Translator;
use crate::sbml::annotations::ObjectAnnotation;
use crate::sbml::document::{Reaction, SpeciesReference};
use crate::sbml::error::SBMLError;
use crate::sbml::units::{rate_scale, substance_scale};
use crate::sbml::utils::{display_name, element_name};
use crate::sbml::walker::collect_symbols;

/// Forward and backward rate constants of a kinetic law, in working units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RateConstants {
    pub kf: f64,
    pub kb: f64,
}

/// Order of one side of a reaction: the number of listed species, whatever their
/// stoichiometry.
fn order(references: &[SpeciesReference]) -> f64 {
    references.len() as f64
}

/// First reference whose stoichiometry cannot be connected.
pub(crate) fn unbounded_reference<'a>(
    references: impl IntoIterator<Item = &'a SpeciesReference>,
) -> Option<&'a SpeciesReference> {
    references
        .into_iter()
        .find(|reference| reference.multiplicity().is_none())
}

impl Translator<'_> {
    /// Creates all reactions of the model.
    ///
    /// Two-stage enzymes are accumulated and materialized first. Every other reaction is
    /// classified by its participants: a modifier makes it a Michaelis-Menten enzyme, or a
    /// concentration channel when annotated as such; all others become plain reactions.
    /// The original complex pools of materialized enzymes are deleted at the end.
    ///
    /// # Errors
    /// * `SBMLError::UndefinedSymbol` - A kinetic law refers to an unknown symbol
    pub(crate) fn build_reactions(&mut self) -> Result<(), SBMLError> {
        let (table, annotated) = self.accumulate_enzymes()?;
        let originals = self.materialize_enzymes(&table)?;

        let model = self.model;
        for (index, reaction) in model.reactions.iter().enumerate() {
            if annotated.contains(&index) {
                continue;
            }
            self.build_reaction(reaction)?;
        }

        let summary = self.network.summary(self.root);
        if summary.reactions + summary.mm_enzymes + summary.enzymes == 0 {
            self.diagnostics.warn(
                Stage::Reaction,
                "At least one reaction should be present in the model",
            );
        }

        for original in originals {
            if self.network.contains(original) {
                self.network.delete(original)?;
            }
        }

        Ok(())
    }

    fn build_reaction(&mut self, reaction: &Reaction) -> Result<(), SBMLError> {
        let name = display_name(reaction.name.as_deref(), &reaction.id);
        let annotation = ObjectAnnotation::read(reaction.annotation.as_deref(), &reaction.id)?;
        let kind = if annotation.channel { "channel" } else { "reaction" };

        if reaction.fast {
            self.diagnostics.warn(
                Stage::Reaction,
                format!("The fast attribute of reaction '{name}' is not handled"),
            );
        }

        if reaction.reactants.is_empty() || reaction.products.is_empty() {
            self.diagnostics.warn(
                Stage::Reaction,
                format!("{name}: substrate or product is missing, skipping this {kind}"),
            );
            return Ok(());
        }

        let participants = reaction
            .reactants
            .iter()
            .chain(&reaction.products)
            .map(|reference| reference.species.as_str())
            .chain(reaction.modifiers.iter().map(String::as_str));
        for species in participants {
            if !self.species.contains_key(species) {
                self.diagnostics.warn(
                    Stage::Reaction,
                    format!("{name}: species '{species}' is not defined, skipping this {kind}"),
                );
                return Ok(());
            }
        }

        if let Some(reference) = unbounded_reference(reaction.reactants.iter().chain(&reaction.products)) {
            self.diagnostics.warn(
                Stage::Reaction,
                format!(
                    "{name}: stoichiometry {} of '{}' is out of range, skipping this {kind}",
                    reference.stoichiometry, reference.species
                ),
            );
            return Ok(());
        }

        let orders = (order(&reaction.reactants), order(&reaction.products));
        let Some(constants) = self.rate_constants(reaction, orders)? else {
            return Ok(());
        };

        let substrates = self.participants(&reaction.reactants);
        let products = self.participants(&reaction.products);

        let (parent, payload) = match reaction.modifiers.first() {
            Some(modifier) if annotation.channel => {
                let pool = self.species[modifier.as_str()].element;
                let permeability = if reaction.kinetic_law.is_some() {
                    constants.kf
                } else {
                    annotation.permeability.unwrap_or(0.0)
                };
                (
                    pool,
                    NetworkReaction::Channel(ConcChan {
                        channel_pool: pool,
                        inputs: substrates,
                        outputs: products,
                        permeability,
                    }),
                )
            }
            Some(modifier) => {
                if reaction.reactants.len() > 1 || reaction.products.len() > 1 {
                    self.diagnostics.warn(
                        Stage::Reaction,
                        format!("{name}: enzymatic reaction has more than one substrate or product"),
                    );
                }
                let pool = self.species[modifier.as_str()].element;
                (
                    pool,
                    NetworkReaction::MichaelisMenten(MMEnz {
                        enzyme: pool,
                        substrates,
                        products,
                        kcat: constants.kf,
                        km: constants.kb,
                    }),
                )
            }
            None => {
                let container = match self.group_folder_of(&reaction.id) {
                    Some(folder) => folder,
                    None => self.reaction_compartment(reaction),
                };
                (
                    container,
                    NetworkReaction::Plain(Reac {
                        substrates,
                        products,
                        kf: constants.kf,
                        kb: constants.kb,
                    }),
                )
            }
        };

        let element_name = if self.network.child(parent, &name).is_some() {
            element_name(&reaction.id)
        } else {
            name
        };
        let element = self
            .network
            .create(parent, &element_name, ElementKind::Reaction(payload))?;

        let mut info = Info {
            notes: reaction.notes.clone(),
            ..Default::default()
        };
        annotation.apply(&mut info);
        self.network.set_info(element, info)?;

        Ok(())
    }

    /// Compartment of the last reactant, falling back to the first product.
    fn reaction_compartment(&self, reaction: &Reaction) -> ElementId {
        reaction
            .reactants
            .last()
            .or(reaction.products.first())
            .and_then(|reference| self.species.get(&reference.species))
            .map(|entry| entry.compartment)
            .unwrap_or(self.root)
    }

    /// Pools of the references, each repeated by its integer stoichiometry (at least once).
    fn participants(&self, references: &[SpeciesReference]) -> Vec<ElementId> {
        references
            .iter()
            .filter_map(|reference| {
                let entry = self.species.get(&reference.species)?;
                let count = reference.multiplicity()?.max(1);
                Some(std::iter::repeat_n(entry.element, count))
            })
            .flatten()
            .collect()
    }

    /// Extracts Kf and Kb from a reaction's kinetic law.
    ///
    /// The first parameter symbol met while walking the law becomes Kf, the second Kb.
    /// Each is scaled through the rate context of the unit resolver with the order of its
    /// side of the reaction.
    ///
    /// # Arguments
    /// * `reaction` - The SBML reaction
    /// * `orders` - Orders of the substrate and of the product side
    ///
    /// # Returns
    /// The constants, zero when the reaction has no kinetic law, or `None` when the law uses
    /// a construct that cannot be handled; a diagnostic is recorded in that case.
    ///
    /// # Errors
    /// * `SBMLError::UndefinedSymbol` - A symbol is neither parameter, species nor compartment
    pub(crate) fn rate_constants(
        &mut self,
        reaction: &Reaction,
        orders: (f64, f64),
    ) -> Result<Option<RateConstants>, SBMLError> {
        let model = self.model;
        let Some(law) = &reaction.kinetic_law else {
            return Ok(Some(RateConstants::default()));
        };
        let Some(math) = &law.math else {
            return Ok(Some(RateConstants::default()));
        };

        let scan = collect_symbols(math);
        if !scan.is_complete() {
            self.diagnostics.warn(
                Stage::Reaction,
                format!(
                    "Error in kinetic law of reaction '{}', skipping it: {}",
                    reaction.display_name(),
                    scan.message()
                ),
            );
            return Ok(None);
        }

        let scope = self.parameters.scope(model, Some(law));
        let mut positional = Vec::new();
        for symbol in &scan.symbols {
            if let Some(parameter) = scope.get(symbol) {
                positional.push(parameter.clone());
            } else if !(self.species.contains_key(symbol) || self.compartments.contains_key(symbol)) {
                return Err(SBMLError::UndefinedSymbol {
                    reaction: reaction.display_name().to_string(),
                    symbol: symbol.clone(),
                });
            }
        }

        let base = substance_scale(model.user_definition("substance").as_ref());
        let scaled = |index: usize, order: f64| {
            positional
                .get(index)
                .map(|parameter| {
                    parameter.value * rate_scale(parameter.units.as_ref(), order, base).factor
                })
                .unwrap_or(0.0)
        };

        Ok(Some(RateConstants {
            kf: scaled(0, orders.0),
            kb: scaled(1, orders.1),
        }))
    }
}
