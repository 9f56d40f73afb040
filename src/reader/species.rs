use crate::network::{ElementKind, Info, Pool, PoolInit};
use crate::reader::diagnostics::Stage;
use crate::reader::translate::{SpeciesEntry, Translator};
use crate::sbml::annotations::ObjectAnnotation;
use crate::sbml::document::Species;
use crate::sbml::error::SBMLError;
use crate::sbml::units::{resolve, UnitContext};
use crate::sbml::utils::{display_name, element_name};

impl Translator<'_> {
    /// Creates one pool per SBML species.
    ///
    /// Boundary species become buffered pools. Species listed in a group collection are
    /// placed in the group folder, all others directly in their compartment.
    ///
    /// # Errors
    /// * `SBMLError::NoSpecies` - The model declares no species
    /// * `SBMLError::UnknownCompartment` - A species lives in a compartment that was not created
    /// * `SBMLError::MissingInitialValue` - A species has no initial value and no assignment rule
    pub(crate) fn build_species(&mut self) -> Result<(), SBMLError> {
        let model = self.model;
        if model.species.is_empty() {
            return Err(SBMLError::NoSpecies);
        }

        for species in &model.species {
            let Some(compartment) = self.compartments.get(&species.compartment).copied() else {
                return Err(SBMLError::UnknownCompartment {
                    species: species.id.clone(),
                    compartment: species.compartment.clone(),
                });
            };
            let parent = self.group_folder_of(&species.id).unwrap_or(compartment);

            let init = self.initial_value(species)?;
            let annotation = ObjectAnnotation::read(species.annotation.as_deref(), &species.id)?;

            let mut name = display_name(species.name.as_deref(), &species.id);
            if self.network.child(parent, &name).is_some() {
                name = element_name(&species.id);
            }

            let element = self.network.create(
                parent,
                &name,
                ElementKind::Pool(Pool {
                    species_id: species.id.clone(),
                    buffered: species.boundary_condition,
                    constant: species.constant,
                    only_substance_units: species.has_only_substance_units,
                    init,
                    diff_const: annotation.diff_constant.unwrap_or(0.0),
                    motor_const: annotation.motor_constant.unwrap_or(0.0),
                    compartment,
                }),
            )?;

            let mut info = Info {
                notes: species.notes.clone(),
                ..Default::default()
            };
            annotation.apply(&mut info);
            self.network.set_info(element, info)?;

            self.species.insert(
                species.id.clone(),
                SpeciesEntry {
                    element,
                    compartment,
                },
            );
        }

        Ok(())
    }

    /// Initial value of a species in working units.
    ///
    /// Amount-only species hold particle counts; all other species hold concentrations, an
    /// initial amount being divided by the declared size of the compartment first.
    fn initial_value(&mut self, species: &Species) -> Result<PoolInit, SBMLError> {
        let model = self.model;
        let amount_only = species.has_only_substance_units;
        let scale = resolve(
            model.species_units(species).as_ref(),
            UnitContext::Substance { amount_only },
        );

        match (species.initial_amount, species.initial_concentration, amount_only) {
            (Some(amount), _, true) => Ok(PoolInit::Count(amount * scale.factor)),
            (None, Some(concentration), true) => Ok(PoolInit::Count(concentration)),
            (Some(amount), _, false) => {
                let size = model
                    .compartment_by_id(&species.compartment)
                    .and_then(|compartment| compartment.size)
                    .unwrap_or(0.0);
                if size <= 0.0 {
                    self.diagnostics.warn(
                        Stage::Species,
                        format!(
                            "Species '{}' has an initial amount but compartment '{}' has no size, initial concentration set to 0",
                            species.id, species.compartment
                        ),
                    );
                    return Ok(PoolInit::Concentration(0.0));
                }
                Ok(PoolInit::Concentration(amount / size * scale.factor))
            }
            (None, Some(concentration), false) => {
                Ok(PoolInit::Concentration(concentration * scale.factor))
            }
            (None, None, _) if model.has_assignment_rule_for(&species.id) => Ok(if amount_only {
                PoolInit::Count(0.0)
            } else {
                PoolInit::Concentration(0.0)
            }),
            (None, None, _) => Err(SBMLError::MissingInitialValue(species.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::network::PoolInit;
    use crate::reader::translate::{read_sbml_str, ReadOptions};
    use crate::sbml::error::SBMLError;
    use crate::sbml::units::AVOGADRO;

    fn model(units: &str, species: &str) -> String {
        format!(
            r#"<sbml xmlns:moose="http://www.moose.ncbs.res.in" level="3" version="1"><model id="m">
              <listOfUnitDefinitions>{units}</listOfUnitDefinitions>
              <listOfCompartments><compartment id="cyt" size="2"/></listOfCompartments>
              <listOfSpecies>{species}</listOfSpecies>
            </model></sbml>"#
        )
    }

    #[test]
    fn test_concentrations_without_units_use_millimolar_default() {
        let xml = model(
            "",
            r#"<species id="A" compartment="cyt" initialConcentration="1.0"/>
               <species id="B" compartment="cyt" initialConcentration="2.0" boundaryCondition="true"/>"#,
        );

        let translation = read_sbml_str(&xml, &ReadOptions::default()).unwrap();
        let network = &translation.network;

        let a = network.pool(translation.lookup("cyt/A").unwrap()).unwrap();
        let b = network.pool(translation.lookup("cyt/B").unwrap()).unwrap();
        assert!(!a.buffered);
        assert!(b.buffered);
        assert_eq!(a.init, PoolInit::Concentration(1.0 * 1e-3));
        assert_eq!(b.init, PoolInit::Concentration(2.0 * 1e-3));
    }

    #[test]
    fn test_amount_only_species_become_counts() {
        let xml = model(
            "",
            r#"<species id="A" compartment="cyt" initialAmount="2" hasOnlySubstanceUnits="true"/>
               <species id="B" compartment="cyt" initialConcentration="7" hasOnlySubstanceUnits="true"/>"#,
        );

        let translation = read_sbml_str(&xml, &ReadOptions::default()).unwrap();
        let network = &translation.network;

        match network.pool(translation.lookup("cyt/A").unwrap()).unwrap().init {
            PoolInit::Count(n) => assert_relative_eq!(n, 2.0 * AVOGADRO, max_relative = 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            network.pool(translation.lookup("cyt/B").unwrap()).unwrap().init,
            PoolInit::Count(7.0)
        );
    }

    #[test]
    fn test_amount_is_divided_by_compartment_size() {
        let xml = model(
            r#"<unitDefinition id="substance"><listOfUnits><unit kind="mole" scale="-3"/></listOfUnits></unitDefinition>"#,
            r#"<species id="A" compartment="cyt" initialAmount="4"/>"#,
        );

        let translation = read_sbml_str(&xml, &ReadOptions::default()).unwrap();

        let pool = translation.network.pool(translation.lookup("cyt/A").unwrap()).unwrap();
        match pool.init {
            PoolInit::Concentration(conc) => assert_relative_eq!(conc, 2.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_species_without_value_or_rule_is_fatal() {
        let xml = model("", r#"<species id="X" compartment="cyt"/>"#);

        let failure = read_sbml_str(&xml, &ReadOptions::default()).unwrap_err();

        match &failure.error {
            SBMLError::MissingInitialValue(id) => assert_eq!(id, "X"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(failure.error.to_string().starts_with("Invalid SBML"));
    }

    #[test]
    fn test_species_display_info_from_annotation() {
        let xml = model(
            "",
            r#"<species id="A" name="ATP" compartment="cyt" initialConcentration="1">
                 <annotation><moose:ModelAnnotation><moose:xCord>10</moose:xCord><moose:yCord>20</moose:yCord><moose:diffConstant>1e-12</moose:diffConstant></moose:ModelAnnotation></annotation>
               </species>"#,
        );

        let translation = read_sbml_str(&xml, &ReadOptions::default()).unwrap();

        let atp = translation.lookup("cyt/ATP").unwrap();
        let element = translation.network.get(atp).unwrap();
        assert_eq!(element.info.x, Some(10.0));
        assert_eq!(element.info.y, Some(20.0));
        assert_eq!(translation.network.pool(atp).unwrap().diff_const, 1e-12);
    }

    #[test]
    fn test_model_without_species_is_fatal() {
        let xml = model("", "");
        let failure = read_sbml_str(&xml, &ReadOptions::default()).unwrap_err();
        assert!(matches!(failure.error, SBMLError::NoSpecies));
    }
}
