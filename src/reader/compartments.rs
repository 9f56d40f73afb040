use crate::network::{Compartment, ElementKind, Info, MeshKind};
use crate::reader::diagnostics::Stage;
use crate::reader::translate::Translator;
use crate::sbml::annotations::{CompartmentAnnotation, MeshSpec};
use crate::sbml::error::SBMLError;
use crate::sbml::units::{resolve, UnitContext};
use crate::sbml::utils::display_name;

impl Translator<'_> {
    /// Creates one mesh per SBML compartment.
    ///
    /// The first compartment carrying a `basePath` annotation moves the creation root of all
    /// compartments below that folder chain. `EndoMesh` surrounds are resolved after every
    /// compartment exists.
    ///
    /// # Errors
    /// * `SBMLError::NoCompartments` - The model declares no compartment
    /// * `SBMLError::InvalidSpatialDimensions` - A compartment is not a 3-D volume
    /// * `SBMLError::MissingSurround` - An `EndoMesh` names no existing surround
    pub(crate) fn build_compartments(&mut self) -> Result<(), SBMLError> {
        let model = self.model;
        if model.compartments.is_empty() {
            return Err(SBMLError::NoCompartments);
        }

        let annotations = model
            .compartments
            .iter()
            .map(|compartment| {
                CompartmentAnnotation::read(compartment.annotation.as_deref(), &compartment.id)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut parent = self.root;
        let mut relocated = false;
        for base_path in annotations.iter().filter_map(|a| a.base_path.as_deref()) {
            let folder = self.network.ensure_path(self.root, base_path)?;
            if !relocated {
                parent = folder;
                relocated = true;
            }
        }

        let mut endo_surrounds = Vec::new();
        for (compartment, annotation) in model.compartments.iter().zip(annotations) {
            if compartment.spatial_dimensions != 3.0 {
                return Err(SBMLError::InvalidSpatialDimensions {
                    compartment: compartment.id.clone(),
                    dimensions: compartment.spatial_dimensions,
                });
            }

            let scale = resolve(
                model.compartment_units(compartment).as_ref(),
                UnitContext::Compartment,
            );
            let mesh = match annotation.mesh {
                MeshSpec::Cube => MeshKind::Cube,
                MeshSpec::Cylinder {
                    tot_length,
                    diff_length,
                } => MeshKind::Cylinder {
                    x1: tot_length,
                    diff_length,
                },
                MeshSpec::Endo { surround } => {
                    endo_surrounds.push((compartment.id.clone(), surround));
                    MeshKind::Endo { surround: None }
                }
            };

            let name = display_name(compartment.name.as_deref(), &compartment.id);
            let element = self.network.create(
                parent,
                &name,
                ElementKind::Compartment(Compartment {
                    sbml_id: compartment.id.clone(),
                    mesh,
                    volume: compartment.size.unwrap_or(0.0) * scale.factor,
                    spatial_dimensions: 3,
                    is_membrane_bound: annotation.is_membrane_bound,
                    num_diff_compts: annotation.num_diff_compts,
                }),
            )?;

            if let Some(notes) = &compartment.notes {
                self.network.set_info(
                    element,
                    Info {
                        notes: Some(notes.clone()),
                        ..Default::default()
                    },
                )?;
            }

            self.compartments.insert(compartment.id.clone(), element);
            if let Some(name) = &compartment.name {
                self.compartments.entry(name.clone()).or_insert(element);
            }
        }

        for (compartment_id, surround) in endo_surrounds {
            self.resolve_surround(&compartment_id, surround)?;
        }

        Ok(())
    }

    fn resolve_surround(&mut self, compartment_id: &str, surround: Option<String>) -> Result<(), SBMLError> {
        let Some(element) = self.compartments.get(compartment_id).copied() else {
            return Ok(());
        };

        let target = surround
            .as_deref()
            .and_then(|surround| self.compartments.get(surround).copied())
            .filter(|target| *target != element);

        match target {
            Some(target) => {
                if let MeshKind::Endo { surround } = &mut self.network.compartment_mut(element)?.mesh {
                    *surround = Some(target);
                }
                Ok(())
            }
            None => {
                self.network.delete(element)?;
                self.compartments.retain(|_, id| *id != element);
                self.diagnostics.warn(
                    Stage::Compartment,
                    format!(
                        "EndoMesh compartment '{compartment_id}' has a missing or wrong surrounding compartment, deleting it"
                    ),
                );

                Err(SBMLError::MissingSurround {
                    compartment: compartment_id.to_string(),
                    surround: surround.unwrap_or_default(),
                })
            }
        }
    }
}
