use crate::network::Info;
use crate::reader::diagnostics::Stage;
use crate::reader::translate::{GroupEntry, Translator};
use crate::sbml::annotations::GroupAnnotation;
use crate::sbml::error::SBMLError;
use crate::sbml::utils::{display_name, element_name};

impl Translator<'_> {
    /// Creates a folder for every annotated group and records the members of collections.
    ///
    /// A group folder lives at `compartment/[Group/]name`. Groups whose compartment cannot be
    /// resolved are reported and skipped; they never affect placement.
    pub(crate) fn build_groups(&mut self) -> Result<(), SBMLError> {
        for group in &self.model.groups {
            let label = group
                .id
                .as_deref()
                .or(group.name.as_deref())
                .unwrap_or("<unnamed>")
                .to_string();
            let Some(annotation) = GroupAnnotation::read(group.annotation.as_deref(), &label) else {
                if group.kind.as_deref() == Some("collection") {
                    self.diagnostics.warn(
                        Stage::Group,
                        format!("Group '{label}' has no placement annotation and is ignored"),
                    );
                }
                continue;
            };

            let compartment = annotation
                .compartment
                .as_deref()
                .and_then(|compartment| self.compartments.get(compartment).copied());
            let Some(compartment) = compartment else {
                self.diagnostics.warn(
                    Stage::Group,
                    format!(
                        "Compartment '{}' of group '{label}' not found in the model",
                        annotation.compartment.as_deref().unwrap_or_default()
                    ),
                );
                continue;
            };

            let name = match (group.name.as_deref(), group.id.as_deref()) {
                (None, None) => {
                    self.diagnostics
                        .warn(Stage::Group, "Group without name and id is ignored");
                    continue;
                }
                (name, id) => display_name(name, id.unwrap_or_default()),
            };

            let relative = match &annotation.group {
                Some(parent) => format!("{}/{name}", element_name(parent)),
                None => name,
            };
            let folder = self.network.ensure_path(compartment, &relative)?;
            self.network.set_info(
                folder,
                Info {
                    color: annotation.color.clone(),
                    text_color: annotation.text_color.clone(),
                    ..Default::default()
                },
            )?;

            if group.kind.as_deref() == Some("collection") {
                if let Some(id) = &group.id {
                    if !self.groups.iter().any(|entry| &entry.id == id) {
                        self.groups.push(GroupEntry {
                            id: id.clone(),
                            folder,
                            members: group.members.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
