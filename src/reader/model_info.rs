use crate::network::{ElementKind, Table};
use crate::reader::diagnostics::Stage;
use crate::reader::translate::Translator;
use crate::sbml::annotations::ModelAnnotation;
use crate::sbml::error::SBMLError;

/// Folder holding the plot tables, relative to the model root.
const GRAPH_FOLDER: &str = "data/graph_0";

/// Table name for a plotted path: separators and brackets become underscores.
fn table_name(plot: &str) -> String {
    let cleaned: String = plot
        .chars()
        .map(|c| match c {
            '/' | '[' | ']' => '_',
            other => other,
        })
        .collect();
    format!("{cleaned}.conc")
}

impl Translator<'_> {
    /// Records simulation settings on the model root and creates its plot tables.
    pub(crate) fn apply_model_info(&mut self) -> Result<(), SBMLError> {
        let model = self.model;
        let annotation = ModelAnnotation::read(model.annotation.as_deref(), "model")?
            .unwrap_or_default();

        let mut info = self.network.get(self.root)?.info.clone();
        info.model_type = Some("xml".to_string());
        info.run_time = annotation.run_time.or(info.run_time);
        info.solver = Some(
            annotation
                .solver
                .clone()
                .unwrap_or_else(|| self.options.solver.clone()),
        );
        info.notes = model.notes.clone().or(info.notes);
        self.network.set_info(self.root, info)?;

        if annotation.plots.is_empty() {
            return Ok(());
        }

        let graph = self.network.ensure_path(self.root, GRAPH_FOLDER)?;
        for plot in &annotation.plots {
            let target = self
                .network
                .lookup_from(self.root, &plot.replace("[0]", ""))
                .filter(|id| {
                    self.network
                        .get(*id)
                        .is_ok_and(|element| element.kind.is_pool())
                });
            let Some(target) = target else {
                self.diagnostics.warn(
                    Stage::ModelInfo,
                    format!("Plot '{plot}' does not name a pool, no table created"),
                );
                continue;
            };

            let name = table_name(plot);
            if self.network.child(graph, &name).is_some() {
                continue;
            }
            self.network.create(
                graph,
                &name,
                ElementKind::Table(Table {
                    target,
                    field: "conc".to_string(),
                }),
            )?;
        }

        Ok(())
    }
}
