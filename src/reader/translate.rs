//! SBML to reaction network translation.
//!
//! This module is the entry point for turning an SBML document into a [`Network`]. A
//! translation runs the following stages strictly in order, each one reading the tables
//! filled by the stages before it:
//!
//! 1. **Validation**: optional consistency check of the document
//! 2. **Compartments**: one mesh per SBML compartment, `EndoMesh` surrounds resolved last
//! 3. **Groups**: folders for groups-package groups and their member lists
//! 4. **Species**: one pool per SBML species, with initial values in working units
//! 5. **Reactions**: enzymes from two-stage annotations first, then all other reactions
//! 6. **Rules**: assignment rules become functions writing into their target pool
//! 7. **Model info**: run time, solver and plot tables from the model annotation
//!
//! Any stage may abort the translation. The partially built network is then dropped and
//! the caller receives the error together with the diagnostics collected so far.

use std::collections::HashMap;
use std::path::Path;

use derive_builder::Builder;
use thiserror::Error;

use crate::network::{ElementId, Network};
use crate::reader::diagnostics::{Diagnostics, Stage};
use crate::reader::parameters::ParameterRegistry;
use crate::sbml::document::{Model, SbmlDocument};
use crate::sbml::error::SBMLError;
use crate::sbml::utils::read_sbml_file;
use crate::validation::consistency::{check_consistency, Severity};

/// Options controlling a translation.
///
/// # Examples
///
/// ```
/// use sbml_chemnet::reader::ReadOptionsBuilder;
///
/// let options = ReadOptionsBuilder::default()
///     .load_path("/cell")
///     .validate(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(options.solver, "ee");
/// ```
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct ReadOptions {
    /// Run the consistency check before translating
    #[builder(default = "true")]
    pub validate: bool,
    /// Solver recorded on the model root when the model does not name one
    #[builder(default = "\"ee\".to_string()", setter(into))]
    pub solver: String,
    /// Folder chain the model is created under
    #[builder(default = "\"/model\".to_string()", setter(into))]
    pub load_path: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            validate: true,
            solver: "ee".to_string(),
            load_path: "/model".to_string(),
        }
    }
}

/// A successfully translated model.
#[derive(Debug, Clone)]
pub struct Translation {
    pub network: Network,
    /// Folder the model was created under
    pub root: ElementId,
    pub level: u32,
    pub version: u32,
    pub diagnostics: Diagnostics,
}

impl Translation {
    /// Resolves a path relative to the model root, e.g. `cell/glc`.
    pub fn lookup(&self, path: &str) -> Option<ElementId> {
        self.network.lookup_from(self.root, path)
    }

    pub fn root_path(&self) -> String {
        self.network.path(self.root)
    }
}

/// A translation that was aborted.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ReadFailure {
    pub error: SBMLError,
    /// Diagnostics collected before the translation was aborted
    pub diagnostics: Diagnostics,
}

impl From<SBMLError> for ReadFailure {
    fn from(error: SBMLError) -> Self {
        ReadFailure {
            error,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Reads an SBML file and translates it into a network.
///
/// # Arguments
/// * `path` - Path to the SBML file
/// * `options` - Translation options
///
/// # Returns
/// * `Result<Translation, ReadFailure>` - The network with its diagnostics, or the fatal error
pub fn read_sbml(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Translation, ReadFailure> {
    let document = read_sbml_file(path.as_ref())?;
    translate(&document, options)
}

/// Translates SBML text into a network.
pub fn read_sbml_str(xml: &str, options: &ReadOptions) -> Result<Translation, ReadFailure> {
    let document = SbmlDocument::parse(xml)?;
    translate(&document, options)
}

/// Translates a parsed SBML document into a fresh network.
///
/// # Errors
/// Returns a [`ReadFailure`] if:
/// - Validation is enabled and the document is inconsistent
/// - The document has no model, no compartment or no species
/// - A compartment is not three-dimensional or an `EndoMesh` surround is missing
/// - A species has no initial value and no assignment rule
/// - A kinetic law refers to an undefined symbol
pub fn translate(document: &SbmlDocument, options: &ReadOptions) -> Result<Translation, ReadFailure> {
    let mut diagnostics = Diagnostics::new();

    if options.validate {
        let report = check_consistency(document);
        for result in report.errors.iter().filter(|r| *r.severity() != Severity::Error) {
            diagnostics.push(Stage::Validation, *result.severity(), result.message());
        }

        if !report.is_valid {
            return Err(ReadFailure {
                error: SBMLError::Validation(report.message()),
                diagnostics,
            });
        }
    }

    let Some(model) = &document.model else {
        return Err(ReadFailure {
            error: SBMLError::MissingModel,
            diagnostics,
        });
    };

    log::info!(
        "Translating SBML level {} version {} model '{}'",
        document.level,
        document.version,
        model.id.as_deref().unwrap_or_default()
    );

    let mut translator = match Translator::new(model, options, diagnostics) {
        Ok(translator) => translator,
        Err((error, diagnostics)) => return Err(ReadFailure { error, diagnostics }),
    };

    match translator.run() {
        Ok(()) => Ok(Translation {
            network: translator.network,
            root: translator.root,
            level: document.level,
            version: document.version,
            diagnostics: translator.diagnostics,
        }),
        Err(error) => Err(ReadFailure {
            error,
            diagnostics: translator.diagnostics,
        }),
    }
}

/// Drops everything before the first `/` and makes the result absolute.
pub fn normalize_load_path(load_path: &str) -> String {
    let trimmed = match load_path.find('/') {
        Some(position) => &load_path[position + 1..],
        None => load_path,
    };

    format!("/{trimmed}")
}

/// Pool created for an SBML species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpeciesEntry {
    pub element: ElementId,
    pub compartment: ElementId,
}

/// Folder and member ids of a groups-package collection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupEntry {
    pub id: String,
    pub folder: ElementId,
    pub members: Vec<String>,
}

/// State of one translation, shared by all stages.
pub(crate) struct Translator<'a> {
    pub model: &'a Model,
    pub options: &'a ReadOptions,
    pub network: Network,
    pub root: ElementId,
    /// Compartment elements keyed by SBML id and by name
    pub compartments: HashMap<String, ElementId>,
    /// Pools keyed by SBML species id
    pub species: HashMap<String, SpeciesEntry>,
    /// Collections in document order
    pub groups: Vec<GroupEntry>,
    pub parameters: ParameterRegistry,
    pub diagnostics: Diagnostics,
}

impl<'a> Translator<'a> {
    pub fn new(
        model: &'a Model,
        options: &'a ReadOptions,
        diagnostics: Diagnostics,
    ) -> Result<Self, (SBMLError, Diagnostics)> {
        let mut network = Network::new();
        let load_path = normalize_load_path(&options.load_path);
        let root = match network.ensure_path(network.root(), &load_path) {
            Ok(root) => root,
            Err(error) => return Err((error.into(), diagnostics)),
        };

        Ok(Translator {
            model,
            options,
            network,
            root,
            compartments: HashMap::new(),
            species: HashMap::new(),
            groups: Vec::new(),
            parameters: ParameterRegistry::from_model(model),
            diagnostics,
        })
    }

    fn run(&mut self) -> Result<(), SBMLError> {
        log::debug!("Creating compartments under {}", self.network.path(self.root));
        self.build_compartments()?;
        log::debug!("Resolving groups");
        self.build_groups()?;
        log::debug!("Creating species");
        self.build_species()?;
        log::debug!("Creating reactions");
        self.build_reactions()?;
        log::debug!("Creating rules");
        self.build_rules()?;
        log::debug!("Applying model annotation");
        self.apply_model_info()?;
        Ok(())
    }

    /// Folder of the last collection listing `id` as a member.
    pub fn group_folder_of(&self, id: &str) -> Option<ElementId> {
        self.groups
            .iter()
            .rev()
            .find(|group| group.members.iter().any(|member| member == id))
            .map(|group| group.folder)
    }
}
