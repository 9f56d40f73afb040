//! SBML to reaction network translation
//!
//! This library reads SBML chemical kinetics models and translates them into a tree of
//! simulation-ready network elements:
//! - Parsing SBML documents, MathML kinetic laws and `moose` annotations
//! - Normalizing compartment volumes, initial values and rate constants to working units
//! - Building pools, reactions, enzymes, channels and assignment functions
//! - Validating document consistency before translation
//!
//! # Example
//!
//! ```no_run
//! use sbml_chemnet::prelude::*;
//!
//! let translation = read_sbml("model.xml", &ReadOptions::default()).unwrap();
//! println!("{:?}", translation.network.summary(translation.root));
//! ```

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::network::*;
    pub use crate::reader::{
        read_sbml, read_sbml_str, translate, Diagnostic, Diagnostics, ReadFailure, ReadOptions,
        ReadOptionsBuilder, Stage, Translation,
    };
    pub use crate::sbml::document::SbmlDocument;
    pub use crate::sbml::error::SBMLError;
    pub use crate::sbml::units::AVOGADRO;
    pub use crate::validation::consistency::{check_consistency, Report, Severity};
}

/// The translated reaction network
pub mod network {
    pub use crate::network::arena::*;
    pub use crate::network::error::NetworkError;
    pub use crate::network::objects::*;

    /// Arena holding the element tree
    mod arena;
    /// Error types for tree operations
    pub mod error;
    /// Element payloads
    pub mod objects;
}

/// Reading the SBML document model
pub mod sbml {
    /// Typed records of the `moose` annotation namespace
    pub mod annotations;
    /// Document model of the supported SBML subset
    pub mod document;
    /// Error types for reading and translation
    pub mod error;
    /// MathML decoding
    pub mod mathml;
    /// Unit conversion to working units
    pub mod units;
    pub(crate) mod utils;
    /// Symbol extraction from expressions
    pub mod walker;
    /// Generic XML element tree
    pub mod xml;
}

/// Validation of SBML documents before translation
pub mod validation {
    /// Main consistency interface
    pub mod consistency;
    /// Uniqueness of identifiers
    mod identifiers;
    /// Resolution of species and compartment references
    mod references;
}

/// Translation of SBML documents into networks
pub mod reader {
    pub use crate::reader::diagnostics::*;
    pub use crate::reader::parameters::{ParameterRegistry, ParameterScope, ParameterValue};
    pub use crate::reader::translate::{
        read_sbml, read_sbml_str, translate, ReadFailure, ReadOptions, ReadOptionsBuilder,
        Translation,
    };

    mod compartments;
    /// Non-fatal findings collected during a translation
    pub mod diagnostics;
    mod enzymes;
    mod groups;
    mod model_info;
    mod parameters;
    mod reactions;
    mod rules;
    mod species;
    /// Translation entry points and options
    pub mod translate;
}

/// Table display of translations
mod info;
