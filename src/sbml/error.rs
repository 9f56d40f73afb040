use thiserror::Error;

use crate::network::NetworkError;
use crate::sbml::mathml::MathError;

/// Errors that abort the translation of an SBML document
#[derive(Debug, Error)]
pub enum SBMLError {
    /// Error when reading an SBML file fails
    #[error("Failed to read SBML file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error when the XML itself is malformed
    #[error("Failed to parse SBML document: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Error when an annotation fragment cannot be deserialized
    #[error("Failed to deserialize annotation: {0}")]
    DeserializeError(#[from] quick_xml::DeError),

    /// Error when the root element is not `<sbml>`
    #[error("Document is not SBML: root element is <{0}>")]
    NotSbml(String),

    /// Error when the SBML document doesn't contain a model
    #[error("Invalid SBML: missing model")]
    MissingModel,

    /// Error when the model declares no compartment
    #[error("Model has no compartment")]
    NoCompartments,

    /// Error when the model declares no species
    #[error("Model has no species")]
    NoSpecies,

    /// Error when a compartment is not a 3-D volume
    #[error("Compartment '{compartment}' has {dimensions} spatial dimensions, only 3 are supported")]
    InvalidSpatialDimensions { compartment: String, dimensions: f64 },

    /// Error when an EndoMesh compartment names a surround that does not exist
    #[error("EndoMesh compartment '{compartment}' has no valid surround compartment '{surround}'")]
    MissingSurround {
        compartment: String,
        surround: String,
    },

    /// Error when a species has neither an initial value nor an assignment rule
    #[error("Invalid SBML: species '{0}' has neither an initial amount nor an initial concentration, and no assignment rule defines it")]
    MissingInitialValue(String),

    /// Error when a kinetic law refers to a symbol that is not defined
    #[error("In reaction '{reaction}' the symbol '{symbol}' is not defined")]
    UndefinedSymbol { reaction: String, symbol: String },

    /// Error when a species lives in a compartment that was never created
    #[error("Species '{species}' refers to unknown compartment '{compartment}'")]
    UnknownCompartment { species: String, compartment: String },

    /// Error when a required attribute is missing on an element
    #[error("<{element}> is missing the required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// Error when an attribute holds a value that is not a number
    #[error("Attribute '{attribute}' holds '{value}', which is not a number")]
    InvalidNumber { attribute: String, value: String },

    /// Error when a moose annotation is present but incomplete
    #[error("Invalid annotation on '{0}': {1}")]
    InvalidAnnotation(String, String),

    /// No annotation with the requested tags is present
    #[error("No existing annotation found for {0}")]
    NoExistingAnnotation(String),

    /// Error when the consistency check rejects the document
    #[error("{0}")]
    Validation(String),

    /// Error raised by the target network
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Error when a MathML block cannot be decoded
    #[error(transparent)]
    Math(#[from] MathError),
}
