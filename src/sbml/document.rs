//! Typed view of an SBML document.
//!
//! Converts the generic [`XmlElement`] tree into plain structs holding exactly the
//! information the translator consumes. Every conversion is a `TryFrom<&XmlElement>`
//! implementation; missing optional attributes become `None` and SBML defaults are applied
//! where the format defines them.

use std::str::FromStr;

use crate::sbml::error::SBMLError;
use crate::sbml::mathml::Expr;
use crate::sbml::xml::XmlElement;

/// A parsed SBML document
#[derive(Debug, Clone, PartialEq)]
pub struct SbmlDocument {
    pub level: u32,
    pub version: u32,
    pub model: Option<Model>,
}

impl SbmlDocument {
    /// Parses SBML text into a typed document.
    ///
    /// # Arguments
    /// * `xml` - Complete SBML document text
    ///
    /// # Returns
    /// The typed document, or an error if the XML is malformed or not SBML
    pub fn parse(xml: &str) -> Result<Self, SBMLError> {
        let root = XmlElement::parse(xml)?;
        SbmlDocument::try_from(&root)
    }
}

impl TryFrom<&XmlElement> for SbmlDocument {
    type Error = SBMLError;

    fn try_from(root: &XmlElement) -> Result<Self, Self::Error> {
        if root.name != "sbml" {
            return Err(SBMLError::NotSbml(root.name.clone()));
        }

        let model = root.child("model").map(Model::try_from).transpose()?;

        Ok(SbmlDocument {
            level: parse_attr(root, "level")?.unwrap_or(3),
            version: parse_attr(root, "version")?.unwrap_or(1),
            model,
        })
    }
}

// ================================================================================================
// MODEL
// ================================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Level 3 model-wide default substance unit
    pub substance_units: Option<String>,
    /// Level 3 model-wide default volume unit
    pub volume_units: Option<String>,
    pub unit_definitions: Vec<UnitDefinition>,
    pub compartments: Vec<Compartment>,
    pub species: Vec<Species>,
    pub parameters: Vec<Parameter>,
    pub reactions: Vec<Reaction>,
    pub rules: Vec<Rule>,
    pub groups: Vec<Group>,
    pub annotation: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<&XmlElement> for Model {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let rules = ["assignmentRule", "rateRule", "algebraicRule"];

        Ok(Model {
            id: element.attr("id").map(str::to_string),
            name: element.attr("name").map(str::to_string),
            substance_units: element.attr("substanceUnits").map(str::to_string),
            volume_units: element.attr("volumeUnits").map(str::to_string),
            unit_definitions: collect(element, "listOfUnitDefinitions", "unitDefinition")?,
            compartments: collect(element, "listOfCompartments", "compartment")?,
            species: collect(element, "listOfSpecies", "species")?,
            parameters: collect(element, "listOfParameters", "parameter")?,
            reactions: collect(element, "listOfReactions", "reaction")?,
            rules: element
                .child("listOfRules")
                .map(|list| {
                    list.children
                        .iter()
                        .filter(|child| rules.contains(&child.name.as_str()))
                        .map(Rule::try_from)
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default(),
            groups: collect(element, "listOfGroups", "group")?,
            annotation: raw_child(element, "annotation"),
            notes: notes_of(element),
        })
    }
}

impl Model {
    pub fn species_by_id(&self, id: &str) -> Option<&Species> {
        self.species.iter().find(|species| species.id == id)
    }

    pub fn compartment_by_id(&self, id: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|compartment| compartment.id == id)
    }

    pub fn parameter_by_id(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.id == id)
    }

    /// Resolves a unit reference: a user definition first, then a built-in unit kind.
    pub fn unit_definition(&self, id: &str) -> Option<UnitDefinition> {
        if let Some(definition) = self.unit_definitions.iter().find(|ud| ud.id == id) {
            return Some(definition.clone());
        }

        UnitDefinition::builtin(id)
    }

    /// Unit of a compartment's size: its own units, else the model's volume units, else a
    /// user definition with the reserved id `volume`.
    pub fn compartment_units(&self, compartment: &Compartment) -> Option<UnitDefinition> {
        compartment
            .units
            .as_deref()
            .or(self.volume_units.as_deref())
            .and_then(|id| self.unit_definition(id))
            .or_else(|| self.user_definition("volume"))
    }

    /// Unit of a species' initial value: its own substance units, else the model's substance
    /// units, else a user definition with the reserved id `substance`.
    pub fn species_units(&self, species: &Species) -> Option<UnitDefinition> {
        species
            .substance_units
            .as_deref()
            .or(self.substance_units.as_deref())
            .and_then(|id| self.unit_definition(id))
            .or_else(|| self.user_definition("substance"))
    }

    pub fn parameter_units(&self, parameter: &Parameter) -> Option<UnitDefinition> {
        parameter
            .units
            .as_deref()
            .and_then(|id| self.unit_definition(id))
    }

    /// User-declared unit definition with the given id; built-ins are not consulted.
    pub fn user_definition(&self, id: &str) -> Option<UnitDefinition> {
        self.unit_definitions.iter().find(|ud| ud.id == id).cloned()
    }

    /// Whether an assignment rule sets the given variable.
    pub fn has_assignment_rule_for(&self, variable: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(rule, Rule::Assignment { variable: v, .. } if v == variable))
    }
}

// ================================================================================================
// UNITS
// ================================================================================================

/// Kinds of unit atoms the translator distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    Litre,
    Mole,
    Item,
    Other(String),
}

impl FromStr for UnitKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "litre" | "liter" => UnitKind::Litre,
            "mole" => UnitKind::Mole,
            "item" => UnitKind::Item,
            other => UnitKind::Other(other.to_string()),
        })
    }
}

/// One atom of a unit definition, `(multiplier * 10^scale * kind)^exponent + offset`
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub kind: UnitKind,
    pub exponent: f64,
    pub multiplier: f64,
    pub scale: i32,
    pub offset: f64,
}

impl Unit {
    pub fn of_kind(kind: UnitKind) -> Self {
        Unit {
            kind,
            exponent: 1.0,
            multiplier: 1.0,
            scale: 0,
            offset: 0.0,
        }
    }
}

impl TryFrom<&XmlElement> for Unit {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let kind = element.attr("kind").ok_or(SBMLError::MissingAttribute {
            element: "unit".to_string(),
            attribute: "kind",
        })?;

        Ok(Unit {
            kind: kind.parse().unwrap_or(UnitKind::Other(kind.to_string())),
            exponent: parse_attr(element, "exponent")?.unwrap_or(1.0),
            multiplier: parse_attr(element, "multiplier")?.unwrap_or(1.0),
            scale: parse_attr(element, "scale")?.unwrap_or(0),
            offset: parse_attr(element, "offset")?.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitDefinition {
    pub id: String,
    pub name: Option<String>,
    pub units: Vec<Unit>,
}

impl UnitDefinition {
    /// Single-atom definition for a built-in SBML unit kind used as a unit reference.
    pub fn builtin(kind: &str) -> Option<Self> {
        let kind: UnitKind = kind.parse().ok()?;
        let known = [
            "ampere", "avogadro", "becquerel", "candela", "celsius", "coulomb", "dimensionless",
            "farad", "gram", "gray", "henry", "hertz", "joule", "katal", "kelvin", "kilogram",
            "lumen", "lux", "metre", "meter", "newton", "ohm", "pascal", "radian", "second",
            "siemens", "sievert", "steradian", "tesla", "volt", "watt", "weber",
        ];

        match &kind {
            UnitKind::Other(name) if !known.contains(&name.as_str()) => None,
            UnitKind::Other(name) => Some(UnitDefinition {
                id: name.clone(),
                name: None,
                units: vec![Unit::of_kind(kind.clone())],
            }),
            _ => Some(UnitDefinition {
                id: format!("{kind:?}").to_lowercase(),
                name: None,
                units: vec![Unit::of_kind(kind)],
            }),
        }
    }
}

impl TryFrom<&XmlElement> for UnitDefinition {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        Ok(UnitDefinition {
            id: required(element, "id")?,
            name: element.attr("name").map(str::to_string),
            units: collect(element, "listOfUnits", "unit")?,
        })
    }
}

// ================================================================================================
// COMPARTMENTS, SPECIES, PARAMETERS
// ================================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Compartment {
    pub id: String,
    pub name: Option<String>,
    pub size: Option<f64>,
    pub spatial_dimensions: f64,
    pub units: Option<String>,
    pub annotation: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<&XmlElement> for Compartment {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        Ok(Compartment {
            id: required(element, "id")?,
            name: element.attr("name").map(str::to_string),
            size: match parse_attr(element, "size")? {
                Some(size) => Some(size),
                None => parse_attr(element, "volume")?,
            },
            spatial_dimensions: parse_attr(element, "spatialDimensions")?.unwrap_or(3.0),
            units: element.attr("units").map(str::to_string),
            annotation: raw_child(element, "annotation"),
            notes: notes_of(element),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: String,
    pub name: Option<String>,
    pub compartment: String,
    pub initial_amount: Option<f64>,
    pub initial_concentration: Option<f64>,
    pub substance_units: Option<String>,
    pub has_only_substance_units: bool,
    pub boundary_condition: bool,
    pub constant: bool,
    pub annotation: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<&XmlElement> for Species {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        Ok(Species {
            id: required(element, "id")?,
            name: element.attr("name").map(str::to_string),
            compartment: required(element, "compartment")?,
            initial_amount: parse_attr(element, "initialAmount")?,
            initial_concentration: parse_attr(element, "initialConcentration")?,
            substance_units: element.attr("substanceUnits").map(str::to_string),
            has_only_substance_units: parse_bool(element, "hasOnlySubstanceUnits").unwrap_or(false),
            boundary_condition: parse_bool(element, "boundaryCondition").unwrap_or(false),
            constant: parse_bool(element, "constant").unwrap_or(false),
            annotation: raw_child(element, "annotation"),
            notes: notes_of(element),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: String,
    pub name: Option<String>,
    pub value: Option<f64>,
    pub units: Option<String>,
}

impl TryFrom<&XmlElement> for Parameter {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        Ok(Parameter {
            id: required(element, "id")?,
            name: element.attr("name").map(str::to_string),
            value: parse_attr(element, "value")?,
            units: element.attr("units").map(str::to_string),
        })
    }
}

// ================================================================================================
// REACTIONS
// ================================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesReference {
    pub species: String,
    pub stoichiometry: f64,
}

/// Largest stoichiometry a species reference may be connected with.
pub const MAX_STOICHIOMETRY: f64 = 1000.0;

impl SpeciesReference {
    /// Integer part of the stoichiometry, the number of times the species is connected.
    ///
    /// `None` when the stoichiometry is not finite or exceeds [`MAX_STOICHIOMETRY`].
    pub fn multiplicity(&self) -> Option<usize> {
        (self.stoichiometry.is_finite() && self.stoichiometry <= MAX_STOICHIOMETRY)
            .then(|| self.stoichiometry.trunc().max(0.0) as usize)
    }
}

impl TryFrom<&XmlElement> for SpeciesReference {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        Ok(SpeciesReference {
            species: required(element, "species")?,
            stoichiometry: parse_attr(element, "stoichiometry")?.unwrap_or(1.0),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KineticLaw {
    pub math: Option<Expr>,
    /// Local parameters, from `listOfParameters` (Level 2) or `listOfLocalParameters` (Level 3)
    pub parameters: Vec<Parameter>,
}

impl TryFrom<&XmlElement> for KineticLaw {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let mut parameters: Vec<Parameter> = collect(element, "listOfParameters", "parameter")?;
        parameters.extend(collect::<Parameter>(
            element,
            "listOfLocalParameters",
            "localParameter",
        )?);

        Ok(KineticLaw {
            math: math_of(element)?,
            parameters,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub id: String,
    pub name: Option<String>,
    pub reversible: bool,
    pub fast: bool,
    pub reactants: Vec<SpeciesReference>,
    pub products: Vec<SpeciesReference>,
    /// Species ids of the modifiers
    pub modifiers: Vec<String>,
    pub kinetic_law: Option<KineticLaw>,
    pub annotation: Option<String>,
    pub notes: Option<String>,
}

impl Reaction {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl TryFrom<&XmlElement> for Reaction {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let modifiers = element
            .list("listOfModifiers", "modifierSpeciesReference")
            .map(|modifier| required(modifier, "species"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Reaction {
            id: required(element, "id")?,
            name: element.attr("name").map(str::to_string),
            reversible: parse_bool(element, "reversible").unwrap_or(true),
            fast: parse_bool(element, "fast").unwrap_or(false),
            reactants: collect(element, "listOfReactants", "speciesReference")?,
            products: collect(element, "listOfProducts", "speciesReference")?,
            modifiers,
            kinetic_law: element
                .child("kineticLaw")
                .map(KineticLaw::try_from)
                .transpose()?,
            annotation: raw_child(element, "annotation"),
            notes: notes_of(element),
        })
    }
}

// ================================================================================================
// RULES, FUNCTIONS, GROUPS
// ================================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Assignment { variable: String, math: Option<Expr> },
    Rate { variable: String, math: Option<Expr> },
    Algebraic { math: Option<Expr> },
}

impl Rule {
    pub fn variable(&self) -> Option<&str> {
        match self {
            Rule::Assignment { variable, .. } | Rule::Rate { variable, .. } => Some(variable),
            Rule::Algebraic { .. } => None,
        }
    }
}

impl TryFrom<&XmlElement> for Rule {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        let math = math_of(element)?;
        // Level 1 style rules name their variable through `species` or `compartment`
        let variable = || {
            element
                .attr("variable")
                .or_else(|| element.attr("species"))
                .or_else(|| element.attr("compartment"))
                .map(str::to_string)
                .ok_or(SBMLError::MissingAttribute {
                    element: element.name.clone(),
                    attribute: "variable",
                })
        };

        match element.name.as_str() {
            "rateRule" => Ok(Rule::Rate {
                variable: variable()?,
                math,
            }),
            "algebraicRule" => Ok(Rule::Algebraic { math }),
            _ => Ok(Rule::Assignment {
                variable: variable()?,
                math,
            }),
        }
    }
}

/// A group of the SBML groups package
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: Option<String>,
    pub name: Option<String>,
    pub kind: Option<String>,
    /// Referenced element ids, in document order
    pub members: Vec<String>,
    pub annotation: Option<String>,
}

impl TryFrom<&XmlElement> for Group {
    type Error = SBMLError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        Ok(Group {
            id: element.attr("id").map(str::to_string),
            name: element.attr("name").map(str::to_string),
            kind: element.attr("kind").map(str::to_string),
            members: element
                .list("listOfMembers", "member")
                .filter_map(|member| member.attr("idRef"))
                .map(str::to_string)
                .collect(),
            annotation: raw_child(element, "annotation"),
        })
    }
}

// ================================================================================================
// HELPERS
// ================================================================================================

fn collect<'a, T>(element: &'a XmlElement, container: &'a str, item: &'a str) -> Result<Vec<T>, SBMLError>
where
    T: TryFrom<&'a XmlElement, Error = SBMLError>,
{
    element.list(container, item).map(T::try_from).collect()
}

fn required(element: &XmlElement, attribute: &'static str) -> Result<String, SBMLError> {
    element
        .attr(attribute)
        .map(str::to_string)
        .ok_or(SBMLError::MissingAttribute {
            element: element.name.clone(),
            attribute,
        })
}

fn parse_attr<T: FromStr>(element: &XmlElement, attribute: &str) -> Result<Option<T>, SBMLError> {
    element
        .attr(attribute)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| SBMLError::InvalidNumber {
                attribute: attribute.to_string(),
                value: value.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(element: &XmlElement, attribute: &str) -> Option<bool> {
    element
        .attr(attribute)
        .map(|value| matches!(value.trim(), "true" | "1"))
}

fn raw_child(element: &XmlElement, name: &str) -> Option<String> {
    element.child(name).and_then(|child| child.raw.clone())
}

/// Inner markup of a `<notes>` block.
fn notes_of(element: &XmlElement) -> Option<String> {
    let raw = raw_child(element, "notes")?;
    let inner = raw
        .strip_prefix("<notes>")
        .and_then(|rest| rest.strip_suffix("</notes>"))
        .unwrap_or(&raw)
        .trim();

    (!inner.is_empty()).then(|| inner.to_string())
}

fn math_of(element: &XmlElement) -> Result<Option<Expr>, SBMLError> {
    element
        .child("math")
        .map(|math| Expr::try_from(math).map_err(SBMLError::from))
        .transpose()
}
