//! MOOSE annotation management for SBML translation.
//!
//! Models written by MOOSE carry layout and structural information in `<annotation>` blocks
//! under the `moose` namespace prefix. This module decodes those blocks, once per element,
//! into closed typed records:
//!
//! - [`ModelAnnotation`]: simulation run time, solver and plot list of the model
//! - [`CompartmentAnnotation`]: mesh geometry, membrane flag and base path of a compartment
//! - [`EnzymaticAnnotation`]: one stage of a two-stage enzymatic reaction
//! - [`GroupAnnotation`]: placement and colors of a groups-package group
//! - [`ObjectAnnotation`]: display metadata and constants of any element
//!
//! ## Extraction
//!
//! Annotation blocks may hold fragments of several tools next to each other. Each raw
//! record declares the tags it is stored under; [`MooseAnnotation::extract`] isolates the
//! matching fragments with a regular expression and deserializes them with `quick-xml`.
//! Raw records keep every value as text; the typed records parse and validate them.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::network::Info;
use crate::sbml::error::SBMLError;

/// Namespace prefix of MOOSE annotations
const MOOSE_PREFIX: &str = "moose";

/// Raw annotation records that can be pulled out of an `<annotation>` block.
pub(crate) trait MooseAnnotation: Sized + DeserializeOwned {
    /// Tags (without namespace prefix) this record is stored under.
    fn expected_tags() -> Vec<String>;

    /// Deserializes the first fragment carrying one of the expected tags.
    ///
    /// # Arguments
    /// * `annotation` - The complete `<annotation>` block
    /// * `path` - Identifier of the annotated element, used for error reporting
    ///
    /// # Errors
    /// * `SBMLError::NoExistingAnnotation` - No fragment with an expected tag deserializes
    fn extract(annotation: &str, path: &str) -> Result<Self, SBMLError> {
        fragments(annotation, &Self::expected_tags())
            .iter()
            .find_map(|fragment| quick_xml::de::from_str::<Self>(fragment).ok())
            .ok_or_else(|| SBMLError::NoExistingAnnotation(path.to_string()))
    }

    /// Deserializes every fragment carrying one of the expected tags, in tag order.
    fn extract_all(annotation: &str) -> Vec<Self> {
        fragments(annotation, &Self::expected_tags())
            .iter()
            .filter_map(|fragment| quick_xml::de::from_str::<Self>(fragment).ok())
            .collect()
    }
}

/// Isolates the XML fragments of the given tags from an annotation block.
fn fragments(annotation: &str, tags: &[String]) -> Vec<String> {
    // Annotation blocks mix fragments of several tools. Dropping the namespace prefix
    // lets the fragments deserialize on their own.
    let annotation = annotation
        .replace("<annotation>", "")
        .replace("</annotation>", "")
        .replace(&format!(":{MOOSE_PREFIX}"), "")
        .replace(&format!("{MOOSE_PREFIX}:"), "");

    let mut extracted = Vec::new();
    for tag in tags {
        let pattern = format!(
            r"<{tag}(?:\s[^>]*)?(?:/>|>[\s\S]*?</{tag}>)",
            tag = regex::escape(tag)
        );

        if let Ok(re) = regex::RegexBuilder::new(&pattern)
            .dot_matches_new_line(true)
            .build()
        {
            extracted.extend(
                re.find_iter(&annotation)
                    .map(|found| found.as_str().to_string())
                    .filter(|fragment| !fragment.trim().is_empty()),
            );
        }
    }

    extracted
}

fn first<A: MooseAnnotation>(annotation: Option<&str>, path: &str) -> Option<A> {
    annotation.and_then(|annotation| A::extract(annotation, path).ok())
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn number(value: Option<String>, field: &str, path: &str) -> Result<Option<f64>, SBMLError> {
    text(value)
        .map(|value| {
            value.parse::<f64>().map_err(|_| {
                SBMLError::InvalidAnnotation(
                    path.to_string(),
                    format!("{field} holds '{value}', which is not a number"),
                )
            })
        })
        .transpose()
}

/// Removes repeated values while keeping the first occurrence of each.
fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values.into_iter().filter_map(|value| text(Some(value))) {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

// ================================================================================================
// MODEL
// ================================================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename = "ModelAnnotation")]
struct ModelAnnot {
    #[serde(rename = "runTime", default)]
    run_time: Option<String>,
    #[serde(rename = "solver", default)]
    solver: Option<String>,
    #[serde(rename = "plots", default)]
    plots: Option<String>,
}

impl MooseAnnotation for ModelAnnot {
    fn expected_tags() -> Vec<String> {
        vec!["ModelAnnotation".to_string()]
    }
}

/// Simulation settings stored on the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelAnnotation {
    pub run_time: Option<f64>,
    pub solver: Option<String>,
    /// Pool paths relative to the model root
    pub plots: Vec<String>,
}

impl ModelAnnotation {
    /// Reads the model annotation, `None` when the block carries none.
    pub fn read(annotation: Option<&str>, path: &str) -> Result<Option<Self>, SBMLError> {
        let Some(raw) = first::<ModelAnnot>(annotation, path) else {
            return Ok(None);
        };

        Ok(Some(ModelAnnotation {
            run_time: number(raw.run_time, "runTime", path)?,
            solver: text(raw.solver).map(|solver| solver.replace(' ', "")),
            plots: raw
                .plots
                .unwrap_or_default()
                .split(';')
                .map(|plot| plot.replace(' ', ""))
                .filter(|plot| !plot.is_empty())
                .collect(),
        }))
    }
}

// ================================================================================================
// COMPARTMENT
// ================================================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename = "CompartmentAnnotation")]
struct CompartmentAnnot {
    #[serde(rename = "Mesh", default)]
    mesh: Option<String>,
    #[serde(rename = "numDiffCompts", default)]
    num_diff_compts: Option<String>,
    #[serde(rename = "isMembraneBound", default)]
    is_membrane_bound: Option<String>,
    #[serde(rename = "totLength", default)]
    tot_length: Option<String>,
    #[serde(rename = "diffLength", default)]
    diff_length: Option<String>,
    #[serde(rename = "surround", default)]
    surround: Option<String>,
    #[serde(rename = "basePath", default)]
    base_path: Option<String>,
}

impl MooseAnnotation for CompartmentAnnot {
    fn expected_tags() -> Vec<String> {
        vec!["CompartmentAnnotation".to_string()]
    }
}

/// Geometry requested for a compartment.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSpec {
    /// `CubeMesh` and `NeuroMesh`
    Cube,
    /// `CylMesh`
    Cylinder { tot_length: f64, diff_length: f64 },
    /// `EndoMesh`, living inside the compartment named by `surround`
    Endo { surround: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentAnnotation {
    pub mesh: MeshSpec,
    pub num_diff_compts: Option<u32>,
    pub is_membrane_bound: bool,
    /// Folder chain all compartments are created under
    pub base_path: Option<String>,
}

impl Default for CompartmentAnnotation {
    fn default() -> Self {
        CompartmentAnnotation {
            mesh: MeshSpec::Cube,
            num_diff_compts: None,
            is_membrane_bound: false,
            base_path: None,
        }
    }
}

impl CompartmentAnnotation {
    /// Reads the compartment annotation, falling back to a plain cube without one.
    ///
    /// # Errors
    /// * `SBMLError::InvalidAnnotation` - A `CylMesh` lacks its lengths or a value is not numeric
    pub fn read(annotation: Option<&str>, path: &str) -> Result<Self, SBMLError> {
        let Some(raw) = first::<CompartmentAnnot>(annotation, path) else {
            return Ok(CompartmentAnnotation::default());
        };

        let mesh = match text(raw.mesh).as_deref() {
            Some("CylMesh") => {
                let tot_length = number(raw.tot_length, "totLength", path)?;
                let diff_length = number(raw.diff_length, "diffLength", path)?;
                match (tot_length, diff_length) {
                    (Some(tot_length), Some(diff_length)) => MeshSpec::Cylinder {
                        tot_length,
                        diff_length,
                    },
                    _ => {
                        return Err(SBMLError::InvalidAnnotation(
                            path.to_string(),
                            "CylMesh requires totLength and diffLength".to_string(),
                        ))
                    }
                }
            }
            Some("EndoMesh") => MeshSpec::Endo {
                surround: text(raw.surround),
            },
            _ => MeshSpec::Cube,
        };

        Ok(CompartmentAnnotation {
            mesh,
            num_diff_compts: number(raw.num_diff_compts, "numDiffCompts", path)?
                .map(|count| count as u32),
            is_membrane_bound: text(raw.is_membrane_bound)
                .is_some_and(|flag| flag.eq_ignore_ascii_case("true")),
            base_path: text(raw.base_path),
        })
    }
}

// ================================================================================================
// ENZYMATIC REACTION
// ================================================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename = "EnzymaticReaction")]
struct EnzymaticAnnot {
    #[serde(rename = "enzyme", default)]
    enzyme: Option<String>,
    #[serde(rename = "complex", default)]
    complex: Option<String>,
    #[serde(rename = "substrates", default)]
    substrates: Vec<String>,
    #[serde(rename = "product", default)]
    products: Vec<String>,
    #[serde(rename = "groupName", default)]
    group_name: Option<String>,
    #[serde(rename = "stage", default)]
    stage: Option<String>,
    #[serde(rename = "Group", default)]
    group: Option<String>,
    #[serde(rename = "xCord", default)]
    x: Option<String>,
    #[serde(rename = "yCord", default)]
    y: Option<String>,
}

impl MooseAnnotation for EnzymaticAnnot {
    fn expected_tags() -> Vec<String> {
        vec!["EnzymaticReaction".to_string()]
    }
}

/// Stage of a two-stage enzymatic mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnzymeStage {
    /// Stage 1, enzyme and substrates form the complex
    Binding,
    /// Stage 2, the complex breaks down into enzyme and products
    Breakdown,
}

impl EnzymeStage {
    /// Numeric value of the stage; a group is complete when its stages add up to 3.
    pub fn value(self) -> u8 {
        match self {
            EnzymeStage::Binding => 1,
            EnzymeStage::Breakdown => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnzymaticAnnotation {
    /// Species id of the enzyme pool (stage 1)
    pub enzyme: Option<String>,
    /// Species id of the enzyme-substrate complex (stage 2)
    pub complex: Option<String>,
    pub substrates: Vec<String>,
    pub products: Vec<String>,
    /// Name shared by both stages of one enzyme
    pub group_name: String,
    /// `None` when the stage is missing or is neither 1 nor 2
    pub stage: Option<EnzymeStage>,
    pub group: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl EnzymaticAnnotation {
    /// Reads the enzymatic annotation of a reaction.
    ///
    /// Returns `None` when the block carries no `EnzymaticReaction` fragment or the
    /// fragment names no group.
    ///
    /// # Errors
    /// * `SBMLError::InvalidAnnotation` - A coordinate is not numeric
    pub fn read(annotation: Option<&str>, path: &str) -> Result<Option<Self>, SBMLError> {
        let Some(raw) = first::<EnzymaticAnnot>(annotation, path) else {
            return Ok(None);
        };
        let Some(group_name) = text(raw.group_name) else {
            return Ok(None);
        };

        let stage = match text(raw.stage).as_deref() {
            Some("1") => Some(EnzymeStage::Binding),
            Some("2") => Some(EnzymeStage::Breakdown),
            _ => None,
        };

        Ok(Some(EnzymaticAnnotation {
            enzyme: text(raw.enzyme),
            complex: text(raw.complex),
            substrates: unique(raw.substrates),
            products: unique(raw.products),
            group_name,
            stage,
            group: text(raw.group),
            x: number(raw.x, "xCord", path)?,
            y: number(raw.y, "yCord", path)?,
        }))
    }
}

// ================================================================================================
// GROUP
// ================================================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename = "GroupAnnotation")]
struct GroupAnnot {
    #[serde(rename = "bgColor", default)]
    color: Option<String>,
    #[serde(rename = "textColor", default)]
    text_color: Option<String>,
    #[serde(rename = "Compartment", default)]
    compartment: Option<String>,
    #[serde(rename = "Group", default)]
    group: Option<String>,
}

impl MooseAnnotation for GroupAnnot {
    fn expected_tags() -> Vec<String> {
        vec!["GroupAnnotation".to_string()]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupAnnotation {
    /// Compartment id or name the group folder lives in
    pub compartment: Option<String>,
    /// Intermediate folder between compartment and group
    pub group: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
}

impl GroupAnnotation {
    pub fn read(annotation: Option<&str>, path: &str) -> Option<Self> {
        first::<GroupAnnot>(annotation, path).map(|raw| GroupAnnotation {
            compartment: text(raw.compartment),
            group: text(raw.group),
            color: text(raw.color),
            text_color: text(raw.text_color),
        })
    }
}

// ================================================================================================
// OBJECT DISPLAY DATA
// ================================================================================================

/// Display fields that may appear in any of the three object-level fragments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
struct ObjectAnnot {
    #[serde(rename = "xCord", default)]
    x: Option<String>,
    #[serde(rename = "yCord", default)]
    y: Option<String>,
    #[serde(rename = "bgColor", default)]
    color: Option<String>,
    #[serde(rename = "textColor", default)]
    text_color: Option<String>,
    #[serde(rename = "diffConstant", default)]
    diff_constant: Option<String>,
    #[serde(rename = "motorConstant", default)]
    motor_constant: Option<String>,
    #[serde(rename = "Channel", default)]
    channel: Option<String>,
    #[serde(rename = "Permeability", default)]
    permeability: Option<String>,
}

impl MooseAnnotation for ObjectAnnot {
    fn expected_tags() -> Vec<String> {
        vec![
            "ModelAnnotation".to_string(),
            "EnzymaticReaction".to_string(),
            "GroupAnnotation".to_string(),
        ]
    }
}

impl ObjectAnnot {
    /// Fills the fields still missing in `self` from `other`.
    fn merge(self, other: ObjectAnnot) -> ObjectAnnot {
        ObjectAnnot {
            x: self.x.or(other.x),
            y: self.y.or(other.y),
            color: self.color.or(other.color),
            text_color: self.text_color.or(other.text_color),
            diff_constant: self.diff_constant.or(other.diff_constant),
            motor_constant: self.motor_constant.or(other.motor_constant),
            channel: self.channel.or(other.channel),
            permeability: self.permeability.or(other.permeability),
        }
    }
}

/// Display metadata and per-object constants of a species, reaction or group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectAnnotation {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub diff_constant: Option<f64>,
    pub motor_constant: Option<f64>,
    /// Set when the reaction is a concentration channel
    pub channel: bool,
    pub permeability: Option<f64>,
}

impl ObjectAnnotation {
    /// Reads and merges the display fields of all object-level fragments.
    pub fn read(annotation: Option<&str>, path: &str) -> Result<Self, SBMLError> {
        let raw = annotation
            .map(ObjectAnnot::extract_all)
            .unwrap_or_default()
            .into_iter()
            .fold(ObjectAnnot::default(), ObjectAnnot::merge);

        Ok(ObjectAnnotation {
            x: number(raw.x, "xCord", path)?,
            y: number(raw.y, "yCord", path)?,
            color: text(raw.color),
            text_color: text(raw.text_color),
            diff_constant: number(raw.diff_constant, "diffConstant", path)?,
            motor_constant: number(raw.motor_constant, "motorConstant", path)?,
            channel: raw.channel.is_some(),
            permeability: number(raw.permeability, "Permeability", path)?,
        })
    }

    /// Copies the display fields into an element's info.
    pub fn apply(&self, info: &mut Info) {
        info.x = self.x.or(info.x);
        info.y = self.y.or(info.y);
        if self.color.is_some() {
            info.color = self.color.clone();
        }
        if self.text_color.is_some() {
            info.text_color = self.text_color.clone();
        }
    }
}
