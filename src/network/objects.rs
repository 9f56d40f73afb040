//! Typed payloads of the elements that make up a translated reaction network.
//!
//! Every element in the [`Network`](crate::network::Network) arena carries one
//! [`ElementKind`]. Cross references between elements (a reaction's substrates, an
//! enzyme's complex, a function's inputs) are plain [`ElementId`]s into the same arena.
//!
//! Units follow the working-unit convention of the translator: volumes in cubic
//! metres, counts as particle numbers and concentrations in milli-molar.

use serde::Serialize;
use variantly::Variantly;

use crate::network::ElementId;
use crate::sbml::units::AVOGADRO;

/// Payload of a network element.
#[derive(Debug, Clone, PartialEq, Serialize, Variantly)]
#[serde(tag = "class")]
pub enum ElementKind {
    /// Plain folder used for the load path, groups and plot containers
    Neutral,
    /// Geometric container with a volume
    Compartment(Compartment),
    /// Quantity holder for one chemical species
    Pool(Pool),
    /// Any of the reaction variants
    Reaction(Reaction),
    /// Derived value computed from other pools
    Function(Function),
    /// Plot table recording one field of a pool
    Table(Table),
}

impl ElementKind {
    /// Short class name, used in summaries and error messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            ElementKind::Neutral => "Neutral",
            ElementKind::Compartment(compartment) => match compartment.mesh {
                MeshKind::Cube => "CubeMesh",
                MeshKind::Cylinder { .. } => "CylMesh",
                MeshKind::Endo { .. } => "EndoMesh",
            },
            ElementKind::Pool(pool) if pool.buffered => "BufPool",
            ElementKind::Pool(_) => "Pool",
            ElementKind::Reaction(Reaction::Plain(_)) => "Reac",
            ElementKind::Reaction(Reaction::MichaelisMenten(_)) => "MMenz",
            ElementKind::Reaction(Reaction::Enzyme(_)) => "Enz",
            ElementKind::Reaction(Reaction::Channel(_)) => "ConcChan",
            ElementKind::Function(_) => "Function",
            ElementKind::Table(_) => "Table2",
        }
    }
}

// ================================================================================================
// COMPARTMENTS
// ================================================================================================

/// Geometry of a compartment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mesh")]
pub enum MeshKind {
    Cube,
    /// Cylinder along the x axis, `x1` being its axial length
    Cylinder { x1: f64, diff_length: f64 },
    /// Endo-membrane compartment living inside `surround`
    Endo { surround: Option<ElementId> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compartment {
    /// Identifier of the SBML compartment this mesh was built from
    pub sbml_id: String,
    pub mesh: MeshKind,
    /// Volume in cubic metres
    pub volume: f64,
    pub spatial_dimensions: u32,
    pub is_membrane_bound: bool,
    pub num_diff_compts: Option<u32>,
}

// ================================================================================================
// POOLS
// ================================================================================================

/// Initial value of a pool, kept in the representation it was given in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value")]
pub enum PoolInit {
    /// Absolute particle count
    Count(f64),
    /// Concentration in milli-molar
    Concentration(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pool {
    /// Identifier of the SBML species this pool was built from
    pub species_id: String,
    /// Buffered pools hold an externally fixed quantity
    pub buffered: bool,
    pub constant: bool,
    pub only_substance_units: bool,
    pub init: PoolInit,
    pub diff_const: f64,
    pub motor_const: f64,
    /// Compartment the pool lives in, even when it is placed inside a group folder
    pub compartment: ElementId,
}

impl Pool {
    /// Initial particle count, converting from concentration through `volume` (m³).
    pub fn n_init(&self, volume: f64) -> f64 {
        match self.init {
            PoolInit::Count(n) => n,
            PoolInit::Concentration(conc) => conc * volume * AVOGADRO,
        }
    }

    /// Initial concentration in milli-molar, converting from a count through `volume` (m³).
    pub fn conc_init(&self, volume: f64) -> f64 {
        match self.init {
            PoolInit::Concentration(conc) => conc,
            PoolInit::Count(_) if volume <= 0.0 => 0.0,
            PoolInit::Count(n) => n / (volume * AVOGADRO),
        }
    }
}

// ================================================================================================
// REACTIONS
// ================================================================================================

/// The four reaction variants the translator can produce.
///
/// Substrate and product lists repeat a pool once per unit of stoichiometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant")]
pub enum Reaction {
    Plain(Reac),
    MichaelisMenten(MMEnz),
    Enzyme(Enz),
    Channel(ConcChan),
}

impl Reaction {
    pub fn substrates(&self) -> &[ElementId] {
        match self {
            Reaction::Plain(reac) => &reac.substrates,
            Reaction::MichaelisMenten(enz) => &enz.substrates,
            Reaction::Enzyme(enz) => &enz.substrates,
            Reaction::Channel(chan) => &chan.inputs,
        }
    }

    pub fn products(&self) -> &[ElementId] {
        match self {
            Reaction::Plain(reac) => &reac.products,
            Reaction::MichaelisMenten(enz) => &enz.products,
            Reaction::Enzyme(enz) => &enz.products,
            Reaction::Channel(chan) => &chan.outputs,
        }
    }
}

/// Mass-action reaction with forward and backward rate constants.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reac {
    pub substrates: Vec<ElementId>,
    pub products: Vec<ElementId>,
    pub kf: f64,
    pub kb: f64,
}

/// Michaelis-Menten enzyme catalysed by the pool `enzyme`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MMEnz {
    pub enzyme: ElementId,
    pub substrates: Vec<ElementId>,
    pub products: Vec<ElementId>,
    pub kcat: f64,
    pub km: f64,
}

/// Explicit enzyme-substrate complex mechanism, `E + S <-> ES -> E + P`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enz {
    pub enzyme: ElementId,
    pub complex: ElementId,
    pub substrates: Vec<ElementId>,
    pub products: Vec<ElementId>,
    /// Complex formation rate in concentration units
    pub conc_k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub ratio: f64,
}

/// Concentration-driven channel whose number of channels follows `channel_pool`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcChan {
    pub channel_pool: ElementId,
    pub inputs: Vec<ElementId>,
    pub outputs: Vec<ElementId>,
    pub permeability: f64,
}

// ================================================================================================
// FUNCTIONS, TABLES, INFO
// ================================================================================================

/// Arithmetic over the counts of other pools.
///
/// `expr` refers to its inputs positionally as `x0, x1, ...`; each input reads the
/// particle count of the pool at the same index of `inputs`. The output overwrites the
/// particle count of `target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub expr: String,
    pub inputs: Vec<ElementId>,
    pub target: ElementId,
}

/// Plot table sampling `field` of `target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub target: ElementId,
    pub field: String,
}

/// Display metadata attached to an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
}

impl Info {
    pub fn is_empty(&self) -> bool {
        *self == Info::default()
    }
}
