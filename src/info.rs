//! Human-readable display of translated networks
//!
//! Implements `Display` for [`Translation`], rendering the elements of the model as one
//! table per element class.

use std::fmt::{self, Display};

use tabled::{builder::Builder, settings::Style};

use crate::network::{ElementId, ElementKind, Network, PoolInit, Reaction};
use crate::reader::Translation;

/// Conversion of one element class to table rows.
trait TableRecord {
    fn columns() -> Vec<String>;

    /// Builds the row of an element, `None` when the element belongs to another class.
    fn to_record(network: &Network, id: ElementId) -> Option<Vec<String>>;
}

struct CompartmentRecord;
struct PoolRecord;
struct ReactionRecord;
struct FunctionRecord;

impl Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(vec![format!(
            "SBML level {} version {} at {}",
            self.level,
            self.version,
            self.root_path()
        )]);

        let ids = self.network.descendants(self.root);
        let sections = [
            ("Compartments", to_table::<CompartmentRecord>(&self.network, &ids)),
            ("Pools", to_table::<PoolRecord>(&self.network, &ids)),
            ("Reactions", to_table::<ReactionRecord>(&self.network, &ids)),
            ("Functions", to_table::<FunctionRecord>(&self.network, &ids)),
        ];
        for (title, table) in sections {
            if let Some(table) = table {
                builder.push_record(vec![title.to_string()]);
                builder.push_record(vec![table]);
            }
        }

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{table}")
    }
}

/// Renders the rows of one element class, `None` when no element qualifies.
fn to_table<T: TableRecord>(network: &Network, ids: &[ElementId]) -> Option<String> {
    let records: Vec<Vec<String>> = ids
        .iter()
        .filter_map(|id| T::to_record(network, *id))
        .collect();
    if records.is_empty() {
        return None;
    }

    let mut builder = Builder::default();
    builder.push_record(T::columns());
    for record in records {
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    Some(table.to_string())
}

fn names(network: &Network, ids: &[ElementId]) -> String {
    ids.iter()
        .filter_map(|id| network.get(*id).ok())
        .map(|element| element.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ")
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl TableRecord for CompartmentRecord {
    fn columns() -> Vec<String> {
        columns(&["Path", "Mesh", "Volume (m³)"])
    }

    fn to_record(network: &Network, id: ElementId) -> Option<Vec<String>> {
        let element = network.get(id).ok()?;
        let ElementKind::Compartment(compartment) = &element.kind else {
            return None;
        };
        Some(vec![
            network.path(id),
            element.kind.class_name().to_string(),
            format!("{:e}", compartment.volume),
        ])
    }
}

impl TableRecord for PoolRecord {
    fn columns() -> Vec<String> {
        columns(&["Path", "Class", "Initial value"])
    }

    fn to_record(network: &Network, id: ElementId) -> Option<Vec<String>> {
        let element = network.get(id).ok()?;
        let ElementKind::Pool(pool) = &element.kind else {
            return None;
        };
        let init = match pool.init {
            PoolInit::Count(n) => format!("n = {n:e}"),
            PoolInit::Concentration(conc) => format!("conc = {conc:e} mM"),
        };
        Some(vec![
            network.path(id),
            element.kind.class_name().to_string(),
            init,
        ])
    }
}

impl TableRecord for ReactionRecord {
    fn columns() -> Vec<String> {
        columns(&["Path", "Class", "Equation", "Constants"])
    }

    fn to_record(network: &Network, id: ElementId) -> Option<Vec<String>> {
        let element = network.get(id).ok()?;
        let ElementKind::Reaction(reaction) = &element.kind else {
            return None;
        };
        let constants = match reaction {
            Reaction::Plain(reac) => format!("kf = {}, kb = {}", reac.kf, reac.kb),
            Reaction::MichaelisMenten(enz) => format!("kcat = {}, Km = {}", enz.kcat, enz.km),
            Reaction::Enzyme(enz) => format!(
                "k1 = {}, k2 = {}, k3 = {}",
                enz.conc_k1, enz.k2, enz.k3
            ),
            Reaction::Channel(chan) => format!("permeability = {}", chan.permeability),
        };
        Some(vec![
            network.path(id),
            element.kind.class_name().to_string(),
            format!(
                "{} -> {}",
                names(network, reaction.substrates()),
                names(network, reaction.products())
            ),
            constants,
        ])
    }
}

impl TableRecord for FunctionRecord {
    fn columns() -> Vec<String> {
        columns(&["Path", "Expression", "Inputs"])
    }

    fn to_record(network: &Network, id: ElementId) -> Option<Vec<String>> {
        let element = network.get(id).ok()?;
        let ElementKind::Function(function) = &element.kind else {
            return None;
        };
        Some(vec![
            network.path(id),
            function.expr.clone(),
            names(network, &function.inputs),
        ])
    }
}
