//! Arena of named elements addressed by slash-separated paths.
//!
//! The [`Network`] owns every element of a translated model. Elements form a tree rooted
//! at [`ElementId::ROOT`]; a child is addressed by its parent and its name, and every
//! element has exactly one absolute path such as `/model/kinetics/glu`. Deleted elements
//! leave an empty slot behind so that ids handed out earlier never alias a new element.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::network::error::NetworkError;
use crate::network::objects::{Compartment, ElementKind, Info, Pool, Reaction};

/// Index of an element inside a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(usize);

impl ElementId {
    /// Id of the root element of every network
    pub const ROOT: ElementId = ElementId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A single node of the network tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub name: String,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Info::is_empty")]
    pub info: Info,
}

/// Element counts of a network, grouped by class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub compartments: usize,
    pub pools: usize,
    pub buffered_pools: usize,
    pub reactions: usize,
    pub mm_enzymes: usize,
    pub enzymes: usize,
    pub channels: usize,
    pub functions: usize,
    pub tables: usize,
}

/// Tree of network elements stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Network {
    elements: Vec<Option<Element>>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Creates a network holding only the unnamed root folder.
    pub fn new() -> Self {
        let root = Element {
            name: String::new(),
            parent: None,
            children: Vec::new(),
            kind: ElementKind::Neutral,
            info: Info::default(),
        };

        Self {
            elements: vec![Some(root)],
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId::ROOT
    }

    /// Returns the element behind `id`, failing if it was never created or has been deleted.
    pub fn get(&self, id: ElementId) -> Result<&Element, NetworkError> {
        self.elements
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(NetworkError::NotFound(id.0))
    }

    pub fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, NetworkError> {
        self.elements
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(NetworkError::NotFound(id.0))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_ok()
    }

    /// Creates a new element named `name` below `parent`.
    ///
    /// # Arguments
    /// * `parent` - Element the new element is attached to
    /// * `name` - Name of the new element, unique among its siblings
    /// * `kind` - Payload of the new element
    ///
    /// # Returns
    /// The id of the new element
    ///
    /// # Errors
    /// * `NetworkError::InvalidName` - The name is empty or contains `/`
    /// * `NetworkError::DuplicateName` - A sibling already carries this name
    /// * `NetworkError::NotFound` - The parent does not exist
    pub fn create(
        &mut self,
        parent: ElementId,
        name: &str,
        kind: ElementKind,
    ) -> Result<ElementId, NetworkError> {
        if name.is_empty() || name.contains('/') {
            return Err(NetworkError::InvalidName(name.to_string()));
        }

        if self.child(parent, name).is_some() {
            return Err(NetworkError::DuplicateName {
                parent: self.path(parent),
                name: name.to_string(),
            });
        }

        let id = ElementId(self.elements.len());
        self.get_mut(parent)?.children.push(id);
        self.elements.push(Some(Element {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
            info: Info::default(),
        }));

        Ok(id)
    }

    /// Returns the child of `parent` carrying `name`, if any.
    pub fn child(&self, parent: ElementId, name: &str) -> Option<ElementId> {
        let parent = self.get(parent).ok()?;
        parent
            .children
            .iter()
            .copied()
            .find(|child| matches!(self.get(*child), Ok(element) if element.name == name))
    }

    pub fn children(&self, parent: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.get(parent)
            .map(|element| element.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }

    /// Resolves an absolute path such as `/model/kinetics/glu`.
    ///
    /// Empty segments are ignored, so `/model//kinetics/` and `model/kinetics` resolve to
    /// the same element.
    pub fn lookup(&self, path: &str) -> Option<ElementId> {
        self.lookup_from(ElementId::ROOT, path)
    }

    /// Resolves `path` relative to `start`.
    pub fn lookup_from(&self, start: ElementId, path: &str) -> Option<ElementId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(start, |current, segment| self.child(current, segment))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Absolute path of an element; the root is `/`.
    pub fn path(&self, id: ElementId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);

        while let Some(element) = current.and_then(|id| self.get(id).ok()) {
            if element.parent.is_some() {
                segments.push(element.name.as_str());
            }
            current = element.parent;
        }

        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Walks `path` below `start`, creating a neutral folder for every missing segment.
    ///
    /// # Returns
    /// The id of the element the full path resolves to
    pub fn ensure_path(&mut self, start: ElementId, path: &str) -> Result<ElementId, NetworkError> {
        let mut current = start;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            current = match self.child(current, segment) {
                Some(existing) => existing,
                None => self.create(current, segment, ElementKind::Neutral)?,
            };
        }

        Ok(current)
    }

    /// Deep-copies `source` and its whole subtree under `new_parent`, keeping names.
    ///
    /// Payloads are cloned as they are; ids stored inside payloads keep pointing at the
    /// elements they referenced before the copy.
    pub fn copy(&mut self, source: ElementId, new_parent: ElementId) -> Result<ElementId, NetworkError> {
        if source == ElementId::ROOT {
            return Err(NetworkError::RootElement);
        }

        let element = self.get(source)?.clone();
        let copied = self.create(new_parent, &element.name, element.kind)?;
        self.get_mut(copied)?.info = element.info;

        for child in element.children {
            self.copy(child, copied)?;
        }

        Ok(copied)
    }

    /// Removes an element together with its whole subtree.
    pub fn delete(&mut self, id: ElementId) -> Result<(), NetworkError> {
        if id == ElementId::ROOT {
            return Err(NetworkError::RootElement);
        }

        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|child| *child != id);
        }

        for descendant in self.descendants(id) {
            self.elements[descendant.0] = None;
        }

        Ok(())
    }

    /// Ids of `id` and everything below it, in depth-first pre-order.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut stack = vec![id];
        let mut visited = Vec::new();

        while let Some(current) = stack.pop() {
            if let Ok(element) = self.get(current) {
                visited.push(current);
                stack.extend(element.children.iter().rev().copied());
            }
        }

        visited
    }

    /// Iterates over all live elements in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| element.as_ref().map(|element| (ElementId(index), element)))
    }

    pub fn set_info(&mut self, id: ElementId, info: Info) -> Result<(), NetworkError> {
        self.get_mut(id)?.info = info;
        Ok(())
    }

    // ============================================================================================
    // TYPED ACCESS
    // ============================================================================================

    pub fn compartment(&self, id: ElementId) -> Result<&Compartment, NetworkError> {
        match &self.get(id)?.kind {
            ElementKind::Compartment(compartment) => Ok(compartment),
            _ => Err(self.wrong_kind(id, "compartment")),
        }
    }

    pub fn compartment_mut(&mut self, id: ElementId) -> Result<&mut Compartment, NetworkError> {
        let expected = self.wrong_kind(id, "compartment");
        match &mut self.get_mut(id)?.kind {
            ElementKind::Compartment(compartment) => Ok(compartment),
            _ => Err(expected),
        }
    }

    pub fn pool(&self, id: ElementId) -> Result<&Pool, NetworkError> {
        match &self.get(id)?.kind {
            ElementKind::Pool(pool) => Ok(pool),
            _ => Err(self.wrong_kind(id, "pool")),
        }
    }

    pub fn reaction(&self, id: ElementId) -> Result<&Reaction, NetworkError> {
        match &self.get(id)?.kind {
            ElementKind::Reaction(reaction) => Ok(reaction),
            _ => Err(self.wrong_kind(id, "reaction")),
        }
    }

    /// Volume (m³) of the compartment a pool belongs to.
    pub fn pool_volume(&self, id: ElementId) -> Result<f64, NetworkError> {
        let pool = self.pool(id)?;
        Ok(self.compartment(pool.compartment)?.volume)
    }

    /// Nearest ancestor of `id` (itself included) that is a compartment.
    pub fn compartment_of(&self, id: ElementId) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(element_id) = current {
            let element = self.get(element_id).ok()?;
            if element.kind.is_compartment() {
                return Some(element_id);
            }
            current = element.parent;
        }
        None
    }

    fn wrong_kind(&self, id: ElementId, expected: &'static str) -> NetworkError {
        NetworkError::WrongKind {
            path: self.path(id),
            expected,
        }
    }

    // ============================================================================================
    // INSPECTION
    // ============================================================================================

    /// Counts the elements below `start` by class.
    pub fn summary(&self, start: ElementId) -> NetworkSummary {
        let mut summary = NetworkSummary::default();

        for id in self.descendants(start) {
            let Ok(element) = self.get(id) else { continue };
            match &element.kind {
                ElementKind::Neutral => {}
                ElementKind::Compartment(_) => summary.compartments += 1,
                ElementKind::Pool(pool) if pool.buffered => summary.buffered_pools += 1,
                ElementKind::Pool(_) => summary.pools += 1,
                ElementKind::Reaction(Reaction::Plain(_)) => summary.reactions += 1,
                ElementKind::Reaction(Reaction::MichaelisMenten(_)) => summary.mm_enzymes += 1,
                ElementKind::Reaction(Reaction::Enzyme(_)) => summary.enzymes += 1,
                ElementKind::Reaction(Reaction::Channel(_)) => summary.channels += 1,
                ElementKind::Function(_) => summary.functions += 1,
                ElementKind::Table(_) => summary.tables += 1,
            }
        }

        summary
    }

    /// Maps the path of every element below `start` to its class name.
    ///
    /// Two translations of the same document yield equal maps.
    pub fn outline(&self, start: ElementId) -> BTreeMap<String, &'static str> {
        self.descendants(start)
            .into_iter()
            .filter_map(|id| {
                self.get(id)
                    .ok()
                    .map(|element| (self.path(id), element.kind.class_name()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::network::objects::{MeshKind, PoolInit};

    fn cube(volume: f64) -> ElementKind {
        ElementKind::Compartment(Compartment {
            sbml_id: "cell".to_string(),
            mesh: MeshKind::Cube,
            volume,
            spatial_dimensions: 3,
            is_membrane_bound: false,
            num_diff_compts: None,
        })
    }

    fn pool(compartment: ElementId) -> ElementKind {
        ElementKind::Pool(Pool {
            species_id: "A".to_string(),
            buffered: false,
            constant: false,
            only_substance_units: false,
            init: PoolInit::Concentration(1.0),
            diff_const: 0.0,
            motor_const: 0.0,
            compartment,
        })
    }

    #[test]
    fn test_create_and_lookup() {
        // Arrange
        let mut network = Network::new();
        let model = network.ensure_path(network.root(), "/model").unwrap();

        // Act
        let cell = network.create(model, "cell", cube(1e-15)).unwrap();
        let a = network.create(cell, "A", pool(cell)).unwrap();

        // Assert
        assert_eq!(network.path(a), "/model/cell/A");
        assert_eq!(network.lookup("/model/cell/A"), Some(a));
        assert_eq!(network.lookup("model//cell/"), Some(cell));
        assert_eq!(network.path(network.root()), "/");
        assert_eq!(network.compartment_of(a), Some(cell));
        assert_eq!(network.pool_volume(a).unwrap(), 1e-15);
    }

    #[test]
    fn test_duplicate_and_invalid_names_are_rejected() {
        let mut network = Network::new();
        let root = network.root();
        network.create(root, "a", ElementKind::Neutral).unwrap();

        assert_eq!(
            network.create(root, "a", ElementKind::Neutral),
            Err(NetworkError::DuplicateName {
                parent: "/".to_string(),
                name: "a".to_string()
            })
        );
        assert!(matches!(
            network.create(root, "a/b", ElementKind::Neutral),
            Err(NetworkError::InvalidName(_))
        ));
        assert!(matches!(
            network.create(root, "", ElementKind::Neutral),
            Err(NetworkError::InvalidName(_))
        ));
    }

    #[test]
    fn test_copy_is_deep_and_independent() {
        // Arrange
        let mut network = Network::new();
        let root = network.root();
        let cell = network.create(root, "cell", cube(1.0)).unwrap();
        let complex = network.create(cell, "ES", pool(cell)).unwrap();
        network.create(complex, "notes", ElementKind::Neutral).unwrap();
        let enzyme = network.create(cell, "enz", ElementKind::Neutral).unwrap();

        // Act
        let copied = network.copy(complex, enzyme).unwrap();
        network.delete(complex).unwrap();

        // Assert
        assert_eq!(network.path(copied), "/cell/enz/ES");
        assert!(network.exists("/cell/enz/ES/notes"));
        assert!(!network.exists("/cell/ES"));
        assert!(!network.contains(complex));
        assert_eq!(network.pool(copied).unwrap().compartment, cell);
    }

    #[test]
    fn test_delete_removes_subtree_and_root_is_protected() {
        let mut network = Network::new();
        let root = network.root();
        let a = network.ensure_path(root, "a/b/c").unwrap();

        network.delete(network.lookup("/a").unwrap()).unwrap();

        assert!(!network.contains(a));
        assert_eq!(network.iter().count(), 1);
        assert_eq!(network.delete(root), Err(NetworkError::RootElement));
    }

    #[test]
    fn test_summary_and_outline() {
        let mut network = Network::new();
        let root = network.root();
        let cell = network.create(root, "cell", cube(1.0)).unwrap();
        network.create(cell, "A", pool(cell)).unwrap();

        let summary = network.summary(root);
        assert_eq!(summary.compartments, 1);
        assert_eq!(summary.pools, 1);

        let outline = network.outline(root);
        assert_eq!(outline.get("/cell/A"), Some(&"Pool"));
        assert_eq!(outline.get("/cell"), Some(&"CubeMesh"));
    }

    #[test]
    fn test_typed_access_reports_wrong_kind() {
        let mut network = Network::new();
        let root = network.root();
        let folder = network.create(root, "f", ElementKind::Neutral).unwrap();

        assert_eq!(
            network.pool(folder),
            Err(NetworkError::WrongKind {
                path: "/f".to_string(),
                expected: "pool"
            })
        );
    }
}
