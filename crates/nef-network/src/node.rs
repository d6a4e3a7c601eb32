// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Nodes and the node registry

use crate::ensemble::Ensemble;
use crate::errors::{NetworkError, NetworkResult};
use crate::filter::FilteredInput;
use crate::input::Input;
use crate::origin::Origin;
use crate::probe::Probe;
use crate::simple_node::SimpleNode;
use ahash::AHashMap;

/// Position of a node in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A specific origin on a specific node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginRef {
    pub node: NodeIndex,
    pub origin: usize,
}

#[derive(Debug)]
pub enum Node {
    Ensemble(Box<Ensemble>),
    Input(Input),
    SimpleNode(SimpleNode),
    Probe(Probe),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Ensemble(ensemble) => ensemble.name(),
            Node::Input(input) => input.name(),
            Node::SimpleNode(node) => node.name(),
            Node::Probe(probe) => probe.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Ensemble(_) => "ensemble",
            Node::Input(_) => "input",
            Node::SimpleNode(_) => "simple_node",
            Node::Probe(_) => "probe",
        }
    }

    pub fn origins(&self) -> &[Origin] {
        match self {
            Node::Ensemble(ensemble) => ensemble.origins(),
            Node::Input(input) => input.origins(),
            Node::SimpleNode(node) => node.origins(),
            Node::Probe(_) => &[],
        }
    }

    pub fn origin_index(&self, name: &str) -> Option<usize> {
        self.origins().iter().position(|origin| origin.name() == name)
    }

    /// Executed outside the fused step, once per timestep
    pub fn is_tick_driven(&self) -> bool {
        !matches!(self, Node::Ensemble(_))
    }

    /// Only ensembles produce a spike raster
    pub fn is_spiking(&self) -> bool {
        matches!(self, Node::Ensemble(_))
    }

    pub fn inputs(&self) -> &[FilteredInput] {
        match self {
            Node::Ensemble(ensemble) => ensemble.inputs(),
            Node::Input(_) => &[],
            Node::SimpleNode(node) => node.inputs(),
            Node::Probe(probe) => probe.inputs(),
        }
    }

    pub(crate) fn inputs_mut(&mut self) -> Option<&mut Vec<FilteredInput>> {
        match self {
            Node::Ensemble(ensemble) => Some(ensemble.inputs_mut()),
            Node::Input(_) => None,
            Node::SimpleNode(node) => Some(node.inputs_mut()),
            Node::Probe(probe) => Some(probe.inputs_mut()),
        }
    }

    /// Width a decoded connection into this node must produce
    pub fn input_dimensions(&self) -> Option<usize> {
        match self {
            Node::Ensemble(ensemble) => Some(ensemble.represented_width()),
            Node::SimpleNode(node) => Some(node.input_dimensions()),
            Node::Input(_) | Node::Probe(_) => None,
        }
    }

    pub fn as_ensemble(&self) -> Option<&Ensemble> {
        match self {
            Node::Ensemble(ensemble) => Some(&**ensemble),
            _ => None,
        }
    }

    pub(crate) fn as_ensemble_mut(&mut self) -> Option<&mut Ensemble> {
        match self {
            Node::Ensemble(ensemble) => Some(&mut **ensemble),
            _ => None,
        }
    }

    pub fn as_probe(&self) -> Option<&Probe> {
        match self {
            Node::Probe(probe) => Some(probe),
            _ => None,
        }
    }

    pub(crate) fn tick(&mut self, t: f64) -> NetworkResult<()> {
        match self {
            Node::Ensemble(_) => Ok(()),
            Node::Input(input) => input.tick(t),
            Node::SimpleNode(node) => node.tick(t),
            Node::Probe(probe) => {
                probe.tick(t);
                Ok(())
            }
        }
    }
}

impl From<Ensemble> for Node {
    fn from(ensemble: Ensemble) -> Self {
        Node::Ensemble(Box::new(ensemble))
    }
}

impl From<Input> for Node {
    fn from(input: Input) -> Self {
        Node::Input(input)
    }
}

impl From<SimpleNode> for Node {
    fn from(node: SimpleNode) -> Self {
        Node::SimpleNode(node)
    }
}

impl From<Probe> for Node {
    fn from(probe: Probe) -> Self {
        Node::Probe(probe)
    }
}

/// Name-indexed node storage; iteration follows registration order
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
    index: AHashMap<String, NodeIndex>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) -> NetworkResult<NodeIndex> {
        if self.index.contains_key(node.name()) {
            return Err(NetworkError::DuplicateName(node.name().to_string()));
        }
        let id = NodeIndex(self.nodes.len());
        self.index.insert(node.name().to_string(), id);
        self.nodes.push(node);
        Ok(id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> NetworkResult<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::UnknownName(name.to_string()))
    }

    pub fn get(&self, id: NodeIndex) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeIndex) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn origin(&self, origin: OriginRef) -> &Origin {
        &self.get(origin.node).origins()[origin.origin]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_rejects_duplicates_and_resolves_names() {
        let mut registry = NodeRegistry::new();
        let a = registry.insert(Input::new("a", 1.0).unwrap().into()).unwrap();
        let b = registry.insert(Input::new("b", 2.0).unwrap().into()).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(matches!(
            registry.insert(Input::new("a", 3.0).unwrap().into()),
            Err(NetworkError::DuplicateName(_))
        ));
        assert_eq!(registry.lookup("b").unwrap(), b);
        assert!(matches!(registry.lookup("c"), Err(NetworkError::UnknownName(_))));

        let names: Vec<_> = registry.iter().map(|(_, node)| node.name()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_input_is_tick_driven_with_identity_origin() {
        let node: Node = Input::new("a", vec![1.0, 2.0]).unwrap().into();
        assert!(node.is_tick_driven());
        assert!(!node.is_spiking());
        assert_eq!(node.origin_index("X"), Some(0));
        assert_eq!(node.input_dimensions(), None);
    }
}
