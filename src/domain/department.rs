//! Department hierarchy
//!
//! Departments are stored flat (`id`, `name`, `parent_id`) and materialized
//! into a [`Forest`] of nested [`Node`]s for display and lookup.
//! Sibling order is record order. Lookups never fail: a missing ID is `None`.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::id::DepartmentId;

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("Department {0} has an empty name")]
    EmptyName(DepartmentId),

    #[error("Duplicate department ID: {0}")]
    DuplicateId(DepartmentId),

    #[error("Department {id} references unknown parent {parent}")]
    UnknownParent {
        id: DepartmentId,
        parent: DepartmentId,
    },

    #[error("Department hierarchy contains a cycle through {0}")]
    Cycle(DepartmentId),
}

/// Flat department record, as stored in the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub parent_id: Option<DepartmentId>,
}

impl Department {
    /// Creates a top-level department (business unit)
    pub fn root(id: DepartmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
        }
    }

    /// Creates a department under `parent`
    pub fn child(id: DepartmentId, name: impl Into<String>, parent: DepartmentId) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: Some(parent),
        }
    }
}

/// A department with its nested children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: DepartmentId,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Node>,
}

/// `"children": null` means the same as an absent list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Node>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Node {
    /// Creates a node without children
    pub fn leaf(id: DepartmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Creates a node with the given children
    pub fn with_children(id: DepartmentId, name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            id,
            name: name.into(),
            children,
        }
    }

    /// Returns true if the node has at least one child
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Iterates over all descendants in pre-order (excluding self)
    pub fn descendants(&self) -> impl Iterator<Item = &Node> {
        Preorder::new(&self.children).map(|(_, node)| node)
    }
}

/// Ordered sequence of top-level departments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Node>", into = "Vec<Node>")]
pub struct Forest {
    roots: Vec<Node>,
}

impl TryFrom<Vec<Node>> for Forest {
    type Error = TreeError;

    fn try_from(roots: Vec<Node>) -> Result<Self, Self::Error> {
        Self::from_roots(roots)
    }
}

impl From<Forest> for Vec<Node> {
    fn from(forest: Forest) -> Self {
        forest.roots
    }
}

impl Forest {
    /// Creates an empty forest
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a forest from root nodes, rejecting empty names and duplicate IDs
    pub fn from_roots(roots: Vec<Node>) -> Result<Self, TreeError> {
        let forest = Self { roots };
        forest.validate()?;
        Ok(forest)
    }

    /// Materializes flat records into a forest.
    ///
    /// Roots are records without a parent; children keep record order.
    pub fn from_records(records: &[Department]) -> Result<Self, TreeError> {
        let mut seen: HashMap<&DepartmentId, usize> = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if record.name.trim().is_empty() {
                return Err(TreeError::EmptyName(record.id.clone()));
            }
            if seen.insert(&record.id, idx).is_some() {
                return Err(TreeError::DuplicateId(record.id.clone()));
            }
        }

        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(records.len(), records.len());
        let indices: Vec<NodeIndex> = (0..records.len()).map(|i| graph.add_node(i)).collect();
        let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        let mut root_list = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            match &record.parent_id {
                None => root_list.push(idx),
                Some(parent) => {
                    let parent_idx = *seen.get(parent).ok_or_else(|| TreeError::UnknownParent {
                        id: record.id.clone(),
                        parent: parent.clone(),
                    })?;
                    graph.add_edge(indices[parent_idx], indices[idx], ());
                    children_of[parent_idx].push(idx);
                }
            }
        }

        // Parents come before children in topological order
        let order = toposort(&graph, None)
            .map_err(|cycle| TreeError::Cycle(records[graph[cycle.node_id()]].id.clone()))?;

        let mut built: Vec<Option<Node>> = vec![None; records.len()];
        for node_idx in order.into_iter().rev() {
            let idx = graph[node_idx];
            let children = children_of[idx]
                .iter()
                .filter_map(|child| built[*child].take())
                .collect();
            let record = &records[idx];
            built[idx] = Some(Node::with_children(
                record.id.clone(),
                record.name.clone(),
                children,
            ));
        }

        let roots = root_list
            .into_iter()
            .filter_map(|idx| built[idx].take())
            .collect();

        Ok(Self { roots })
    }

    /// Checks for empty names and duplicate IDs; deserialization runs this too
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen = HashSet::new();
        for node in self.iter() {
            if node.name.trim().is_empty() {
                return Err(TreeError::EmptyName(node.id.clone()));
            }
            if !seen.insert(&node.id) {
                return Err(TreeError::DuplicateId(node.id.clone()));
            }
        }
        Ok(())
    }

    /// Returns the root nodes
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Returns the total number of nodes at all depths
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if there are no roots
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterates over all nodes in depth-first pre-order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.walk().map(|(_, node)| node)
    }

    /// Iterates over all nodes in pre-order together with their depth
    pub fn walk(&self) -> Preorder<'_> {
        Preorder::new(&self.roots)
    }

    /// Finds the node with the given ID at any depth
    pub fn find_node(&self, id: &DepartmentId) -> Option<&Node> {
        self.iter().find(|node| &node.id == id)
    }

    /// Returns true if a node with the given ID exists
    pub fn contains(&self, id: &DepartmentId) -> bool {
        self.find_node(id).is_some()
    }

    /// Returns the display name of the node with the given ID
    pub fn resolve_name(&self, id: &DepartmentId) -> Option<&str> {
        self.find_node(id).map(|node| node.name.as_str())
    }

    /// Returns the chain of nodes from a root down to the given ID
    pub fn path_to(&self, id: &DepartmentId) -> Option<Vec<&Node>> {
        let mut path: Vec<&Node> = Vec::new();
        for (depth, node) in self.walk() {
            path.truncate(depth);
            path.push(node);
            if &node.id == id {
                return Some(path);
            }
        }
        None
    }

    /// Returns the breadcrumb label (`Unit / Dept / Section`) for an ID
    pub fn breadcrumb(&self, id: &DepartmentId) -> Option<String> {
        self.path_to(id).map(|path| {
            path.iter()
                .map(|node| node.name.as_str())
                .collect::<Vec<_>>()
                .join(" / ")
        })
    }
}

/// Depth-first pre-order traversal with an explicit stack
pub struct Preorder<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Preorder<'a> {
    fn new(roots: &'a [Node]) -> Self {
        Self {
            stack: roots.iter().rev().map(|node| (0, node)).collect(),
        }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}
