//! The resource graph.
//!
//! Owns every resource of a build, keyed by canonical path, plus the
//! navigation tree of advertised resources.
//!
//! ```text
//! ResourceGraph
//! ├── resources: Vec<Option<Resource>>   (insertion order, None = removed)
//! ├── index:     PathAddress -> ResourceId
//! └── tree:      arena of path segments, content -> ResourceId
//! ```
//!
//! Resources hold the `NodeId` of their tree node; the tree holds
//! `ResourceId`s. Neither owns the other.

mod tree;

pub use tree::{NodeId, Tree};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::PathAddress;
use crate::resource::Resource;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate resource path: {0}")]
    DuplicatePath(PathAddress),
}

/// Stable handle to a resource slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

#[cfg(test)]
impl ResourceId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug)]
pub struct ResourceGraph {
    resources: Vec<Option<Resource>>,
    index: FxHashMap<PathAddress, ResourceId>,
    tree: Tree,
    shorten: bool,
}

impl ResourceGraph {
    pub fn new(shorten: bool) -> Self {
        Self {
            resources: Vec::new(),
            index: FxHashMap::default(),
            tree: Tree::new(),
            shorten,
        }
    }

    pub fn shorten(&self) -> bool {
        self.shorten
    }

    /// Register a resource under its canonical path.
    pub fn add(&mut self, mut resource: Resource) -> Result<ResourceId, GraphError> {
        if self.index.contains_key(resource.address()) {
            return Err(GraphError::DuplicatePath(resource.address().clone()));
        }

        let id = ResourceId(self.resources.len());
        if resource.visibility.advertise {
            let node = self.tree.attach(resource.address().segments(), id);
            resource.set_node(Some(node));
        }

        self.index.insert(resource.address().clone(), id);
        self.resources.push(Some(resource));
        Ok(id)
    }

    /// Take a resource out of the graph and the tree.
    pub fn remove(&mut self, id: ResourceId) -> Option<Resource> {
        let mut resource = self.resources.get_mut(id.0)?.take()?;
        self.index.remove(resource.address());
        if let Some(node) = resource.node() {
            self.tree.detach(node);
            resource.set_node(None);
        }
        Some(resource)
    }

    /// Re-attach or detach the tree node after visibility changed.
    pub fn sync_node(&mut self, id: ResourceId) {
        let Some(Some(resource)) = self.resources.get_mut(id.0) else {
            return;
        };
        match (resource.visibility.advertise, resource.node()) {
            (true, None) => {
                let node = self.tree.attach(resource.address().segments(), id);
                resource.set_node(Some(node));
            }
            (false, Some(node)) => {
                self.tree.detach(node);
                resource.set_node(None);
            }
            _ => {}
        }
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id.0)?.as_mut()
    }

    /// Exact lookup by canonical path.
    pub fn id_of(&self, address: &PathAddress) -> Option<ResourceId> {
        self.index.get(address).copied()
    }

    /// Look up a path or public URI.
    ///
    /// Tries the canonical form, then `.html` (when shortening), then the
    /// directory form.
    pub fn find_id(&self, path_or_uri: &str) -> Option<ResourceId> {
        let address = PathAddress::new(path_or_uri);
        if let Some(id) = self.id_of(&address) {
            return Some(id);
        }
        if address.is_directory() {
            return None;
        }
        let raw = address.as_str();
        if self.shorten
            && let Some(id) = self.id_of(&PathAddress::new(&format!("{raw}.html")))
        {
            return Some(id);
        }
        self.id_of(&PathAddress::new(&format!("{raw}/")))
    }

    pub fn find(&self, path_or_uri: &str) -> Option<&Resource> {
        self.find_id(path_or_uri).and_then(|id| self.get(id))
    }

    /// Live resources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (ResourceId(i), r)))
    }

    /// Snapshot of live ids, for stages that mutate while iterating.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn select(&self, mut predicate: impl FnMut(&Resource) -> bool) -> Vec<ResourceId> {
        self.iter()
            .filter(|(_, r)| predicate(r))
            .map(|(id, _)| id)
            .collect()
    }

    /// Resources whose kind has the given label (`"document"`, `"image"`, ...).
    pub fn of_type(&self, label: &str) -> Vec<ResourceId> {
        self.select(|r| r.kind.label() == label)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // ------------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------------

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Nearest advertised ancestor.
    pub fn parent(&self, id: ResourceId) -> Option<ResourceId> {
        let node = self.get(id)?.node()?;
        self.tree.content_parent(node)
    }

    /// Advertised resources directly below, in insertion order.
    pub fn children(&self, id: ResourceId) -> Vec<ResourceId> {
        self.get(id)
            .and_then(Resource::node)
            .map(|node| self.tree.content_children(node))
            .unwrap_or_default()
    }

    /// Other children of the parent.
    pub fn siblings(&self, id: ResourceId) -> Vec<ResourceId> {
        self.parent(id)
            .map(|parent| {
                let mut siblings = self.children(parent);
                siblings.retain(|&s| s != id);
                siblings
            })
            .unwrap_or_default()
    }
}
