//! Arena-backed navigation tree.
//!
//! Nodes are path segments. A node optionally holds the resource published
//! at its path. Nodes are never freed; unlinked nodes just become unreachable,
//! so a `NodeId` handed out earlier cannot alias a different node later.

use super::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    content: Option<ResourceId>,
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                content: None,
            }],
        }
    }

    /// Place `content` at the node for `segments`, creating nodes on the way.
    pub fn attach<'a>(
        &mut self,
        segments: impl IntoIterator<Item = &'a str>,
        content: ResourceId,
    ) -> NodeId {
        let mut current = Self::ROOT;
        for segment in segments {
            current = match self.child_named(current, segment) {
                Some(child) => child,
                None => self.push_child(current, segment),
            };
        }
        self.nodes[current.0].content = Some(content);
        current
    }

    /// Clear the node's content and unlink it (and any emptied ancestors).
    pub fn detach(&mut self, id: NodeId) {
        self.nodes[id.0].content = None;

        let mut current = id;
        while current != Self::ROOT {
            let node = &self.nodes[current.0];
            if node.content.is_some() || !node.children.is_empty() {
                break;
            }
            let Some(parent) = node.parent else { break };
            self.nodes[parent.0].children.retain(|&c| c != current);
            self.nodes[current.0].parent = None;
            current = parent;
        }
    }

    pub fn content(&self, id: NodeId) -> Option<ResourceId> {
        self.nodes[id.0].content
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    #[cfg(test)]
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Nearest ancestor that holds content.
    pub fn content_parent(&self, id: NodeId) -> Option<ResourceId> {
        let mut current = self.nodes[id.0].parent;
        while let Some(node) = current {
            if let Some(content) = self.nodes[node.0].content {
                return Some(content);
            }
            current = self.nodes[node.0].parent;
        }
        None
    }

    /// Nearest descendants that hold content, in insertion order.
    ///
    /// Empty intermediate nodes are looked through, so `/a/` lists
    /// `/a/b/c.html` when `/a/b/` itself has no resource.
    pub fn content_children(&self, id: NodeId) -> Vec<ResourceId> {
        let mut found = Vec::new();
        self.collect_content(id, &mut found);
        found
    }

    fn collect_content(&self, id: NodeId, found: &mut Vec<ResourceId>) {
        for &child in &self.nodes[id.0].children {
            match self.nodes[child.0].content {
                Some(content) => found.push(content),
                None => self.collect_content(child, found),
            }
        }
    }

    /// Depth-first walk from the root, calling `visit(depth, node)`.
    pub fn walk(&self, mut visit: impl FnMut(usize, NodeId)) {
        let mut stack = vec![(0usize, Self::ROOT)];
        while let Some((depth, id)) = stack.pop() {
            visit(depth, id);
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == name)
    }

    fn push_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            content: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}
