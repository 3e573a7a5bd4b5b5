use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{Result, SlotError};

/// Handle to a node in a [`Document`]. Holding one does not keep the node alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A live element able to host projected content.
pub type MountPoint = NodeId;

pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String, attrs: Attributes },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }
}

/// Arena of element and text nodes hanging off a single root element.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node::new(NodeKind::Element {
                tag: "root".to_string(),
                attrs: Attributes::new(),
            }),
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Attributes::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(NodeKind::Text(text.to_string()))
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind));
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(SlotError::NodeNotFound(id))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id)?.kind {
            attrs.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Replace every attribute of an element in one step.
    pub fn replace_attrs(&mut self, id: NodeId, next: Attributes) -> Result<()> {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id)?.kind {
            *attrs = next;
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        if let NodeKind::Text(current) = &mut self.node_mut(id)?.kind {
            if current != text {
                *current = text.to_string();
            }
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.move_to_end(parent, &[child])
    }

    /// Place `leading` first under `parent`, in order, keeping every other
    /// existing child after them in its current relative order.
    pub fn arrange_leading(&mut self, parent: NodeId, leading: &[NodeId]) -> Result<()> {
        self.adopt(parent, leading)?;
        let node = self.node_mut(parent)?;
        let mut children: Vec<NodeId> = leading.to_vec();
        children.extend(node.children.iter().filter(|id| !leading.contains(id)));
        node.children = children;
        Ok(())
    }

    /// Move `nodes` to the end of `parent`'s children, in order.
    pub fn move_to_end(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<()> {
        self.adopt(parent, nodes)?;
        let node = self.node_mut(parent)?;
        node.children.retain(|id| !nodes.contains(id));
        node.children.extend_from_slice(nodes);
        Ok(())
    }

    fn adopt(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<()> {
        if !self.contains(parent) {
            return Err(SlotError::NodeNotFound(parent));
        }
        for &child in nodes {
            let previous = self.node_mut(child)?.parent;
            if previous != Some(parent) {
                self.detach(child);
                self.node_mut(child)?.parent = Some(parent);
            }
        }
        Ok(())
    }

    /// Unlink a node from its parent while keeping its subtree alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(&id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|child| *child != id);
        }
    }

    /// Drop a node and its subtree. Returns `false` when there was nothing to
    /// remove; the root is never removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        true
    }

}
