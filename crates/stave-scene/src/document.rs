//! Arena-backed document tree.
//!
//! Nodes are allocated once and never freed; detaching a node only unlinks
//! it from its parent. A `NodeId` is therefore valid for the lifetime of
//! its document.

use crate::error::SceneError;
use serde::{Deserialize, Serialize};

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Coarse node classification, as seen by tree builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Fragment,
    Element,
    Text,
    Comment,
    RawMarkup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document root; serializes as its children only.
    Fragment,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    /// Pre-rendered markup, emitted verbatim.
    RawMarkup(String),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::RawMarkup(_) => NodeKind::RawMarkup,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A tree of nodes rooted in a fragment.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeSlot>,
}

impl Document {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![NodeSlot {
                data: NodeData::Fragment,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_owned(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_owned()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_owned()))
    }

    pub fn create_raw_markup(&mut self, html: &str) -> NodeId {
        self.alloc(NodeData::RawMarkup(html.to_owned()))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).map(|slot| &slot.data)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(NodeData::kind)
    }

    /// Text content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.get(id)? {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Payload of a comment node.
    pub fn comment(&self, id: NodeId) -> Option<&str> {
        match self.get(id)? {
            NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.get(id)? {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Set or replace an attribute on an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), SceneError> {
        self.check(id)?;
        match &mut self.nodes[id.index()].data {
            NodeData::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(key, _)| key == name) {
                    Some((_, existing)) => *existing = value.to_owned(),
                    None => attributes.push((name.to_owned(), value.to_owned())),
                }
                Ok(())
            }
            _ => Err(SceneError::NotAnElement(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index())?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let position = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, position))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, position) = self.position(id)?;
        position
            .checked_sub(1)
            .map(|previous| self.children(parent)[previous])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, position) = self.position(id)?;
        self.children(parent).get(position + 1).copied()
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Unlink a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, position)) = self.position(id) {
            self.nodes[parent.index()].children.remove(position);
            self.nodes[id.index()].parent = None;
        }
    }

    /// Insert `child` into `parent` before `next_sibling`, or last when `None`.
    ///
    /// An attached `child` is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        next_sibling: Option<NodeId>,
    ) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;

        if !matches!(self.kind(parent), Some(NodeKind::Element | NodeKind::Fragment)) {
            return Err(SceneError::NotAnElement(parent));
        }
        if let Some(next) = next_sibling {
            self.check(next)?;
            if self.parent(next) != Some(parent) {
                return Err(SceneError::NotAChild { parent, child: next });
            }
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(SceneError::HierarchyRequest { parent, child });
        }
        if next_sibling == Some(child) {
            return Ok(());
        }

        self.detach(child);
        let position = match next_sibling {
            Some(next) => self.position(next).map_or(0, |(_, position)| position),
            None => self.children(parent).len(),
        };
        self.nodes[parent.index()].children.insert(position, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert_before(parent, child, None)
    }

    /// Coalesce adjacent text nodes and drop empty ones below `id`.
    ///
    /// This is the normalization a host applies when it re-parses
    /// serialized output, so anything that must stay distinguishable
    /// cannot rely on text node boundaries.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            let text = self.text(child).map(str::to_owned);
            match text {
                Some(text) if text.is_empty() => {
                    self.nodes[child.index()].parent = None;
                }
                Some(text) => {
                    let previous_text = kept
                        .last()
                        .copied()
                        .filter(|&previous| self.kind(previous) == Some(NodeKind::Text));
                    match previous_text {
                        Some(previous) => {
                            if let NodeData::Text(existing) = &mut self.nodes[previous.index()].data {
                                existing.push_str(&text);
                            }
                            self.nodes[child.index()].parent = None;
                        }
                        None => kept.push(child),
                    }
                }
                None => {
                    self.normalize(child);
                    kept.push(child);
                }
            }
        }

        self.nodes[id.index()].children = kept;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
