//! The append-only tree construction capability renderers write through.

use crate::document::NodeKind;

/// First and last node of a contiguous run of siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds<N> {
    parent: N,
    first: N,
    last: N,
}

impl<N> Bounds<N> {
    pub fn new(parent: N, first: N, last: N) -> Self {
        Self {
            parent,
            first,
            last,
        }
    }

    pub fn parent(&self) -> &N {
        &self.parent
    }

    pub fn first(&self) -> &N {
        &self.first
    }

    pub fn last(&self) -> &N {
        &self.last
    }
}

/// Cursor-based builder that appends nodes at the current insertion point.
///
/// The cursor is an element plus an optional next sibling: new nodes are
/// inserted into the element before that sibling, or appended when there
/// is none. Calls must arrive in render order.
pub trait TreeBuilder {
    /// Addressable node handle.
    type Node: Clone;
    type Error;

    /// Append an element and move the cursor into it.
    fn open_element(&mut self, tag: &str) -> Result<Self::Node, Self::Error>;

    /// Set an attribute on the most recently opened element.
    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), Self::Error>;

    fn close_element(&mut self) -> Result<(), Self::Error>;

    fn open_block(&mut self) -> Result<(), Self::Error>;

    fn close_block(&mut self) -> Result<(), Self::Error>;

    fn append_text(&mut self, text: &str) -> Result<Self::Node, Self::Error>;

    fn append_comment(&mut self, text: &str) -> Result<Self::Node, Self::Error>;

    /// Append pre-rendered markup, returning the bounds of what was inserted.
    fn append_raw_markup(&mut self, html: &str) -> Result<Bounds<Self::Node>, Self::Error>;

    /// Move the cursor into `element` (before `next_sibling`) until the
    /// matching `pop_remote_element`.
    fn push_remote_element(
        &mut self,
        element: Self::Node,
        cursor_id: &str,
        next_sibling: Option<Self::Node>,
    ) -> Result<(), Self::Error>;

    fn pop_remote_element(&mut self) -> Result<(), Self::Error>;

    /// Element the cursor currently inserts into.
    fn current_element(&self) -> Self::Node;

    /// Node immediately before the cursor, if any.
    fn preceding_node(&self) -> Option<Self::Node>;

    /// Node immediately after the cursor, if any.
    fn following_node(&self) -> Option<Self::Node>;

    fn node_kind(&self, node: &Self::Node) -> Option<NodeKind>;

    /// Create an element with `attributes` and insert it into `parent`
    /// before `next_sibling`, without moving the cursor.
    fn insert_element_before(
        &mut self,
        parent: &Self::Node,
        tag: &str,
        attributes: &[(&str, &str)],
        next_sibling: Option<&Self::Node>,
    ) -> Result<Self::Node, Self::Error>;
}
