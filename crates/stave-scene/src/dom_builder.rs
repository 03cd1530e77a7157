//! [`TreeBuilder`] over an in-memory [`Document`].

use crate::document::{Document, NodeId, NodeKind};
use crate::error::SceneError;
use crate::tree_builder::{Bounds, TreeBuilder};
use log::debug;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Element,
    Remote,
}

/// Insertion point: new nodes go into `element` before `next_sibling`.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    element: NodeId,
    next_sibling: Option<NodeId>,
    kind: FrameKind,
}

/// Builds into a [`Document`], one cursor frame per open element or
/// remote element.
#[derive(Debug)]
pub struct DomBuilder {
    document: Document,
    root: Cursor,
    cursors: SmallVec<[Cursor; 8]>,
    /// Element each open block started in
    blocks: SmallVec<[NodeId; 8]>,
}

impl DomBuilder {
    /// Builder appending to the root of a fresh document.
    pub fn new() -> Self {
        let document = Document::new();
        let root = Cursor {
            element: document.root(),
            next_sibling: None,
            kind: FrameKind::Root,
        };
        Self {
            document,
            root,
            cursors: SmallVec::new(),
            blocks: SmallVec::new(),
        }
    }

    /// Builder inserting into `element` before `next_sibling` of an
    /// existing document.
    pub fn for_cursor(
        document: Document,
        element: NodeId,
        next_sibling: Option<NodeId>,
    ) -> Result<Self, SceneError> {
        validate_cursor(&document, element, next_sibling)?;
        Ok(Self {
            document,
            root: Cursor {
                element,
                next_sibling,
                kind: FrameKind::Root,
            },
            cursors: SmallVec::new(),
            blocks: SmallVec::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Number of blocks currently open.
    pub fn block_depth(&self) -> usize {
        self.blocks.len()
    }

    fn cursor(&self) -> Cursor {
        self.cursors.last().copied().unwrap_or(self.root)
    }

    fn insert(&mut self, node: NodeId) -> Result<NodeId, SceneError> {
        let cursor = self.cursor();
        self.document
            .insert_before(cursor.element, node, cursor.next_sibling)?;
        Ok(node)
    }

    fn pop_frame(&mut self, kind: FrameKind, error: SceneError) -> Result<(), SceneError> {
        match self.cursors.last() {
            Some(cursor) if cursor.kind == kind => {
                self.cursors.pop();
                Ok(())
            }
            _ => Err(error),
        }
    }
}

impl Default for DomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_cursor(
    document: &Document,
    element: NodeId,
    next_sibling: Option<NodeId>,
) -> Result<(), SceneError> {
    match document.kind(element) {
        None => return Err(SceneError::UnknownNode(element)),
        Some(NodeKind::Element | NodeKind::Fragment) => {}
        Some(_) => return Err(SceneError::NotAnElement(element)),
    }
    if let Some(next) = next_sibling {
        if document.parent(next) != Some(element) {
            return Err(SceneError::NotAChild {
                parent: element,
                child: next,
            });
        }
    }
    Ok(())
}

impl TreeBuilder for DomBuilder {
    type Node = NodeId;
    type Error = SceneError;

    fn open_element(&mut self, tag: &str) -> Result<NodeId, SceneError> {
        let element = self.document.create_element(tag);
        self.insert(element)?;
        self.cursors.push(Cursor {
            element,
            next_sibling: None,
            kind: FrameKind::Element,
        });
        Ok(element)
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), SceneError> {
        match self.cursors.last() {
            Some(cursor) if cursor.kind == FrameKind::Element => {
                let element = cursor.element;
                self.document.set_attribute(element, name, value)
            }
            _ => Err(SceneError::NoOpenElement),
        }
    }

    fn close_element(&mut self) -> Result<(), SceneError> {
        self.pop_frame(FrameKind::Element, SceneError::NoOpenElement)
    }

    fn open_block(&mut self) -> Result<(), SceneError> {
        let element = self.cursor().element;
        self.blocks.push(element);
        Ok(())
    }

    fn close_block(&mut self) -> Result<(), SceneError> {
        self.blocks.pop().map(drop).ok_or(SceneError::NoOpenBlock)
    }

    fn append_text(&mut self, text: &str) -> Result<NodeId, SceneError> {
        let node = self.document.create_text(text);
        self.insert(node)
    }

    fn append_comment(&mut self, text: &str) -> Result<NodeId, SceneError> {
        let node = self.document.create_comment(text);
        self.insert(node)
    }

    fn append_raw_markup(&mut self, html: &str) -> Result<Bounds<NodeId>, SceneError> {
        let node = self.document.create_raw_markup(html);
        self.insert(node)?;
        Ok(Bounds::new(self.cursor().element, node, node))
    }

    fn push_remote_element(
        &mut self,
        element: NodeId,
        cursor_id: &str,
        next_sibling: Option<NodeId>,
    ) -> Result<(), SceneError> {
        validate_cursor(&self.document, element, next_sibling)?;
        debug!("push remote element {:?} (cursor {})", element, cursor_id);
        self.cursors.push(Cursor {
            element,
            next_sibling,
            kind: FrameKind::Remote,
        });
        Ok(())
    }

    fn pop_remote_element(&mut self) -> Result<(), SceneError> {
        self.pop_frame(FrameKind::Remote, SceneError::NoRemoteElement)
    }

    fn current_element(&self) -> NodeId {
        self.cursor().element
    }

    fn preceding_node(&self) -> Option<NodeId> {
        let cursor = self.cursor();
        match cursor.next_sibling {
            None => self.document.last_child(cursor.element),
            Some(next) => self.document.previous_sibling(next),
        }
    }

    fn following_node(&self) -> Option<NodeId> {
        self.cursor().next_sibling
    }

    fn node_kind(&self, node: &NodeId) -> Option<NodeKind> {
        self.document.kind(*node)
    }

    fn insert_element_before(
        &mut self,
        parent: &NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
        next_sibling: Option<&NodeId>,
    ) -> Result<NodeId, SceneError> {
        let element = self.document.create_element(tag);
        for (name, value) in attributes {
            self.document.set_attribute(element, name, value)?;
        }
        self.document
            .insert_before(*parent, element, next_sibling.copied())?;
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_elements() {
        let mut builder = DomBuilder::new();

        let div = builder.open_element("div").unwrap();
        builder.set_attribute("class", "card").unwrap();
        builder.append_text("hello").unwrap();
        builder.close_element().unwrap();
        builder.append_comment("after").unwrap();

        assert_eq!(builder.current_element(), builder.document().root());
        assert_eq!(builder.document().attribute(div, "class"), Some("card"));
        assert_eq!(
            builder.document().inner_html(Document::ROOT),
            "<div class=\"card\">hello</div><!--after-->"
        );
    }

    #[test]
    fn preceding_node_tracks_cursor() {
        let mut builder = DomBuilder::new();
        assert_eq!(builder.preceding_node(), None);

        let text = builder.append_text("a").unwrap();
        assert_eq!(builder.preceding_node(), Some(text));
        assert_eq!(builder.node_kind(&text), Some(NodeKind::Text));

        builder.open_element("p").unwrap();
        assert_eq!(builder.preceding_node(), None);
        assert_eq!(builder.following_node(), None);
    }

    #[test]
    fn remote_element_inserts_before_sibling() {
        let mut builder = DomBuilder::new();
        let target = builder.open_element("section").unwrap();
        let existing = builder.append_text("existing").unwrap();
        builder.close_element().unwrap();

        builder
            .push_remote_element(target, "cursor-1", Some(existing))
            .unwrap();
        assert_eq!(builder.preceding_node(), None);
        assert_eq!(builder.following_node(), Some(existing));
        builder.append_text("moved in").unwrap();
        builder.pop_remote_element().unwrap();

        assert_eq!(
            builder.document().to_html(target),
            "<section>moved inexisting</section>"
        );
    }

    #[test]
    fn unbalanced_calls_fail() {
        let mut builder = DomBuilder::new();

        assert_eq!(builder.close_element(), Err(SceneError::NoOpenElement));
        assert_eq!(builder.close_block(), Err(SceneError::NoOpenBlock));
        assert_eq!(builder.pop_remote_element(), Err(SceneError::NoRemoteElement));
        assert_eq!(builder.set_attribute("id", "x"), Err(SceneError::NoOpenElement));

        let target = builder.open_element("div").unwrap();
        builder.close_element().unwrap();
        builder.push_remote_element(target, "c", None).unwrap();
        // A remote frame is not closed by close_element
        assert_eq!(builder.close_element(), Err(SceneError::NoOpenElement));
    }

    #[test]
    fn blocks_nest() {
        let mut builder = DomBuilder::new();
        builder.open_block().unwrap();
        builder.open_block().unwrap();
        assert_eq!(builder.block_depth(), 2);
        builder.close_block().unwrap();
        builder.close_block().unwrap();
        assert_eq!(builder.block_depth(), 0);
    }

    #[test]
    fn for_cursor_validates_position() {
        let mut document = Document::new();
        let text = document.create_text("x");
        document.append_child(Document::ROOT, text).unwrap();

        assert!(DomBuilder::for_cursor(document.clone(), Document::ROOT, Some(text)).is_ok());
        assert_eq!(
            DomBuilder::for_cursor(document, text, None).err(),
            Some(SceneError::NotAnElement(text))
        );
    }
}
