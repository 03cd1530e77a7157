//! Marker-emitting decorator over a [`TreeBuilder`].
//!
//! Output stays directly displayable while carrying enough comment markers
//! for a later pass to recover block boundaries, raw markup regions and
//! text node splits from the serialized form alone.

use crate::marker::{Marker, MarkerConfig};
use log::{debug, trace, warn};
use stave_scene::{Bounds, NodeKind, TreeBuilder};

/// Result of appending text through a [`SerializeBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextHandle<N> {
    /// A real text node.
    Real(N),
    /// The `empty` marker written instead of a zero-length text node.
    Placeholder(N),
}

impl<N> TextHandle<N> {
    pub fn node(&self) -> &N {
        match self {
            TextHandle::Real(node) | TextHandle::Placeholder(node) => node,
        }
    }

    pub fn into_node(self) -> N {
        match self {
            TextHandle::Real(node) | TextHandle::Placeholder(node) => node,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TextHandle::Placeholder(_))
    }
}

pub struct SerializeBuilder<B> {
    inner: B,
    depth: u32,
    config: MarkerConfig,
}

impl<B: TreeBuilder> SerializeBuilder<B> {
    /// Wrap `inner` for a first render, with the default anchor shape.
    pub fn for_initial_render(inner: B) -> Self {
        Self::with_config(inner, MarkerConfig::default())
    }

    pub fn with_config(inner: B, config: MarkerConfig) -> Self {
        Self {
            inner,
            depth: 0,
            config,
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Current block nesting depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    fn emit(&mut self, marker: Marker) -> Result<B::Node, B::Error> {
        trace!("marker {marker}");
        self.inner.append_comment(&marker.to_string())
    }

    fn is_text(&self, node: Option<B::Node>) -> bool {
        node.is_some_and(|node| self.inner.node_kind(&node) == Some(NodeKind::Text))
    }

    pub fn open_element(&mut self, tag: &str) -> Result<B::Node, B::Error> {
        self.inner.open_element(tag)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), B::Error> {
        self.inner.set_attribute(name, value)
    }

    pub fn close_element(&mut self) -> Result<(), B::Error> {
        self.inner.close_element()
    }

    /// Emit `+block:<depth>` and open the block.
    ///
    /// If the inner builder refuses the block, the depth is restored but
    /// the marker already written stays in the output.
    pub fn open_block(&mut self) -> Result<(), B::Error> {
        self.emit(Marker::OpenBlock(self.depth))?;
        self.depth += 1;
        if let Err(error) = self.inner.open_block() {
            self.depth -= 1;
            return Err(error);
        }
        Ok(())
    }

    pub fn close_block(&mut self) -> Result<(), B::Error> {
        self.inner.close_block()?;
        self.depth = match self.depth.checked_sub(1) {
            Some(depth) => depth,
            None => {
                warn!("close_block without a matching open_block");
                0
            }
        };
        self.emit(Marker::CloseBlock(self.depth)).map(drop)
    }

    /// Append `html` between two `glimmer` markers. The returned bounds
    /// span the markers, so the region is addressable without rescanning.
    pub fn append_raw_markup(&mut self, html: &str) -> Result<Bounds<B::Node>, B::Error> {
        let first = self.emit(Marker::RawBoundary)?;
        let inserted = self.inner.append_raw_markup(html)?;
        let last = self.emit(Marker::RawBoundary)?;
        Ok(Bounds::new(inserted.parent().clone(), first, last))
    }

    /// Append text, writing `empty` for zero-length text and `sep` on
    /// either side where the new text touches another text node.
    ///
    /// Text only follows the cursor when it inserts before an existing
    /// sibling, as with remote elements.
    pub fn append_text(&mut self, text: &str) -> Result<TextHandle<B::Node>, B::Error> {
        if text.is_empty() {
            return self.emit(Marker::EmptyText).map(TextHandle::Placeholder);
        }
        if self.is_text(self.inner.preceding_node()) {
            self.emit(Marker::TextSeparator)?;
        }
        let node = self.inner.append_text(text)?;
        if self.is_text(self.inner.following_node()) {
            self.emit(Marker::TextSeparator)?;
        }
        Ok(TextHandle::Real(node))
    }

    /// Append a caller comment. Text that would read back as a marker is
    /// written with a leading space, so only the encoder emits markers.
    pub fn append_comment(&mut self, text: &str) -> Result<B::Node, B::Error> {
        if text.parse::<Marker>().is_ok() {
            debug!("comment {text:?} collides with a marker, padding it");
            return self.inner.append_comment(&format!(" {text}"));
        }
        self.inner.append_comment(text)
    }

    /// Insert an anchor element carrying `cursor_id` at the remote
    /// position, then move the cursor there.
    pub fn push_remote_element(
        &mut self,
        element: B::Node,
        cursor_id: &str,
        next_sibling: Option<B::Node>,
    ) -> Result<(), B::Error> {
        let attributes = [(self.config.anchor_attribute.as_str(), cursor_id)];
        self.inner.insert_element_before(
            &element,
            &self.config.anchor_tag,
            &attributes,
            next_sibling.as_ref(),
        )?;
        self.inner
            .push_remote_element(element, cursor_id, next_sibling)
    }

    pub fn pop_remote_element(&mut self) -> Result<(), B::Error> {
        self.inner.pop_remote_element()
    }
}
