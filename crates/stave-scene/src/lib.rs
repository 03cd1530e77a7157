//! Tree construction for Stave rendering.
//!
//! Renderers write through the [`TreeBuilder`] capability. [`DomBuilder`]
//! implements it over an arena [`Document`] that can be serialized back
//! to HTML.

pub mod document;
pub mod dom_builder;
pub mod error;
pub mod html;
pub mod tree_builder;

pub use document::{Document, NodeData, NodeId, NodeKind};
pub use dom_builder::DomBuilder;
pub use error::SceneError;
pub use tree_builder::{Bounds, TreeBuilder};
