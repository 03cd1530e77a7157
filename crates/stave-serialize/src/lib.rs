//! Hydration markers for server-rendered output.
//!
//! [`SerializeBuilder`] wraps any [`stave_scene::TreeBuilder`] and writes
//! [`Marker`] comments alongside the delegated calls.

pub mod builder;
pub mod marker;

pub use builder::{SerializeBuilder, TextHandle};
pub use marker::{Marker, MarkerConfig, NotAMarker};
