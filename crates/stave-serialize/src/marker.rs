//! Marker comment payloads.
//!
//! These strings are the wire format a rehydrating reader parses back into
//! block structure, so their spelling must not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `+block:<depth>`, depth before the block opens
    OpenBlock(u32),
    /// `-block:<depth>`, depth after the block closes
    CloseBlock(u32),
    /// `glimmer`, around raw markup
    RawBoundary,
    /// `empty`, stands in for a zero-length text node
    EmptyText,
    /// `sep`, between adjacent text nodes
    TextSeparator,
}

impl Marker {
    /// Depth label of a block marker.
    pub fn depth(&self) -> Option<u32> {
        match self {
            Marker::OpenBlock(depth) | Marker::CloseBlock(depth) => Some(*depth),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::OpenBlock(depth) => write!(f, "+block:{depth}"),
            Marker::CloseBlock(depth) => write!(f, "-block:{depth}"),
            Marker::RawBoundary => f.write_str("glimmer"),
            Marker::EmptyText => f.write_str("empty"),
            Marker::TextSeparator => f.write_str("sep"),
        }
    }
}

/// Returned when a comment is not a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("comment is not a hydration marker")]
pub struct NotAMarker;

/// Strict parse: exact payloads only, decimal depths without leading zeros.
impl FromStr for Marker {
    type Err = NotAMarker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glimmer" => return Ok(Marker::RawBoundary),
            "empty" => return Ok(Marker::EmptyText),
            "sep" => return Ok(Marker::TextSeparator),
            _ => {}
        }

        let (open, digits) = if let Some(rest) = s.strip_prefix("+block:") {
            (true, rest)
        } else if let Some(rest) = s.strip_prefix("-block:") {
            (false, rest)
        } else {
            return Err(NotAMarker);
        };

        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return Err(NotAMarker);
        }
        let depth: u32 = digits.parse().map_err(|_| NotAMarker)?;
        Ok(if open {
            Marker::OpenBlock(depth)
        } else {
            Marker::CloseBlock(depth)
        })
    }
}

/// Shape of the anchor element written for remote insertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub anchor_tag: String,
    pub anchor_attribute: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            anchor_tag: "script".to_string(),
            anchor_attribute: "id".to_string(),
        }
    }
}
