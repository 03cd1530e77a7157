//! Replay a render script through the marker encoder

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use stave_scene::{Document, DomBuilder, NodeId};
use stave_serialize::{MarkerConfig, SerializeBuilder};

/// One tree builder call. Scripts are JSON arrays of these, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum RenderOp {
    OpenElement { tag: String },
    Attr { name: String, value: String },
    CloseElement,
    OpenBlock,
    CloseBlock,
    Text { text: String },
    Comment { text: String },
    Html { html: String },
    /// `target` counts elements in the order they were opened, from 0
    PushRemote { target: usize, cursor_id: String },
    PopRemote,
}

pub fn load_script(path: &Path) -> Result<Vec<RenderOp>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid render script: {}", path.display()))
}

fn apply(
    builder: &mut SerializeBuilder<DomBuilder>,
    elements: &mut Vec<NodeId>,
    op: &RenderOp,
) -> Result<()> {
    match op {
        RenderOp::OpenElement { tag } => elements.push(builder.open_element(tag)?),
        RenderOp::Attr { name, value } => builder.set_attribute(name, value)?,
        RenderOp::CloseElement => builder.close_element()?,
        RenderOp::OpenBlock => builder.open_block()?,
        RenderOp::CloseBlock => builder.close_block()?,
        RenderOp::Text { text } => {
            builder.append_text(text)?;
        }
        RenderOp::Comment { text } => {
            builder.append_comment(text)?;
        }
        RenderOp::Html { html } => {
            builder.append_raw_markup(html)?;
        }
        RenderOp::PushRemote { target, cursor_id } => {
            let Some(&element) = elements.get(*target) else {
                bail!("Remote target {target} has not been opened");
            };
            builder.push_remote_element(element, cursor_id, None)?;
        }
        RenderOp::PopRemote => builder.pop_remote_element()?,
    }
    Ok(())
}

/// Run `ops` and return the document's HTML.
pub fn render_ops(ops: &[RenderOp], config: &MarkerConfig, normalize: bool) -> Result<String> {
    let mut builder = SerializeBuilder::with_config(DomBuilder::new(), config.clone());
    let mut elements = Vec::new();

    for (position, op) in ops.iter().enumerate() {
        apply(&mut builder, &mut elements, op)
            .with_context(|| format!("Op {position} ({op:?}) failed"))?;
    }
    if builder.depth() != 0 {
        log::warn!("Script ended with {} open blocks", builder.depth());
    }

    let mut document = builder.into_inner().into_document();
    if normalize {
        document.normalize(Document::ROOT);
    }
    Ok(document.inner_html(Document::ROOT))
}
