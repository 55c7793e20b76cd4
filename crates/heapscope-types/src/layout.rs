use std::collections::BTreeMap;

use facet::Facet;

use crate::DiffMark;

/// Position of a node in [`LayoutGraph::nodes`].
pub type LayoutIndex = usize;

#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum LayoutTag {
    /// A record (or null) box.
    Value,
    /// A root label box pointing at a value.
    Name,
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    pub tag: LayoutTag,
    pub diff: DiffMark,
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct LayoutLink {
    pub source: LayoutIndex,
    pub target: LayoutIndex,
    pub label: String,
    pub tag: LayoutTag,
    pub diff: DiffMark,
}

/// Name nodes sharing an identical set of outgoing name links, to be laid
/// out as one rigid unit.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct LayoutGroup {
    pub leaves: Vec<LayoutIndex>,
    /// Edge label -> targets shared by every leaf.
    pub links: BTreeMap<String, Vec<LayoutIndex>>,
}

/// Render-oriented projection of a `Graph`. Always recomputed from a graph,
/// never edited on its own.
#[derive(Facet, Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub links: Vec<LayoutLink>,
    pub groups: Vec<LayoutGroup>,
}

impl LayoutGraph {
    pub fn nodes_tagged(&self, tag: LayoutTag) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.iter().filter(move |node| node.tag == tag)
    }

    pub fn links_tagged(&self, tag: LayoutTag) -> impl Iterator<Item = &LayoutLink> {
        self.links.iter().filter(move |link| link.tag == tag)
    }

    pub fn index_of(&self, id: &str) -> Option<LayoutIndex> {
        self.nodes.iter().position(|node| node.id == id)
    }
}
