use std::collections::BTreeMap;
use std::fmt;

use facet::Facet;

////////////////////////////////////////////////////////////////////////////////////
// Identity
////////////////////////////////////////////////////////////////////////////////////

/// Identifier of a node within one [`Graph`].
///
/// Address identifiers (`ADDR{addr}`) are derived from a live address, so the
/// same record keeps its identifier across snapshots and the differ can match
/// it. Null identifiers (`NULLPTR{n}`) are minted per occurrence.
#[derive(Facet, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[facet(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn for_address(addr: u64) -> Self {
        Self(format!("ADDR{addr}"))
    }

    pub fn for_null(occurrence: u64) -> Self {
        Self(format!("NULLPTR{occurrence}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////
// Descriptors
////////////////////////////////////////////////////////////////////////////////////

/// What a node stands for.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum NodeTag {
    /// A record at a live, non-zero address.
    Addr,
    /// A null pointer occurrence (only produced under the sentinel null policy).
    Null,
}

/// Which side of a diff an element belongs to.
///
/// Plain extraction only ever produces `Same`.
#[derive(Facet, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum DiffMark {
    #[default]
    Same,
    Old,
    New,
}

impl DiffMark {
    /// Textual marker prepended to labels, e.g. `<old> next`.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Same => None,
            Self::Old => Some("<old>"),
            Self::New => Some("<new>"),
        }
    }

    /// Prefixes `text` with this mark's marker, if any.
    pub fn apply(self, text: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix} {text}"),
            None => text.to_string(),
        }
    }
}

/// A scalar attribute value read at extraction time.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum AttrValue {
    /// An integer field readout.
    Int(i64),
    /// Rendered text. Extraction never produces this; the differ does
    /// (`"1 -> 2"`).
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
}

/// Ordered attribute mapping. Iteration follows insertion order, which for
/// extracted nodes is the record's field declaration order.
#[derive(Facet, Debug, Clone, Default, PartialEq, Eq)]
#[facet(transparent)]
pub struct Attrs(Vec<Attr>);

impl Attrs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name` to `value`, keeping the original position if the
    /// attribute already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        match self.0.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.0.push(Attr { name, value }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|attr| (attr.name.as_str(), &attr.value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, AttrValue)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (N, AttrValue)>>(iter: T) -> Self {
        let mut attrs = Attrs::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

/// Snapshot of a record's type and scalar fields.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Record type name of the pointee.
    #[facet(rename = "type")]
    pub type_name: String,

    /// Scalar field values, read when the node was extracted.
    pub attrs: Attrs,

    pub tag: NodeTag,

    pub mark: DiffMark,
}

impl NodeDescriptor {
    pub fn addr(type_name: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
            tag: NodeTag::Addr,
            mark: DiffMark::Same,
        }
    }

    pub fn null(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attrs: Attrs::new(),
            tag: NodeTag::Null,
            mark: DiffMark::Same,
        }
    }
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Field name through which the source reaches the target.
    pub accessor: String,

    pub mark: DiffMark,
}

impl LinkDescriptor {
    pub fn new(accessor: impl Into<String>) -> Self {
        Self {
            accessor: accessor.into(),
            mark: DiffMark::Same,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////
// Nodes, links, graphs
////////////////////////////////////////////////////////////////////////////////////

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,

    /// Root labels (variable names, expression text) pointing at this node.
    /// Extraction marks every name `Same`; the differ records which side a
    /// name came from.
    pub names: BTreeMap<String, DiffMark>,

    pub desc: NodeDescriptor,
}

impl Node {
    pub fn new(id: NodeId, desc: NodeDescriptor) -> Self {
        Self {
            id,
            names: BTreeMap::new(),
            desc,
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub desc: LinkDescriptor,
}

impl Link {
    pub fn new(source: NodeId, target: NodeId, accessor: impl Into<String>) -> Self {
        Self {
            source,
            target,
            desc: LinkDescriptor::new(accessor),
        }
    }
}

/// A node/link snapshot. Nodes are kept in discovery order.
///
/// Every link's endpoints name nodes of the same graph. The lookup helpers
/// scan; the builder and differ keep their own id-to-position maps.
#[derive(Facet, Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// The node a root label points at, if any.
    pub fn named(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.has_name(name))
    }

    /// Links from `source`, in insertion order.
    pub fn links_from<'a>(&'a self, source: &'a NodeId) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| &link.source == source)
    }

    /// Links whose endpoints are missing from the graph. Empty for any graph
    /// produced by the builder or the differ.
    pub fn dangling_links(&self) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|link| !self.contains(&link.source) || !self.contains(&link.target))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
