use std::collections::HashMap;

use heapscope_types::{AttrValue, Attrs, DiffMark, Graph, Link, Node, NodeDescriptor, NodeId};
use tracing::trace;

use crate::{ExtractError, FieldKind, Inspector, TypeFilter};

// ── Options ─────────────────────────────────────────────────────

/// What a null pointer turns into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullPolicy {
    /// No node and no link.
    #[default]
    Elide,
    /// A fresh `NULLPTR{n}` node per occurrence, with one incoming link.
    Sentinel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub allowed_types: TypeFilter,
    pub null_policy: NullPolicy,
}

impl BuildOptions {
    pub fn restricted_to(type_name: &str) -> Self {
        Self {
            allowed_types: TypeFilter::only([type_name]),
            ..Self::default()
        }
    }

    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }
}

// ── Builder ─────────────────────────────────────────────────────

/// A pointer waiting to be visited, plus the link that leads to it.
struct Visit<V> {
    value: V,
    parent: Option<(NodeId, String)>,
}

/// Accumulates one [`Graph`] across any number of root extensions.
///
/// Node identity is keyed by address for the builder's whole lifetime, so
/// extending from several roots that share structure never duplicates a
/// node or a link.
pub struct GraphBuilder<'a, I: Inspector> {
    inspector: &'a I,
    options: BuildOptions,
    graph: Graph,
    addr_to_id: HashMap<u64, NodeId>,
    /// Position of each node in `graph.nodes`.
    node_index: HashMap<NodeId, usize>,
    name_owner: HashMap<String, NodeId>,
    null_count: u64,
}

impl<'a, I: Inspector> GraphBuilder<'a, I> {
    pub fn new(inspector: &'a I, options: BuildOptions) -> Self {
        Self {
            inspector,
            options,
            graph: Graph::new(),
            addr_to_id: HashMap::new(),
            node_index: HashMap::new(),
            name_owner: HashMap::new(),
            null_count: 0,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn finish(self) -> Graph {
        self.graph
    }

    /// Extends from a root pointer and attaches `names` to the node it
    /// resolves to. Returns `None` when the root is an elided null.
    ///
    /// If any of `names` already labels a different node, no name is
    /// attached and an `InvariantViolation` is returned. Records reached by
    /// the walk stay in the graph and the builder remains usable.
    pub fn extend_from_value<S: AsRef<str>>(
        &mut self,
        value: &I::Value,
        names: &[S],
    ) -> Result<Option<NodeId>, ExtractError> {
        let Some(id) = self.extend(value, None)? else {
            return Ok(None);
        };

        for name in names {
            let name = name.as_ref();
            if let Some(owner) = self.name_owner.get(name)
                && owner != &id
            {
                return Err(ExtractError::invariant(format!(
                    "name `{name}` already labels {owner}, cannot also label {id}"
                )));
            }
        }

        let index = self.node_index[&id];
        for name in names {
            let name = name.as_ref();
            self.name_owner.insert(name.to_string(), id.clone());
            self.graph.nodes[index]
                .names
                .insert(name.to_string(), DiffMark::Same);
        }

        Ok(Some(id))
    }

    /// Depth-first walk from `value`, adding every newly reached record.
    ///
    /// `parent` is the pending `(source, accessor)` link into `value`.
    /// Children are visited in field order and a node's incoming link is
    /// appended before any of its children are reached.
    pub fn extend(
        &mut self,
        value: &I::Value,
        parent: Option<(NodeId, String)>,
    ) -> Result<Option<NodeId>, ExtractError> {
        let mut root = None;
        let mut stack = vec![Visit {
            value: value.clone(),
            parent,
        }];
        let mut first = true;

        while let Some(visit) = stack.pop() {
            let id = self.visit(visit, &mut stack)?;
            if first {
                root = id;
                first = false;
            }
        }

        Ok(root)
    }

    fn visit(
        &mut self,
        Visit { value, parent }: Visit<I::Value>,
        stack: &mut Vec<Visit<I::Value>>,
    ) -> Result<Option<NodeId>, ExtractError> {
        let inspector = self.inspector;
        if !inspector.is_valid(&value) {
            return Err(ExtractError::invariant("handle is not valid"));
        }
        let Some(pointee) = inspector.pointee_record(&value) else {
            return Err(ExtractError::invariant(
                "handle is not a pointer to a record type",
            ));
        };
        if !self.options.allowed_types.allows(&pointee) {
            return Err(ExtractError::invariant(format!(
                "record type `{pointee}` is not in the allowed set"
            )));
        }

        let addr = inspector.address(&value);
        if addr == 0 {
            return Ok(match self.options.null_policy {
                NullPolicy::Elide => None,
                NullPolicy::Sentinel => {
                    let id = NodeId::for_null(self.null_count);
                    self.null_count += 1;
                    self.push_node(Node::new(id.clone(), NodeDescriptor::null(pointee)));
                    self.link_parent(parent, &id);
                    Some(id)
                }
            });
        }

        if let Some(id) = self.addr_to_id.get(&addr).cloned() {
            self.link_parent(parent, &id);
            return Ok(Some(id));
        }

        let id = NodeId::for_address(addr);
        self.addr_to_id.insert(addr, id.clone());

        let fields = inspector.fields(&value);
        let attrs: Attrs = fields
            .iter()
            .filter(|field| field.kind == FieldKind::Int)
            .filter_map(|field| {
                inspector
                    .int_value(&field.value)
                    .map(|value| (field.name.clone(), AttrValue::Int(value)))
            })
            .collect();

        trace!(%id, %pointee, attrs = attrs.len(), "new node");
        self.push_node(Node::new(id.clone(), NodeDescriptor::addr(pointee, attrs)));
        self.link_parent(parent, &id);

        // Reverse so the first field is popped first.
        for field in fields.into_iter().rev() {
            let FieldKind::RecordPointer { pointee } = &field.kind else {
                continue;
            };
            if !self.options.allowed_types.allows(pointee) {
                continue;
            }
            stack.push(Visit {
                value: field.value,
                parent: Some((id.clone(), field.name)),
            });
        }

        Ok(Some(id))
    }

    fn push_node(&mut self, node: Node) {
        self.node_index.insert(node.id.clone(), self.graph.nodes.len());
        self.graph.nodes.push(node);
    }

    fn link_parent(&mut self, parent: Option<(NodeId, String)>, target: &NodeId) {
        if let Some((source, accessor)) = parent {
            self.graph
                .links
                .push(Link::new(source, target.clone(), accessor));
        }
    }
}
