use std::collections::{BTreeMap, HashMap};

use heapscope_types::{
    DiffMark, Graph, LayoutGraph, LayoutGroup, LayoutIndex, LayoutLink, LayoutNode, LayoutTag,
    Node, NodeTag,
};

/// Text shown inside a value box: one `name: value` line per attribute,
/// preceded by the diff marker when the node exists on one side only.
/// Nulls render as `null`; records without scalar fields show their type.
pub fn render_label(node: &Node) -> String {
    if node.desc.tag == NodeTag::Null {
        return "null".to_string();
    }

    let mut lines: Vec<String> = Vec::with_capacity(node.desc.attrs.len() + 1);
    if let Some(prefix) = node.desc.mark.prefix() {
        lines.push(prefix.to_string());
    }
    if node.desc.attrs.is_empty() {
        lines.push(node.desc.type_name.clone());
    }
    lines.extend(
        node.desc
            .attrs
            .iter()
            .map(|(name, value)| format!("{name}: {value}")),
    );
    lines.join("\n")
}

fn name_node_id(name: &str) -> String {
    format!("NAME{name}")
}

/// Projects a graph for rendering.
///
/// Every graph node becomes a `value` node. Every distinct name becomes one
/// `name` node with an edge to each value node carrying it. Name nodes whose
/// outgoing edges are identical are grouped so the layout engine moves them
/// together.
pub fn to_layout(graph: &Graph) -> LayoutGraph {
    let mut layout = LayoutGraph::default();
    let mut value_index: HashMap<&str, LayoutIndex> = HashMap::new();

    for node in &graph.nodes {
        value_index.insert(node.id.as_str(), layout.nodes.len());
        layout.nodes.push(LayoutNode {
            id: node.id.to_string(),
            label: render_label(node),
            tag: LayoutTag::Value,
            diff: node.desc.mark,
        });
    }

    // Name nodes come after all value nodes, in first-appearance order.
    let mut name_index: HashMap<&str, LayoutIndex> = HashMap::new();
    let mut name_order: Vec<LayoutIndex> = Vec::new();
    for node in &graph.nodes {
        let target = value_index[node.id.as_str()];
        for (name, mark) in &node.names {
            let source = *name_index.entry(name.as_str()).or_insert_with(|| {
                let index = layout.nodes.len();
                layout.nodes.push(LayoutNode {
                    id: name_node_id(name),
                    label: name.clone(),
                    tag: LayoutTag::Name,
                    diff: DiffMark::Same,
                });
                name_order.push(index);
                index
            });
            layout.links.push(LayoutLink {
                source,
                target,
                label: mark.prefix().unwrap_or_default().to_string(),
                tag: LayoutTag::Name,
                diff: *mark,
            });
        }
    }

    // A name node is only "old"/"new" when every edge it owns agrees.
    for &index in &name_order {
        let mut marks = layout
            .links
            .iter()
            .filter(|link| link.source == index)
            .map(|link| link.diff);
        if let Some(first) = marks.next()
            && marks.all(|mark| mark == first)
        {
            layout.nodes[index].diff = first;
        }
    }

    for link in &graph.links {
        let (Some(&source), Some(&target)) = (
            value_index.get(link.source.as_str()),
            value_index.get(link.target.as_str()),
        ) else {
            continue;
        };
        layout.links.push(LayoutLink {
            source,
            target,
            label: link.desc.accessor.clone(),
            tag: LayoutTag::Value,
            diff: link.desc.mark,
        });
    }

    layout.groups = group_names(&layout, &name_order);
    layout
}

fn group_names(layout: &LayoutGraph, name_order: &[LayoutIndex]) -> Vec<LayoutGroup> {
    let mut groups: Vec<LayoutGroup> = Vec::new();
    for &index in name_order {
        let mut signature: BTreeMap<String, Vec<LayoutIndex>> = BTreeMap::new();
        for link in layout.links_tagged(LayoutTag::Name) {
            if link.source == index {
                signature
                    .entry(link.label.clone())
                    .or_default()
                    .push(link.target);
            }
        }
        for targets in signature.values_mut() {
            targets.sort_unstable();
        }

        match groups.iter_mut().find(|group| group.links == signature) {
            Some(group) => group.leaves.push(index),
            None => groups.push(LayoutGroup {
                leaves: vec![index],
                links: signature,
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use heapscope_types::{AttrValue, Attrs, Link, NodeDescriptor, NodeId};

    use super::*;
    use crate::diff;
    use crate::synthetic::{LIST_NODE, SyntheticHeap};
    use crate::{BuildOptions, GraphBuilder, NullPolicy};

    fn record(addr: u64, attrs: Attrs) -> Node {
        Node::new(NodeId::for_address(addr), NodeDescriptor::addr("T", attrs))
    }

    #[test]
    fn labels_list_attributes_in_order() {
        let node = record(
            1,
            [("val", AttrValue::Int(3)), ("key", AttrValue::Int(9))]
                .into_iter()
                .collect(),
        );
        assert_eq!(render_label(&node), "val: 3\nkey: 9");

        let mut old = node.clone();
        old.desc.mark = DiffMark::Old;
        assert_eq!(render_label(&old), "<old>\nval: 3\nkey: 9");

        let null = Node::new(NodeId::for_null(0), NodeDescriptor::null("T"));
        assert_eq!(render_label(&null), "null");

        assert_eq!(render_label(&record(2, Attrs::new())), "T");
    }

    #[test]
    fn projects_values_names_and_links() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2]);
        let mut builder = GraphBuilder::new(&heap, BuildOptions::default());
        builder
            .extend_from_value(&heap.pointer(LIST_NODE, addrs[0]), &["head"])
            .unwrap();
        let layout = to_layout(&builder.finish());

        assert_eq!(layout.nodes_tagged(LayoutTag::Value).count(), 2);
        assert_eq!(layout.nodes_tagged(LayoutTag::Name).count(), 1);
        let head = layout.index_of("NAMEhead").expect("name node exists");
        let first = layout
            .index_of(NodeId::for_address(addrs[0]).as_str())
            .expect("value node exists");
        let second = layout
            .index_of(NodeId::for_address(addrs[1]).as_str())
            .unwrap();

        let name_links: Vec<(usize, usize)> = layout
            .links_tagged(LayoutTag::Name)
            .map(|link| (link.source, link.target))
            .collect();
        assert_eq!(name_links, [(head, first)]);
        let value_links: Vec<(usize, usize, &str)> = layout
            .links_tagged(LayoutTag::Value)
            .map(|link| (link.source, link.target, link.label.as_str()))
            .collect();
        assert_eq!(value_links, [(first, second, "next")]);
    }

    #[test]
    fn synonyms_share_a_group() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2]);
        let mut builder = GraphBuilder::new(&heap, BuildOptions::default());
        let head = heap.pointer(LIST_NODE, addrs[0]);
        builder.extend_from_value(&head, &["head", "cur"]).unwrap();
        builder
            .extend_from_value(&heap.pointer(LIST_NODE, addrs[1]), &["tail"])
            .unwrap();
        let layout = to_layout(&builder.finish());

        assert_eq!(layout.groups.len(), 2);
        let leaves: Vec<Vec<&str>> = layout
            .groups
            .iter()
            .map(|group| {
                group
                    .leaves
                    .iter()
                    .map(|&i| layout.nodes[i].label.as_str())
                    .collect()
            })
            .collect();
        assert_eq!(leaves, [vec!["cur", "head"], vec!["tail"]]);

        let first = layout
            .index_of(NodeId::for_address(addrs[0]).as_str())
            .unwrap();
        assert_eq!(layout.groups[0].links.get(""), Some(&vec![first]));
    }

    #[test]
    fn moved_name_keeps_one_name_node() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2]);
        let snapshot = |name_target: u64| {
            let mut builder = GraphBuilder::new(&heap, BuildOptions::default());
            builder
                .extend_from_value(&heap.pointer(LIST_NODE, addrs[0]), &["head"])
                .unwrap();
            builder
                .extend_from_value(&heap.pointer(LIST_NODE, name_target), &["p"])
                .unwrap();
            builder.finish()
        };
        let delta = diff(&snapshot(addrs[0]), &snapshot(addrs[1]));
        let layout = to_layout(&delta);

        let p = layout.index_of("NAMEp").expect("one name node for p");
        let labels: Vec<&str> = layout
            .links_tagged(LayoutTag::Name)
            .filter(|link| link.source == p)
            .map(|link| link.label.as_str())
            .collect();
        assert_eq!(labels, ["<old>", "<new>"]);
        assert_eq!(layout.nodes[p].diff, DiffMark::Same);
    }

    #[test]
    fn null_sentinels_render_as_null_boxes() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[5]);
        let options = BuildOptions::default().with_null_policy(NullPolicy::Sentinel);
        let mut builder = GraphBuilder::new(&heap, options);
        builder
            .extend_from_value(&heap.pointer(LIST_NODE, addrs[0]), &["only"])
            .unwrap();
        let layout = to_layout(&builder.finish());

        let null = layout.index_of("NULLPTR0").expect("sentinel is projected");
        assert_eq!(layout.nodes[null].label, "null");
        assert_eq!(layout.links_tagged(LayoutTag::Value).count(), 1);
    }

    #[test]
    fn links_to_missing_nodes_are_skipped() {
        let mut graph = Graph::new();
        graph.nodes.push(record(1, Attrs::new()));
        graph.links.push(Link::new(
            NodeId::for_address(1),
            NodeId::for_address(2),
            "next",
        ));
        let layout = to_layout(&graph);
        assert!(layout.links.is_empty());
    }
}
