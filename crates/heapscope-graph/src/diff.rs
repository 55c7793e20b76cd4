//! Snapshot comparison.
//!
//! The delta of two graphs is itself a [`Graph`]: every node of either side
//! appears once, links that did not change are left out, and everything that
//! only exists on one side carries an `old`/`new` [`DiffMark`] plus the
//! matching textual prefix.

use std::collections::HashMap;

use heapscope_types::{
    AttrValue, Attrs, DiffMark, Graph, Link, LinkDescriptor, Node, NodeDescriptor, NodeId,
};

/// Compares two snapshots. Pure and deterministic: nodes come out in `old`
/// discovery order followed by nodes only `new` has, links likewise.
pub fn diff(old: &Graph, new: &Graph) -> Graph {
    let mut out = Graph::new();
    out.nodes = diff_nodes(old, new);
    out.links = diff_links(old, new);
    reconcile_names(old, new, &mut out);
    out
}

// ── Nodes ───────────────────────────────────────────────────────

fn diff_nodes(old: &Graph, new: &Graph) -> Vec<Node> {
    let new_by_id: HashMap<&NodeId, &Node> = new.nodes.iter().map(|n| (&n.id, n)).collect();
    let old_by_id: HashMap<&NodeId, &Node> = old.nodes.iter().map(|n| (&n.id, n)).collect();

    let mut nodes = Vec::with_capacity(old.nodes.len().max(new.nodes.len()));
    for before in &old.nodes {
        let desc = match new_by_id.get(&before.id) {
            Some(after) => merge_descriptors(&before.desc, &after.desc),
            None => marked(&before.desc, DiffMark::Old),
        };
        nodes.push(Node::new(before.id.clone(), desc));
    }
    for after in &new.nodes {
        if !old_by_id.contains_key(&after.id) {
            nodes.push(Node::new(after.id.clone(), marked(&after.desc, DiffMark::New)));
        }
    }
    nodes
}

fn marked(desc: &NodeDescriptor, mark: DiffMark) -> NodeDescriptor {
    NodeDescriptor {
        mark,
        ..desc.clone()
    }
}

fn merge_descriptors(before: &NodeDescriptor, after: &NodeDescriptor) -> NodeDescriptor {
    let mut attrs = Attrs::new();
    for (name, value) in before.attrs.iter() {
        match after.attrs.get(name) {
            Some(current) if current == value => attrs.insert(name, value.clone()),
            Some(current) => attrs.insert(name, AttrValue::Text(format!("{value} -> {current}"))),
            None => attrs.insert(DiffMark::Old.apply(name), value.clone()),
        }
    }
    for (name, value) in after.attrs.iter() {
        if !before.attrs.contains(name) {
            attrs.insert(DiffMark::New.apply(name), value.clone());
        }
    }

    NodeDescriptor {
        type_name: after.type_name.clone(),
        attrs,
        tag: after.tag,
        mark: DiffMark::Same,
    }
}

// ── Links ───────────────────────────────────────────────────────

type Pair = (NodeId, NodeId);

/// Links grouped by `(source, target)`, in first-appearance order. Parallel
/// links between the same pair have their accessors joined with `", "`.
fn links_by_pair(graph: &Graph) -> (Vec<Pair>, HashMap<Pair, String>) {
    let mut order = Vec::new();
    let mut accessors: HashMap<Pair, String> = HashMap::new();
    for link in &graph.links {
        let pair = (link.source.clone(), link.target.clone());
        match accessors.get_mut(&pair) {
            Some(joined) => {
                joined.push_str(", ");
                joined.push_str(&link.desc.accessor);
            }
            None => {
                order.push(pair.clone());
                accessors.insert(pair, link.desc.accessor.clone());
            }
        }
    }
    (order, accessors)
}

fn diff_links(old: &Graph, new: &Graph) -> Vec<Link> {
    let (old_order, old_accessors) = links_by_pair(old);
    let (new_order, new_accessors) = links_by_pair(new);

    let link = |(source, target): Pair, accessor: String, mark: DiffMark| Link {
        source,
        target,
        desc: LinkDescriptor { accessor, mark },
    };

    let mut links = Vec::new();
    for pair in old_order {
        let before = &old_accessors[&pair];
        match new_accessors.get(&pair) {
            Some(after) if after == before => {}
            Some(after) => links.push(link(pair, format!("{before} -> {after}"), DiffMark::New)),
            None => {
                let accessor = DiffMark::Old.apply(before);
                links.push(link(pair, accessor, DiffMark::Old));
            }
        }
    }
    for pair in new_order {
        if !old_accessors.contains_key(&pair) {
            let accessor = DiffMark::New.apply(&new_accessors[&pair]);
            links.push(link(pair, accessor, DiffMark::New));
        }
    }
    links
}

// ── Names ───────────────────────────────────────────────────────

fn name_owners(graph: &Graph) -> (Vec<&str>, HashMap<&str, &NodeId>) {
    let mut order = Vec::new();
    let mut owners = HashMap::new();
    for node in &graph.nodes {
        for name in node.names.keys() {
            if owners.insert(name.as_str(), &node.id).is_none() {
                order.push(name.as_str());
            }
        }
    }
    (order, owners)
}

fn reconcile_names(old: &Graph, new: &Graph, out: &mut Graph) {
    let (old_order, old_owners) = name_owners(old);
    let (new_order, new_owners) = name_owners(new);

    let positions: HashMap<NodeId, usize> = out
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect();
    let mut tag = |id: &NodeId, name: &str, mark: DiffMark| {
        if let Some(&index) = positions.get(id) {
            out.nodes[index].names.insert(name.to_string(), mark);
        }
    };

    for name in old_order {
        let before = old_owners[name];
        tag(before, name, DiffMark::Old);
        if let Some(&after) = new_owners.get(name)
            && after != before
        {
            tag(after, name, DiffMark::New);
        }
    }
    for name in new_order {
        if !old_owners.contains_key(name) {
            tag(new_owners[name], name, DiffMark::New);
        }
    }
}

#[cfg(test)]
mod tests {
    use heapscope_types::NodeTag;

    use super::*;
    use crate::synthetic::{LIST_NODE, SyntheticHeap};
    use crate::{BuildOptions, GraphBuilder, NullPolicy};

    fn snapshot(heap: &SyntheticHeap, roots: &[(&str, u64)]) -> Graph {
        snapshot_with(heap, roots, BuildOptions::default())
    }

    fn snapshot_with(heap: &SyntheticHeap, roots: &[(&str, u64)], options: BuildOptions) -> Graph {
        let mut builder = GraphBuilder::new(heap, options);
        for (name, addr) in roots {
            builder
                .extend_from_value(&heap.pointer(LIST_NODE, *addr), &[*name])
                .expect("extraction should succeed");
        }
        builder.finish()
    }

    #[test]
    fn identical_snapshots_have_no_links_and_unmarked_nodes() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2, 3]);
        let graph = snapshot(&heap, &[("head", addrs[0])]);

        let delta = diff(&graph, &graph);
        assert!(delta.links.is_empty());
        assert_eq!(delta.nodes.len(), graph.nodes.len());
        for (merged, original) in delta.nodes.iter().zip(&graph.nodes) {
            assert_eq!(merged.id, original.id);
            assert_eq!(merged.desc.mark, DiffMark::Same);
            assert_eq!(merged.desc.attrs, original.desc.attrs);
        }
        let head = delta.named("head").expect("head survives the diff");
        assert_eq!(head.names["head"], DiffMark::Old);
    }

    #[test]
    fn changed_attribute_shows_both_values() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2, 3]);
        let before = snapshot(&heap, &[("head", addrs[0])]);
        heap.set_int(addrs[1], "val", 20);
        let after = snapshot(&heap, &[("head", addrs[0])]);

        let delta = diff(&before, &after);
        assert!(delta.links.is_empty());
        let changed = delta
            .node(&NodeId::for_address(addrs[1]))
            .expect("node is in both snapshots");
        assert_eq!(
            changed.desc.attrs.get("val"),
            Some(&AttrValue::Text("2 -> 20".to_string()))
        );
        let unchanged = delta.node(&NodeId::for_address(addrs[2])).unwrap();
        assert_eq!(unchanged.desc.attrs.get("val"), Some(&AttrValue::Int(3)));
    }

    #[test]
    fn removed_and_added_structure_is_marked() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2, 3]);
        let before = snapshot(&heap, &[("head", addrs[0])]);

        // 1 -> 3, plus a new node 4 after 3
        let extra = heap.list(&[4])[0];
        heap.set_ptr(addrs[0], "next", addrs[2]);
        heap.set_ptr(addrs[2], "next", extra);
        let after = snapshot(&heap, &[("head", addrs[0])]);

        let delta = diff(&before, &after);
        let mid = delta.node(&NodeId::for_address(addrs[1])).unwrap();
        assert_eq!(mid.desc.mark, DiffMark::Old);
        let added = delta.node(&NodeId::for_address(extra)).unwrap();
        assert_eq!(added.desc.mark, DiffMark::New);

        let labels: Vec<(&str, DiffMark)> = delta
            .links
            .iter()
            .map(|link| (link.desc.accessor.as_str(), link.desc.mark))
            .collect();
        assert_eq!(
            labels,
            [
                ("<old> next", DiffMark::Old),
                ("<old> next", DiffMark::Old),
                ("<new> next", DiffMark::New),
                ("<new> next", DiffMark::New),
            ]
        );
        assert!(delta.dangling_links().is_empty());
    }

    #[test]
    fn swapping_sides_swaps_old_and_new() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2]);
        let before = snapshot(&heap, &[("head", addrs[0])]);
        let third = heap.list(&[3])[0];
        heap.set_ptr(addrs[1], "next", third);
        let after = snapshot(&heap, &[("head", addrs[0])]);

        let forward = diff(&before, &after);
        let backward = diff(&after, &before);

        let marks = |graph: &Graph, mark: DiffMark| -> Vec<NodeId> {
            let mut ids: Vec<NodeId> = graph
                .nodes
                .iter()
                .filter(|node| node.desc.mark == mark)
                .map(|node| node.id.clone())
                .collect();
            ids.sort();
            ids
        };
        assert_eq!(marks(&forward, DiffMark::New), marks(&backward, DiffMark::Old));
        assert_eq!(marks(&forward, DiffMark::Old), marks(&backward, DiffMark::New));
        assert_eq!(forward.links[0].desc.accessor, "<new> next");
        assert_eq!(backward.links[0].desc.accessor, "<old> next");
    }

    #[test]
    fn attribute_keys_on_one_side_are_prefixed() {
        let id = NodeId::for_address(0x1000);
        let mut before = Graph::new();
        before.nodes.push(Node::new(
            id.clone(),
            NodeDescriptor::addr("T", [("a", AttrValue::Int(1))].into_iter().collect()),
        ));
        let mut after = Graph::new();
        after.nodes.push(Node::new(
            id.clone(),
            NodeDescriptor::addr("T", [("b", AttrValue::Int(2))].into_iter().collect()),
        ));

        let delta = diff(&before, &after);
        let attrs: Vec<(&str, String)> = delta.nodes[0]
            .desc
            .attrs
            .iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        assert_eq!(
            attrs,
            [("<old> a", "1".to_string()), ("<new> b", "2".to_string())]
        );
    }

    #[test]
    fn changed_accessor_between_same_pair() {
        let a = NodeId::for_address(1);
        let b = NodeId::for_address(2);
        let node = |id: &NodeId| Node::new(id.clone(), NodeDescriptor::addr("T", Attrs::new()));

        let mut before = Graph::new();
        before.nodes = vec![node(&a), node(&b)];
        before.links.push(Link::new(a.clone(), b.clone(), "left"));
        let mut after = before.clone();
        after.links[0].desc.accessor = "right".to_string();

        let delta = diff(&before, &after);
        assert_eq!(delta.links.len(), 1);
        assert_eq!(delta.links[0].desc.accessor, "left -> right");
        assert_eq!(delta.links[0].desc.mark, DiffMark::New);
    }

    #[test]
    fn moved_name_is_tagged_on_both_owners() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2]);
        let before = snapshot(&heap, &[("p", addrs[0]), ("gone", addrs[1])]);
        let after = snapshot(&heap, &[("p", addrs[1]), ("fresh", addrs[0])]);

        let delta = diff(&before, &after);
        let first = delta.node(&NodeId::for_address(addrs[0])).unwrap();
        let second = delta.node(&NodeId::for_address(addrs[1])).unwrap();
        assert_eq!(first.names.get("p"), Some(&DiffMark::Old));
        assert_eq!(second.names.get("p"), Some(&DiffMark::New));
        assert_eq!(second.names.get("gone"), Some(&DiffMark::Old));
        assert_eq!(first.names.get("fresh"), Some(&DiffMark::New));
    }

    #[test]
    fn every_name_of_a_large_frame_lands_on_its_owner() {
        let mut heap = SyntheticHeap::new();
        let values: Vec<i64> = (0..500).collect();
        let addrs = heap.list(&values);
        let names: Vec<String> = (0..addrs.len()).map(|i| format!("v{i}")).collect();
        let roots: Vec<(&str, u64)> = names
            .iter()
            .map(String::as_str)
            .zip(addrs.iter().copied())
            .collect();
        let before = snapshot(&heap, &roots);
        let shifted: Vec<(&str, u64)> = names
            .iter()
            .map(String::as_str)
            .zip(addrs.iter().copied().cycle().skip(1))
            .collect();
        let after = snapshot(&heap, &shifted);

        let delta = diff(&before, &after);
        assert_eq!(delta.nodes.len(), addrs.len());
        for (i, addr) in addrs.iter().enumerate() {
            let node = delta.node(&NodeId::for_address(*addr)).unwrap();
            assert_eq!(node.names.get(&names[i]), Some(&DiffMark::Old));
            let previous = (i + addrs.len() - 1) % addrs.len();
            assert_eq!(node.names.get(&names[previous]), Some(&DiffMark::New));
            assert_eq!(node.names.len(), 2);
        }
    }

    #[test]
    fn null_sentinels_diff_like_any_node() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1]);
        let options = BuildOptions::default().with_null_policy(NullPolicy::Sentinel);
        let graph = snapshot_with(&heap, &[("head", addrs[0])], options);

        let delta = diff(&graph, &graph);
        let null = delta
            .nodes
            .iter()
            .find(|node| node.desc.tag == NodeTag::Null)
            .expect("sentinel survives the diff");
        assert_eq!(null.desc.mark, DiffMark::Same);
        assert!(delta.links.is_empty());
    }
}
