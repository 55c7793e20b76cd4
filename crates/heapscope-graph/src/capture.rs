use std::collections::HashSet;

use heapscope_types::Graph;
use tracing::debug;

use crate::{BuildOptions, ExtractError, GraphBuilder, Inspector, TypeFilter};

/// Evaluates `expr` and extracts everything reachable from it. The root is
/// named by the expression text.
pub fn extract_expr<I: Inspector>(
    inspector: &I,
    expr: &str,
    options: BuildOptions,
) -> Result<Graph, ExtractError> {
    let value = inspector.evaluate(expr)?;
    let mut builder = GraphBuilder::new(inspector, options);
    builder.extend_from_value(&value, &[expr])?;
    let graph = builder.finish();
    debug!(expr, nodes = graph.nodes.len(), links = graph.links.len(), "extracted expression");
    Ok(graph)
}

/// Extracts every frame variable pointing to `type_name` that is already
/// initialized at the current stop location, into one graph. Traversal only
/// follows pointers to `type_name`; each root is named after its variable.
pub fn extract_frame<I: Inspector>(
    inspector: &I,
    type_name: &str,
    options: BuildOptions,
) -> Result<Graph, ExtractError> {
    let options = BuildOptions {
        allowed_types: TypeFilter::only([type_name]),
        ..options
    };
    let mut builder = GraphBuilder::new(inspector, options);
    let mut seen = HashSet::new();

    for (name, value) in inspector.frame_variables() {
        if !inspector.is_valid(&value)
            || !inspector.is_pointer_to_record(&value, &builder.options().allowed_types)
            || !inspector.is_initialized_at_current_location(&value)
        {
            continue;
        }
        if !seen.insert(name.clone()) {
            debug!(%name, "shadowed variable skipped");
            continue;
        }
        builder.extend_from_value(&value, &[name.as_str()])?;
    }

    let graph = builder.finish();
    debug!(type_name, nodes = graph.nodes.len(), links = graph.links.len(), "extracted frame");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use heapscope_types::{AttrValue, NodeId};

    use super::*;
    use crate::synthetic::{FieldType, LIST_NODE, SyntheticHeap};

    #[test]
    fn expression_root_is_named_by_its_text() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2, 3]);
        heap.bind("head", LIST_NODE, addrs[0], 1);

        let graph = extract_expr(&heap, "head->next", BuildOptions::default()).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(
            graph.named("head->next").map(|node| &node.id),
            Some(&NodeId::for_address(addrs[1]))
        );
    }

    #[test]
    fn failed_evaluation_is_reported() {
        let heap = SyntheticHeap::new();
        let err = extract_expr(&heap, "nope", BuildOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractError::Evaluate { ref expr, .. } if expr == "nope"));
    }

    #[test]
    fn frame_capture_filters_by_type_and_initialization() {
        let mut heap = SyntheticHeap::new();
        let addrs = heap.list(&[1, 2, 3]);
        heap.declare("Other", [("x", FieldType::Int)]);
        let other = heap.alloc("Other");

        heap.bind("head", LIST_NODE, addrs[0], 2);
        heap.bind("mid", LIST_NODE, addrs[1], 3);
        heap.bind("later", LIST_NODE, addrs[2], 9);
        heap.bind("unrelated", "Other", other, 1);
        heap.bind_int("count", 3, 1);
        heap.stop_at(5);

        let graph = extract_frame(&heap, LIST_NODE, BuildOptions::default()).unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.named("head").is_some());
        assert!(graph.named("mid").is_some());
        assert!(graph.named("later").is_none());
        assert!(graph.named("unrelated").is_none());
        assert_eq!(
            graph.nodes[0].desc.attrs.get("val"),
            Some(&AttrValue::Int(1))
        );
    }

    #[test]
    fn frame_capture_ignores_null_roots() {
        let mut heap = SyntheticHeap::new();
        heap.list(&[1]);
        heap.bind("empty", LIST_NODE, 0, 1);
        heap.stop_at(2);

        let graph = extract_frame(&heap, LIST_NODE, BuildOptions::default()).unwrap();
        assert!(graph.is_empty());
    }
}
