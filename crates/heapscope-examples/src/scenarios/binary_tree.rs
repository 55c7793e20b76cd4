use heapscope::HistoryLabel;
use heapscope::Session;
use heapscope::synthetic::{FieldType, SyntheticHeap};

use super::remember;

const TREE_NODE: &str = "TreeNode";

fn insert(heap: &mut SyntheticHeap, root: u64, key: i64) {
    let node = heap.alloc(TREE_NODE);
    heap.set_int(node, "key", key);

    let mut cur = root;
    loop {
        let side = if key < heap.int(cur, "key").unwrap_or_default() {
            "left"
        } else {
            "right"
        };
        match heap.ptr(cur, side) {
            Some(0) | None => {
                heap.set_ptr(cur, side, node);
                return;
            }
            Some(child) => cur = child,
        }
    }
}

/// A balanced search tree, remembered once per insertion.
pub fn run(session: &mut Session<SyntheticHeap>) -> Result<(), String> {
    let heap = session.inspector_mut();
    heap.set_location(HistoryLabel::new("bst.cpp", 1, 9, "insert"));
    heap.declare(
        TREE_NODE,
        [
            ("key", FieldType::Int),
            ("left", FieldType::ptr(TREE_NODE)),
            ("right", FieldType::ptr(TREE_NODE)),
        ],
    );
    let root = heap.alloc(TREE_NODE);
    heap.set_int(root, "key", 8);
    heap.bind("root", TREE_NODE, root, 1);

    let mut line = 2;
    remember(session, TREE_NODE, line)?;
    for key in [4, 12, 2, 6, 10, 14] {
        insert(session.inspector_mut(), root, key);
        line += 1;
        remember(session, TREE_NODE, line)?;
    }

    session.visualize_diff(0, -1).map_err(|e| e.to_string())?;
    Ok(())
}
