use heapscope::HistoryLabel;
use heapscope::Session;
use heapscope::synthetic::{LIST_NODE, SyntheticHeap};

use super::{point, remember};

/// Edits a list in place and diffs each step against the previous one.
pub fn run(session: &mut Session<SyntheticHeap>) -> Result<(), String> {
    let heap = session.inspector_mut();
    heap.set_location(HistoryLabel::new("mutate.cpp", 1, 5, "main"));
    let nodes = heap.list(&[1, 2, 3, 4]);
    point(heap, "head", nodes[0]);
    remember(session, LIST_NODE, 4)?;

    // head->next->val = 20;
    session.inspector_mut().set_int(nodes[1], "val", 20);
    remember(session, LIST_NODE, 5)?;
    session.visualize_latest_diff().map_err(|e| e.to_string())?;

    // unlink the third node
    let heap = session.inspector_mut();
    heap.set_ptr(nodes[1], "next", nodes[3]);
    heap.free(nodes[2]);
    remember(session, LIST_NODE, 7)?;
    session.visualize_latest_diff().map_err(|e| e.to_string())?;

    // push a new node at the front
    let heap = session.inspector_mut();
    let fresh = heap.list(&[0])[0];
    heap.set_ptr(fresh, "next", nodes[0]);
    point(heap, "head", fresh);
    remember(session, LIST_NODE, 10)?;
    session.visualize_latest_diff().map_err(|e| e.to_string())?;

    session.visualize_diff(0, -1).map_err(|e| e.to_string())?;
    Ok(())
}
