use heapscope::HistoryLabel;
use heapscope::Session;
use heapscope::synthetic::{LIST_NODE, SyntheticHeap};

use super::{point, remember};

/// Reverses a list in groups of `k`, remembering a snapshot after every
/// pointer flip.
pub fn run(session: &mut Session<SyntheticHeap>, k: u32) -> Result<(), String> {
    if k == 0 {
        return Err("k must be at least 1".to_string());
    }

    let heap = session.inspector_mut();
    heap.set_location(HistoryLabel::new("reverse_k_group.cpp", 1, 5, "reverseKGroup"));
    let nodes = heap.list(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let dummy = heap.list(&[0])[0];
    heap.set_ptr(dummy, "next", nodes[0]);
    point(heap, "dummy", dummy);

    let mut line = 2;
    remember(session, LIST_NODE, line)?;

    let next_of = |heap: &SyntheticHeap, addr: u64| heap.ptr(addr, "next").unwrap_or(0);
    let mut group_prev = dummy;
    loop {
        let heap = session.inspector_mut();
        let mut kth = group_prev;
        for _ in 0..k {
            kth = next_of(heap, kth);
            if kth == 0 {
                break;
            }
        }
        if kth == 0 {
            break;
        }

        let group_next = next_of(heap, kth);
        let first = next_of(heap, group_prev);
        let mut prev = group_next;
        let mut cur = first;
        while cur != group_next {
            let heap = session.inspector_mut();
            let next = next_of(heap, cur);
            heap.set_ptr(cur, "next", prev);
            prev = cur;
            cur = next;
            point(heap, "prev", prev);
            point(heap, "cur", cur);
            line += 1;
            remember(session, LIST_NODE, line)?;
        }

        session.inspector_mut().set_ptr(group_prev, "next", kth);
        group_prev = first;
        line += 1;
        remember(session, LIST_NODE, line)?;
    }

    session.visualize_diff(0, -1).map_err(|e| e.to_string())?;
    Ok(())
}
