use heapscope::HistoryLabel;
use heapscope::Session;
use heapscope::synthetic::{LIST_NODE, SyntheticHeap};

use super::{point, remember};

/// A ring of three nodes, a second list running into the ring, and a node
/// pointing at itself.
pub fn run(session: &mut Session<SyntheticHeap>) -> Result<(), String> {
    let heap = session.inspector_mut();
    heap.set_location(HistoryLabel::new("cycles.cpp", 1, 5, "main"));

    let ring = heap.list(&[1, 2, 3]);
    heap.set_ptr(ring[2], "next", ring[0]);

    let tail = heap.list(&[10, 20]);
    heap.set_ptr(tail[1], "next", ring[1]);

    let lonely = heap.list(&[7])[0];
    heap.set_ptr(lonely, "next", lonely);

    point(heap, "ring", ring[0]);
    point(heap, "rho", tail[0]);
    point(heap, "self_loop", lonely);

    let index = remember(session, LIST_NODE, 12)?;
    println!("remembered cyclic lists as #{index}");
    Ok(())
}
