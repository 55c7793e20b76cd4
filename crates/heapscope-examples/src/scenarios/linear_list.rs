use heapscope::HistoryLabel;
use heapscope::Session;
use heapscope::synthetic::{LIST_NODE, SyntheticHeap};

use super::{point, remember};

pub fn run(session: &mut Session<SyntheticHeap>) -> Result<(), String> {
    let heap = session.inspector_mut();
    heap.set_location(HistoryLabel::new("linear_list.cpp", 1, 5, "main"));
    let nodes = heap.list(&[1, 2, 3, 4, 5]);
    point(heap, "head", nodes[0]);
    point(heap, "tail", nodes[4]);

    let index = remember(session, LIST_NODE, 8)?;
    println!("remembered linear list as #{index}");

    session
        .visualize_expr("head->next->next")
        .map_err(|e| e.to_string())?;
    Ok(())
}
