pub mod binary_tree;
pub mod cyclic_lists;
pub mod linear_list;
pub mod list_mutation;
pub mod reverse_k_group;

use heapscope::Session;
use heapscope::synthetic::{LIST_NODE, SyntheticHeap};

/// Points list variable `name` at `addr`, declaring it on line 1 the first
/// time so it always counts as initialized.
pub(crate) fn point(heap: &mut SyntheticHeap, name: &str, addr: u64) {
    if heap.variable(name).is_some() {
        heap.assign(name, addr);
    } else {
        heap.bind(name, LIST_NODE, addr, 1);
    }
}

/// Stops at `line` and remembers every `type_name` variable in scope.
pub(crate) fn remember(
    session: &mut Session<SyntheticHeap>,
    type_name: &str,
    line: u32,
) -> Result<usize, String> {
    session.inspector_mut().stop_at(line);
    session.visualize_type(type_name).map_err(|e| e.to_string())
}
