//! Reachability of basic blocks from a function's entry.
//!
//! Unreachable blocks are not errors: a `forever` loop strands the
//! thread-end block and anything chained after the loop.

use std::collections::{HashSet, VecDeque};

use blockflow_common::{IrFunction, Label};

/// Labels of blocks reachable from the entry, in breadth-first order.
pub fn reachable_blocks(function: &IrFunction) -> Vec<&Label> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();

    if let Some((label, _)) = function.blocks.get_key_value(function.entry.as_str()) {
        seen.insert(label.as_str());
        queue.push_back(label);
    }
    while let Some(label) = queue.pop_front() {
        order.push(label);
        let Some(block) = function.block(label.as_str()) else {
            continue;
        };
        for target in block.instructions.iter().flat_map(|i| i.targets()) {
            if let Some((key, _)) = function.blocks.get_key_value(target.as_str()) {
                if seen.insert(key.as_str()) {
                    queue.push_back(key);
                }
            }
        }
    }
    order
}

/// Labels of blocks not reachable from the entry, in allocation order.
pub fn unreachable_blocks(function: &IrFunction) -> Vec<&Label> {
    let reachable: HashSet<&Label> = reachable_blocks(function).into_iter().collect();
    function
        .blocks
        .keys()
        .filter(|label| !reachable.contains(label))
        .collect()
}
