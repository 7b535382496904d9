//! Circular dependency detection.
//!
//! Before an edge `precedent -> dependent` is committed, we must verify the
//! dependent does not already feed (directly or transitively) the precedent,
//! e.g. A1 reads B1, B1 reads C1, and C1 would now read A1. Depth-first
//! search over the dependents map finds such a path.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::CellRef;

/// Find a path `from -> ... -> to` following dependents edges.
/// Returns the path (both ends included) when `to` is reachable.
pub fn find_path(
    dependents: &HashMap<CellRef, BTreeSet<CellRef>>,
    from: &CellRef,
    to: &CellRef,
) -> Option<Vec<CellRef>> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();

    if find_path_dfs(dependents, from, to, &mut visited, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn find_path_dfs(
    dependents: &HashMap<CellRef, BTreeSet<CellRef>>,
    current: &CellRef,
    target: &CellRef,
    visited: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if !visited.insert(*current) {
        return false;
    }
    path.push(*current);

    if current == target {
        return true;
    }

    if let Some(next) = dependents.get(current) {
        for dep in next {
            if find_path_dfs(dependents, dep, target, visited, path) {
                return true;
            }
        }
    }

    path.pop();
    false
}
