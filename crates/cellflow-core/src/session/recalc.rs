//! Recalculation propagation.
//!
//! After a write, every formula cell reachable from the written cells through
//! dependents edges is re-evaluated once, in topological order, so a cell is
//! only evaluated after the formula inputs it reads inside the affected set.

use std::collections::HashSet;

use super::Session;
use crate::error::Result;
use crate::notify::Notification;
use cellflow_engine::engine::{CellRef, DependencyGraph};

/// Topological order of `seeds` and everything reachable from them.
///
/// Reverse DFS post-order. The graph rejects cycles on registration, so the
/// reachable subgraph is acyclic and each cell appears exactly once.
pub(crate) fn recalc_order(graph: &DependencyGraph, seeds: &[CellRef]) -> Vec<CellRef> {
    let children = |cell: &CellRef| -> Vec<CellRef> {
        // Reversed so popping visits dependents in ascending order.
        graph.dependents_of(cell).into_iter().rev().collect()
    };

    let mut visited: HashSet<CellRef> = HashSet::new();
    let mut post_order = Vec::new();

    // Seeds are walked last to first so independent seeds keep their order.
    for seed in seeds.iter().rev() {
        if !visited.insert(*seed) {
            continue;
        }
        let mut stack = vec![(*seed, children(seed))];
        loop {
            let Some(top) = stack.last_mut() else {
                break;
            };
            match top.1.pop() {
                Some(next) => {
                    if visited.insert(next) {
                        let next_children = children(&next);
                        stack.push((next, next_children));
                    }
                }
                None => {
                    post_order.push(top.0);
                    stack.pop();
                }
            }
        }
    }

    post_order.reverse();
    post_order
}

impl Session {
    /// Re-evaluate every formula cell reachable from `seeds` and queue a
    /// change notification for each visited cell, seeds included.
    pub(crate) fn propagate(&mut self, seeds: &[CellRef]) -> Result<()> {
        self.recalculate(seeds, true)
    }

    /// Recalculate every formula cell without per-cell notifications.
    pub(crate) fn recalculate_all(&mut self) -> Result<()> {
        let seeds: Vec<CellRef> = self.grid.formula_cells().map(|(cell, _)| cell).collect();
        self.recalculate(&seeds, false)
    }

    fn recalculate(&mut self, seeds: &[CellRef], notify: bool) -> Result<()> {
        let order = recalc_order(&self.graph, seeds);
        tracing::debug!(seeds = seeds.len(), cells = order.len(), "propagating");

        for cell in order {
            if self.grid.is_formula(&cell)? {
                let formula = self.grid.get(&cell)?.to_string();
                let value = self.evaluator.evaluate_cell(&self.grid, &formula)?;
                self.grid.set_computed(&cell, value)?;
            }
            if notify {
                let display = self.grid.display(&cell)?.to_string();
                self.emit(Notification::CellChanged { cell, display });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(label: &str) -> CellRef {
        label.parse().unwrap()
    }

    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (source, dependent) in edges {
            graph.register_dependency(cell(source), cell(dependent)).unwrap();
        }
        graph
    }

    fn position(order: &[CellRef], label: &str) -> usize {
        order.iter().position(|c| *c == cell(label)).unwrap()
    }

    #[test]
    fn test_order_visits_each_cell_once() {
        // Diamond: A1 feeds B1 and B2, both feed C1.
        let g = graph(&[("A1", "B1"), ("A1", "B2"), ("B1", "C1"), ("B2", "C1")]);
        let order = recalc_order(&g, &[cell("A1")]);
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], cell("A1"));
        assert!(position(&order, "B1") < position(&order, "C1"));
        assert!(position(&order, "B2") < position(&order, "C1"));
    }

    #[test]
    fn test_long_path_settles_before_short_one() {
        // C1 reads A1 directly and through B1; it must come after B1.
        let g = graph(&[("A1", "C1"), ("A1", "B1"), ("B1", "C1")]);
        let order = recalc_order(&g, &[cell("A1")]);
        assert_eq!(order, vec![cell("A1"), cell("B1"), cell("C1")]);
    }

    #[test]
    fn test_unrelated_cells_are_not_visited() {
        let g = graph(&[("A1", "B1"), ("A2", "B2")]);
        assert_eq!(recalc_order(&g, &[cell("A1")]), vec![cell("A1"), cell("B1")]);
    }

    #[test]
    fn test_multiple_seeds_share_dependents() {
        let g = graph(&[("A1", "C1"), ("A2", "C1")]);
        let order = recalc_order(&g, &[cell("A1"), cell("A2")]);
        assert_eq!(order, vec![cell("A1"), cell("A2"), cell("C1")]);
    }
}
