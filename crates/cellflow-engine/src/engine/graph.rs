//! Dependency graph between cells.
//!
//! `dependents` maps a source cell to the cells whose formulas read it;
//! `precedents` is the reverse index so a cell's own edges can be dropped
//! without scanning every set. Cycles are rejected when an edge is added,
//! which keeps every propagation pass finite.

use std::collections::{BTreeSet, HashMap};

use super::CellRef;
use super::cycle::find_path;
use super::error::{EngineError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependents: HashMap<CellRef, BTreeSet<CellRef>>,
    precedents: HashMap<CellRef, BTreeSet<CellRef>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` reads `source`.
    ///
    /// Fails with `CyclicDependency` (leaving the graph untouched) when
    /// `source` is already reachable from `dependent`.
    pub fn register_dependency(&mut self, source: CellRef, dependent: CellRef) -> Result<()> {
        if let Some(path) = find_path(&self.dependents, &dependent, &source) {
            tracing::warn!(
                source = %source,
                dependent = %dependent,
                cycle_len = path.len(),
                "rejected dependency that would close a cycle"
            );
            return Err(EngineError::CyclicDependency {
                precedent: source,
                dependent,
            });
        }

        self.dependents.entry(source).or_default().insert(dependent);
        self.precedents.entry(dependent).or_default().insert(source);
        Ok(())
    }

    /// Cells whose formulas read `source` (empty if none).
    pub fn dependents_of(&self, source: &CellRef) -> BTreeSet<CellRef> {
        self.dependents.get(source).cloned().unwrap_or_default()
    }

    /// Cells read by the formula stored at `dependent`.
    pub fn precedents_of(&self, dependent: &CellRef) -> BTreeSet<CellRef> {
        self.precedents.get(dependent).cloned().unwrap_or_default()
    }

    /// Remove `dependent` from every dependents-set it appears in.
    pub fn remove_dependencies_of(&mut self, dependent: &CellRef) {
        let Some(sources) = self.precedents.remove(dependent) else {
            return;
        };
        for source in sources {
            if let Some(set) = self.dependents.get_mut(&source) {
                set.remove(dependent);
                if set.is_empty() {
                    self.dependents.remove(&source);
                }
            }
        }
    }

    /// Replace all edges into `dependent` with edges from `sources`.
    ///
    /// Transactional: if any new edge would close a cycle the previous
    /// edges are restored and the error is returned.
    pub fn replace_dependencies(
        &mut self,
        dependent: CellRef,
        sources: &BTreeSet<CellRef>,
    ) -> Result<()> {
        let previous = self.precedents_of(&dependent);
        self.remove_dependencies_of(&dependent);

        for source in sources {
            if let Err(err) = self.register_dependency(*source, dependent) {
                self.remove_dependencies_of(&dependent);
                for old in &previous {
                    self.dependents.entry(*old).or_default().insert(dependent);
                    self.precedents.entry(dependent).or_default().insert(*old);
                }
                return Err(err);
            }
        }

        tracing::debug!(cell = %dependent, precedents = sources.len(), "registered dependencies");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Every cell that appears as a key or member.
    pub fn cells(&self) -> BTreeSet<CellRef> {
        self.dependents
            .keys()
            .chain(self.precedents.keys())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(label: &str) -> CellRef {
        label.parse().unwrap()
    }

    #[test]
    fn test_dependents_of_unknown_is_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.dependents_of(&cell("A1")).is_empty());
    }

    #[test]
    fn test_register_and_remove() {
        let mut graph = DependencyGraph::new();
        graph.register_dependency(cell("A1"), cell("B1")).unwrap();
        graph.register_dependency(cell("A2"), cell("B1")).unwrap();
        graph.register_dependency(cell("A1"), cell("C1")).unwrap();

        assert_eq!(
            graph.dependents_of(&cell("A1")),
            BTreeSet::from([cell("B1"), cell("C1")])
        );

        graph.remove_dependencies_of(&cell("B1"));
        assert_eq!(graph.dependents_of(&cell("A1")), BTreeSet::from([cell("C1")]));
        assert!(graph.dependents_of(&cell("A2")).is_empty());
        assert!(graph.precedents_of(&cell("B1")).is_empty());
    }

    #[test]
    fn test_cycle_is_rejected_and_graph_unchanged() {
        let mut graph = DependencyGraph::new();
        // A1 depends on B1.
        graph.register_dependency(cell("B1"), cell("A1")).unwrap();
        let before = graph.clone();

        let err = graph.register_dependency(cell("A1"), cell("B1")).unwrap_err();
        assert_eq!(
            err,
            EngineError::CyclicDependency {
                precedent: cell("A1"),
                dependent: cell("B1"),
            }
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        assert!(graph.register_dependency(cell("A1"), cell("A1")).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_transitive_cycle_is_rejected() {
        let mut graph = DependencyGraph::new();
        graph.register_dependency(cell("A1"), cell("B1")).unwrap();
        graph.register_dependency(cell("B1"), cell("C1")).unwrap();
        assert!(graph.register_dependency(cell("C1"), cell("A1")).is_err());
    }

    #[test]
    fn test_replace_dependencies_restores_on_cycle() {
        let mut graph = DependencyGraph::new();
        graph.register_dependency(cell("A1"), cell("B1")).unwrap();
        graph.register_dependency(cell("C1"), cell("A1")).unwrap();
        let before = graph.clone();

        // A1 := B1 + D1 would close A1 -> B1 -> A1.
        let result = graph.replace_dependencies(cell("A1"), &BTreeSet::from([cell("D1"), cell("B1")]));
        assert!(matches!(result, Err(EngineError::CyclicDependency { .. })));
        assert_eq!(graph, before);
    }
}
