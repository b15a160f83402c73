//! # Tree Materializer
//!
//! Turns a [`Term`] tree into graph nodes and `has__<child>` edges,
//! children first, and returns the id of the root node.
//!
//! ## Identity
//!
//! A node is identified by its class and canonical string. Terms already in
//! the node cache are returned without touching the backend, except for
//! `pmod`, `fragment` and `variant` terms, which are always looked up by full
//! property match because the same short term recurs under many parents.
//!
//! Structural edges are not cached; an edge is checked at the backend before
//! it is created so repeated imports never produce parallel edges.

use crate::backend::GraphBackend;
use crate::cache::NodeCache;
use crate::term::Term;
use crate::types::{BelGraphError, EdgeKind, FunctionClass, NodeDraft, NodeId};

/// A materialized term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub id: NodeId,
    pub class: FunctionClass,
    pub bel: String,
}

/// Counters of one materializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    pub nodes_created: usize,
    pub structural_edges_created: usize,
    pub cache_hits: usize,
}

/// Materializes terms against a backend, sharing a node cache.
#[derive(Debug)]
pub struct Materializer<'c> {
    cache: &'c mut NodeCache,
    stats: MaterializeStats,
}

impl<'c> Materializer<'c> {
    #[must_use]
    pub fn new(cache: &'c mut NodeCache) -> Self {
        Self {
            cache,
            stats: MaterializeStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> MaterializeStats {
        self.stats
    }

    /// Materialize `term` and all of its sub-terms.
    pub fn materialize(
        &mut self,
        backend: &mut dyn GraphBackend,
        term: &Term,
    ) -> Result<Materialized, BelGraphError> {
        let class = term.function;
        let bel = term.canonical();

        if !class.always_resolve()
            && let Some(id) = self.cache.has(class, &bel)
        {
            self.stats.cache_hits = self.stats.cache_hits.saturating_add(1);
            return Ok(Materialized { id, class, bel });
        }

        let children = term
            .children()
            .map(|child| self.materialize(backend, child))
            .collect::<Result<Vec<_>, _>>()?;

        let draft = NodeDraft {
            class,
            bel: bel.clone(),
            properties: term.properties(),
            pure: false,
        };

        let id = if class.always_resolve() {
            match backend.find_node(&draft)? {
                Some(id) => id,
                None => self.merge(backend, draft)?,
            }
        } else {
            let id = self.merge(backend, draft)?;
            self.cache.put(class, &bel, id);
            id
        };

        for child in &children {
            let kind = EdgeKind::Structural(child.class);
            if backend.find_plain_edge(id, kind, child.id)?.is_none() {
                let merged = backend.merge_edge(id, kind, None, child.id)?;
                if merged.created {
                    self.stats.structural_edges_created =
                        self.stats.structural_edges_created.saturating_add(1);
                }
            }
        }

        Ok(Materialized { id, class, bel })
    }

    fn merge(
        &mut self,
        backend: &mut dyn GraphBackend,
        draft: NodeDraft,
    ) -> Result<NodeId, BelGraphError> {
        let class = draft.class;
        let merged = backend.merge_node(draft)?;
        if merged.created {
            self.stats.nodes_created = self.stats.nodes_created.saturating_add(1);
            tracing::debug!(node = %merged.id, %class, "node created");
        }
        Ok(merged.id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::term::Arg;

    fn tp53_ph_ser15() -> Term {
        Term::new(
            FunctionClass::Protein,
            vec![
                Arg::literal("HGNC", "TP53"),
                Arg::Term(Term::new(
                    FunctionClass::Pmod,
                    vec![Arg::Fields(vec![
                        ("type".to_string(), Some("Ph".to_string())),
                        ("amino_acid".to_string(), Some("Ser".to_string())),
                        ("position".to_string(), Some("15".to_string())),
                    ])],
                )),
            ],
        )
    }

    #[test]
    fn materializes_children_first_with_structural_edge() {
        let mut graph = Graph::new();
        let mut cache = NodeCache::default();
        let mut materializer = Materializer::new(&mut cache);

        let root = materializer
            .materialize(&mut graph, &tp53_ph_ser15())
            .expect("materialize");

        assert_eq!(root.bel, "p(HGNC:\"TP53\",pmod(Ph,Ser,15))");
        assert_eq!(graph.node_count().unwrap(), 2);
        let out = graph.outgoing(root.id).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EdgeKind::Structural(FunctionClass::Pmod));
        // child was created before its parent
        assert!(out[0].to < root.id);
        assert_eq!(materializer.stats().nodes_created, 2);
        assert_eq!(materializer.stats().structural_edges_created, 1);
    }

    #[test]
    fn second_pass_is_served_from_cache() {
        let mut graph = Graph::new();
        let mut cache = NodeCache::default();
        let mut materializer = Materializer::new(&mut cache);
        let term = tp53_ph_ser15();

        let first = materializer.materialize(&mut graph, &term).unwrap();
        let second = materializer.materialize(&mut graph, &term).unwrap();

        assert_eq!(first, second);
        assert_eq!(materializer.stats().cache_hits, 1);
        assert_eq!(graph.node_count().unwrap(), 2);
        assert_eq!(graph.edge_count().unwrap(), 1);
    }

    #[test]
    fn pmod_is_shared_between_parents() {
        let mut graph = Graph::new();
        let mut cache = NodeCache::default();
        let mut materializer = Materializer::new(&mut cache);

        let pmod = || {
            Arg::Term(Term::new(
                FunctionClass::Pmod,
                vec![Arg::Fields(vec![("type".to_string(), Some("Ph".to_string()))])],
            ))
        };
        let akt1 = Term::new(
            FunctionClass::Protein,
            vec![Arg::literal("HGNC", "AKT1"), pmod()],
        );
        let akt2 = Term::new(
            FunctionClass::Protein,
            vec![Arg::literal("HGNC", "AKT2"), pmod()],
        );

        let a = materializer.materialize(&mut graph, &akt1).unwrap();
        let b = materializer.materialize(&mut graph, &akt2).unwrap();

        // two proteins and one shared pmod node
        assert_eq!(graph.node_count().unwrap(), 3);
        let pmod_a = graph.outgoing(a.id).unwrap()[0].to;
        let pmod_b = graph.outgoing(b.id).unwrap()[0].to;
        assert_eq!(pmod_a, pmod_b);
    }

    #[test]
    fn cold_cache_yields_same_graph() {
        let term = tp53_ph_ser15();

        let mut warm_graph = Graph::new();
        let mut cache = NodeCache::default();
        let mut warm = Materializer::new(&mut cache);
        warm.materialize(&mut warm_graph, &term).unwrap();
        warm.materialize(&mut warm_graph, &term).unwrap();

        let mut cold_graph = Graph::new();
        for _ in 0..2 {
            let mut fresh = NodeCache::default();
            Materializer::new(&mut fresh)
                .materialize(&mut cold_graph, &term)
                .unwrap();
        }

        assert_eq!(warm_graph.nodes().unwrap(), cold_graph.nodes().unwrap());
        assert_eq!(warm_graph.edges().unwrap(), cold_graph.edges().unwrap());
    }
}
