//! # Canonicalization Pass
//!
//! Whole-graph pass run after new statements were imported.
//!
//! ## Phases (in order)
//!
//! 1. **Tag pure**: moleculable nodes without a fragment/variant/pmod/gmod/location
//!    sub-term get `pure = true`.
//! 2. **Link modified to pure**: every modified moleculable node gets a pure
//!    counterpart `short(NS:"name")` and a link edge from it.
//! 3. **Central dogma** (optional): pure proteins without an RNA get one
//!    (`r -translated_to-> p`), then pure RNAs without a gene get one
//!    (`g -transcribed_to-> r`).
//! 4. **Species** (optional): taxonomy ids from gene-symbol namespaces.
//! 5. **Involved** (optional): every node not visited yet records the names of
//!    the genes and of the other named constituents it is built from.
//!
//! Every phase checks before it creates, so the pass is idempotent. A failure
//! on one candidate is logged and counted; the pass moves on to the next one.

use crate::backend::{GraphBackend, NodeUpdate};
use crate::primitives::{MAX_STRUCTURAL_DEPTH, species_for_namespace};
use crate::query::{GraphQuery, QueryRow};
use crate::types::{
    BelGraphError, Edge, EdgeKind, FunctionClass, Node, NodeDraft, NodeId, PureLink, RelationType,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Counters of one canonicalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalizationReport {
    /// Nodes newly tagged pure.
    pub pure_tagged: usize,
    pub pure_nodes_created: usize,
    pub pure_links_created: usize,
    pub translated_to_added: usize,
    pub transcribed_to_added: usize,
    pub species_updated: usize,
    /// Nodes whose involved genes/others were filled in.
    pub involved_updated: usize,
    /// Candidates skipped because of an error.
    pub failures: usize,
}

impl CanonicalizationReport {
    /// Nodes and edges created by the run.
    #[must_use]
    pub fn created(&self) -> usize {
        self.pure_nodes_created
            .saturating_add(self.pure_links_created)
            .saturating_add(self.translated_to_added)
            .saturating_add(self.transcribed_to_added)
    }
}

/// Structural children followed to the molecules a node is built from.
const MOLECULE_TRAVERSAL: [FunctionClass; 7] = [
    FunctionClass::Reactants,
    FunctionClass::Products,
    FunctionClass::Protein,
    FunctionClass::Composite,
    FunctionClass::Complex,
    FunctionClass::Gene,
    FunctionClass::Rna,
];

/// Structural children followed to the other named constituents of a node.
const OTHER_TRAVERSAL: [FunctionClass; 5] = [
    FunctionClass::Abundance,
    FunctionClass::Reactants,
    FunctionClass::Products,
    FunctionClass::Composite,
    FunctionClass::Complex,
];

fn is_molecule(class: FunctionClass) -> bool {
    matches!(
        class,
        FunctionClass::Protein | FunctionClass::Rna | FunctionClass::Gene
    )
}

/// Runs the canonicalization phases against a backend.
pub struct Canonicalizer<'b> {
    backend: &'b mut dyn GraphBackend,
    central_dogma: bool,
    species: bool,
    involved: bool,
}

impl<'b> Canonicalizer<'b> {
    /// All phases enabled.
    pub fn new(backend: &'b mut dyn GraphBackend) -> Self {
        Self {
            backend,
            central_dogma: true,
            species: true,
            involved: true,
        }
    }

    #[must_use]
    pub fn central_dogma(mut self, enabled: bool) -> Self {
        self.central_dogma = enabled;
        self
    }

    #[must_use]
    pub fn species(mut self, enabled: bool) -> Self {
        self.species = enabled;
        self
    }

    #[must_use]
    pub fn involved(mut self, enabled: bool) -> Self {
        self.involved = enabled;
        self
    }

    /// Run every enabled phase.
    ///
    /// Fails only if a bulk candidate query fails.
    pub fn run(mut self) -> Result<CanonicalizationReport, BelGraphError> {
        let mut report = CanonicalizationReport::default();

        self.tag_pure(&mut report)?;
        self.link_modified_to_pure(&mut report)?;
        if self.central_dogma {
            self.complete_central_dogma(&mut report)?;
        }
        if self.species {
            self.update_species(&mut report)?;
        }
        if self.involved {
            self.update_involved(&mut report)?;
        }

        tracing::info!(
            pure_tagged = report.pure_tagged,
            pure_nodes = report.pure_nodes_created,
            pure_links = report.pure_links_created,
            translated_to = report.translated_to_added,
            transcribed_to = report.transcribed_to_added,
            species = report.species_updated,
            involved = report.involved_updated,
            failures = report.failures,
            "canonicalization finished"
        );
        Ok(report)
    }

    // =========================================================================
    // PURE NODES
    // =========================================================================

    /// Phase 1.
    pub fn tag_pure(&mut self, report: &mut CanonicalizationReport) -> Result<(), BelGraphError> {
        for node in nodes_of(self.backend.raw_query(&GraphQuery::PureCandidates)?) {
            if node.pure {
                continue;
            }
            match self.backend.update_node(node.id, NodeUpdate::pure()) {
                Ok(true) => report.pure_tagged = report.pure_tagged.saturating_add(1),
                Ok(false) => {}
                Err(error) => skip(report, &node, "tag pure", &error),
            }
        }
        Ok(())
    }

    /// Phase 2.
    pub fn link_modified_to_pure(
        &mut self,
        report: &mut CanonicalizationReport,
    ) -> Result<(), BelGraphError> {
        for row in self.backend.raw_query(&GraphQuery::ModifiedNodes)? {
            let QueryRow::Modified { node, edge } = row else {
                continue;
            };
            if let Err(error) = self.link_one(&node, &edge, report) {
                skip(report, &node, "link to pure", &error);
            }
        }
        Ok(())
    }

    fn link_one(
        &mut self,
        modified: &Node,
        edge: &Edge,
        report: &mut CanonicalizationReport,
    ) -> Result<(), BelGraphError> {
        let EdgeKind::Structural(modifier) = edge.kind else {
            return Ok(());
        };
        let Some(link) = PureLink::for_modifier(modifier, modified.class) else {
            return Ok(());
        };
        let Some(pure) = self.pure_counterpart(modified.class, modified, report)? else {
            return Ok(());
        };

        let kind = EdgeKind::PureLink(link);
        if self
            .backend
            .find_plain_edge(pure, kind, modified.id)?
            .is_none()
            && self.backend.merge_edge(pure, kind, None, modified.id)?.created
        {
            report.pure_links_created = report.pure_links_created.saturating_add(1);
        }
        Ok(())
    }

    /// Find or create the pure node of `class` named like `source`.
    ///
    /// `None` when `source` has no namespace/name pair to derive it from.
    fn pure_counterpart(
        &mut self,
        class: FunctionClass,
        source: &Node,
        report: &mut CanonicalizationReport,
    ) -> Result<Option<NodeId>, BelGraphError> {
        let (Some(namespace), Some(name)) = (source.namespace(), source.name()) else {
            tracing::debug!(node = %source.id, bel = %source.bel, "no namespace/name, skipped");
            return Ok(None);
        };
        let merged = self
            .backend
            .merge_node(NodeDraft::pure(class, namespace, name))?;
        if merged.created {
            report.pure_nodes_created = report.pure_nodes_created.saturating_add(1);
        }
        Ok(Some(merged.id))
    }

    // =========================================================================
    // CENTRAL DOGMA
    // =========================================================================

    /// Phase 3: proteins first, so RNAs created for them get their genes too.
    pub fn complete_central_dogma(
        &mut self,
        report: &mut CanonicalizationReport,
    ) -> Result<(), BelGraphError> {
        for protein in nodes_of(self.backend.raw_query(&GraphQuery::proteins_without_rna())?) {
            match self.add_precursor(&protein, FunctionClass::Rna, RelationType::TranslatedTo, report)
            {
                Ok(true) => {
                    report.translated_to_added = report.translated_to_added.saturating_add(1);
                }
                Ok(false) => {}
                Err(error) => skip(report, &protein, "translated_to", &error),
            }
        }

        for rna in nodes_of(self.backend.raw_query(&GraphQuery::rnas_without_gene())?) {
            match self.add_precursor(&rna, FunctionClass::Gene, RelationType::TranscribedTo, report) {
                Ok(true) => {
                    report.transcribed_to_added = report.transcribed_to_added.saturating_add(1);
                }
                Ok(false) => {}
                Err(error) => skip(report, &rna, "transcribed_to", &error),
            }
        }
        Ok(())
    }

    /// Link `product` from its pure precursor of class `precursor`; `true` if the edge is new.
    fn add_precursor(
        &mut self,
        product: &Node,
        precursor: FunctionClass,
        relation: RelationType,
        report: &mut CanonicalizationReport,
    ) -> Result<bool, BelGraphError> {
        let Some(source) = self.pure_counterpart(precursor, product, report)? else {
            return Ok(false);
        };
        let kind = EdgeKind::Relation(relation);
        if self.backend.find_plain_edge(source, kind, product.id)?.is_some() {
            return Ok(false);
        }
        Ok(self.backend.merge_edge(source, kind, None, product.id)?.created)
    }

    // =========================================================================
    // SPECIES
    // =========================================================================

    /// Phase 4.
    pub fn update_species(
        &mut self,
        report: &mut CanonicalizationReport,
    ) -> Result<(), BelGraphError> {
        let molecules = GraphQuery::NodesOfClass(vec![
            FunctionClass::Protein,
            FunctionClass::Rna,
            FunctionClass::Gene,
        ]);
        for node in nodes_of(self.backend.raw_query(&molecules)?) {
            if let Some(taxon) = node.namespace().and_then(species_for_namespace) {
                self.set_species(&node, taxon, report);
            }
        }

        for node in nodes_of(self.backend.raw_query(&GraphQuery::RelationParticipants)?) {
            match self.descendants(node.id, &MOLECULE_TRAVERSAL) {
                Ok(descendants) => {
                    let namespaces: BTreeSet<&str> = descendants
                        .iter()
                        .filter(|n| is_molecule(n.class))
                        .filter_map(Node::namespace)
                        .collect();
                    let mut namespaces = namespaces.into_iter();
                    if let (Some(only), None) = (namespaces.next(), namespaces.next())
                        && let Some(taxon) = species_for_namespace(only)
                    {
                        self.set_species(&node, taxon, report);
                    }
                }
                Err(error) => skip(report, &node, "species", &error),
            }
        }
        Ok(())
    }

    fn set_species(&mut self, node: &Node, taxon: u32, report: &mut CanonicalizationReport) {
        match self.backend.update_node(node.id, NodeUpdate::species(taxon)) {
            Ok(true) => report.species_updated = report.species_updated.saturating_add(1),
            Ok(false) => {}
            Err(error) => skip(report, node, "species", &error),
        }
    }

    // =========================================================================
    // INVOLVED
    // =========================================================================

    /// Phase 5: only nodes never visited before are candidates; the
    /// structural children of a node are fixed, so the lists never go stale.
    pub fn update_involved(
        &mut self,
        report: &mut CanonicalizationReport,
    ) -> Result<(), BelGraphError> {
        for node in nodes_of(self.backend.raw_query(&GraphQuery::InvolvedUnset)?) {
            let update = self
                .involved_of(node.id)
                .map(|(genes, other)| NodeUpdate::involved(genes, other));
            match update.and_then(|update| self.backend.update_node(node.id, update)) {
                Ok(true) => report.involved_updated = report.involved_updated.saturating_add(1),
                Ok(false) => {}
                Err(error) => skip(report, &node, "involved", &error),
            }
        }
        Ok(())
    }

    /// Gene names and other constituent names of `start`, itself included.
    fn involved_of(
        &self,
        start: NodeId,
    ) -> Result<(BTreeSet<String>, BTreeSet<String>), BelGraphError> {
        let genes = self
            .descendants(start, &MOLECULE_TRAVERSAL)?
            .into_iter()
            .filter(|n| is_molecule(n.class))
            .filter_map(|n| n.name().map(str::to_string))
            .collect();
        let other = self
            .descendants(start, &OTHER_TRAVERSAL)?
            .into_iter()
            .filter(|n| !is_molecule(n.class))
            .filter_map(|n| n.name().map(str::to_string))
            .collect();
        Ok((genes, other))
    }

    /// Nodes reachable from `start` (itself included) through structural
    /// edges to the `follow` classes, up to [`MAX_STRUCTURAL_DEPTH`] levels.
    fn descendants(
        &self,
        start: NodeId,
        follow: &[FunctionClass],
    ) -> Result<Vec<Node>, BelGraphError> {
        let mut found = Vec::new();
        let mut visited = BTreeSet::from([start]);
        let mut frontier = vec![start];

        for _ in 0..=MAX_STRUCTURAL_DEPTH {
            let mut next = Vec::new();
            for id in frontier {
                let Some(node) = self.backend.node(id)? else {
                    continue;
                };
                for edge in self.backend.outgoing(id)? {
                    if let EdgeKind::Structural(class) = edge.kind
                        && follow.contains(&class)
                        && visited.insert(edge.to)
                    {
                        next.push(edge.to);
                    }
                }
                found.push(node);
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        Ok(found)
    }
}

fn nodes_of(rows: Vec<QueryRow>) -> impl Iterator<Item = Node> {
    rows.into_iter().filter_map(|row| match row {
        QueryRow::Node(node) => Some(node),
        QueryRow::Modified { .. } => None,
    })
}

fn skip(report: &mut CanonicalizationReport, node: &Node, phase: &str, error: &BelGraphError) {
    report.failures = report.failures.saturating_add(1);
    tracing::warn!(node = %node.id, bel = %node.bel, phase, %error, "canonicalization candidate skipped");
}

// =============================================================================
// TESTS
// =============================================================================
