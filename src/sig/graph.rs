//! Interpretation graph of one system.
//!
//! Thin wrapper over a `petgraph` stable graph: vertex removal keeps the other
//! indices valid, which the head pruning relies on. Iteration order over
//! relations is made explicit (sorted by index) so that results never depend
//! on the adjacency list layout.

use petgraph::algo::maximal_cliques;
use petgraph::graph::UnGraph;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use super::inter::{Inter, InterClass};
use super::relation::{ExclusionCause, Relation, RelationKind};

pub type InterId = NodeIndex;
pub type RelationId = EdgeIndex;

#[derive(Clone, Debug, Default)]
pub struct Sig {
    graph: StableDiGraph<Inter, Relation>,
}

/// Serializable view of a graph, vertices and edges in index order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigSnapshot {
    pub vertices: Vec<VertexEntry>,
    pub edges: Vec<EdgeEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VertexEntry {
    pub id: usize,
    pub inter: Inter,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeEntry {
    pub source: usize,
    pub target: usize,
    pub relation: Relation,
}

impl Sig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, inter: Inter) -> InterId {
        self.graph.add_node(inter)
    }

    /// Removes a vertex with all its relations.
    pub fn remove_vertex(&mut self, id: InterId) -> Option<Inter> {
        self.graph.remove_node(id)
    }

    pub fn contains(&self, id: InterId) -> bool {
        self.graph.contains_node(id)
    }

    pub fn inter(&self, id: InterId) -> Option<&Inter> {
        self.graph.node_weight(id)
    }

    pub fn inter_mut(&mut self, id: InterId) -> Option<&mut Inter> {
        self.graph.node_weight_mut(id)
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertices of `class`, in index order.
    pub fn inters(&self, class: InterClass) -> Vec<InterId> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph[n].class() == class)
            .collect()
    }

    pub fn add_edge(&mut self, source: InterId, target: InterId, relation: Relation) -> RelationId {
        self.graph.add_edge(source, target, relation)
    }

    pub fn remove_edge(&mut self, id: RelationId) -> Option<Relation> {
        self.graph.remove_edge(id)
    }

    pub fn edge(&self, id: RelationId) -> Option<&Relation> {
        self.graph.edge_weight(id)
    }

    pub fn source(&self, id: RelationId) -> Option<InterId> {
        self.graph.edge_endpoints(id).map(|(s, _)| s)
    }

    /// Vertex at the other end of `id` as seen from `from`.
    pub fn opposite(&self, id: RelationId, from: InterId) -> Option<InterId> {
        let (s, t) = self.graph.edge_endpoints(id)?;
        if s == from {
            Some(t)
        } else if t == from {
            Some(s)
        } else {
            None
        }
    }

    /// Relation of `kind` from `source` to `target`. Exclusions are symmetric
    /// and found in either direction.
    pub fn relation(
        &self,
        source: InterId,
        target: InterId,
        kind: RelationKind,
    ) -> Option<RelationId> {
        let direct = self
            .graph
            .edges_directed(source, Direction::Outgoing)
            .filter(|e| e.target() == target && e.weight().kind() == kind)
            .map(|e| e.id())
            .min();
        if direct.is_some() || kind != RelationKind::Exclusion {
            return direct;
        }
        self.graph
            .edges_directed(target, Direction::Outgoing)
            .filter(|e| e.target() == source && e.weight().kind() == kind)
            .map(|e| e.id())
            .min()
    }

    /// All relations of `kind` touching `id`, in index order.
    pub fn relations(&self, id: InterId, kind: RelationKind) -> Vec<RelationId> {
        let mut found: Vec<RelationId> = self
            .graph
            .edges_directed(id, Direction::Outgoing)
            .chain(self.graph.edges_directed(id, Direction::Incoming))
            .filter(|e| e.weight().kind() == kind)
            .map(|e| e.id())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    pub fn has_relation(&self, id: InterId, kind: RelationKind) -> bool {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .chain(self.graph.edges_directed(id, Direction::Incoming))
            .any(|e| e.weight().kind() == kind)
    }

    /// Records that `a` and `b` cannot coexist. Idempotent; the edge always
    /// runs from the lower to the higher index.
    pub fn insert_exclusion(
        &mut self,
        a: InterId,
        b: InterId,
        cause: ExclusionCause,
    ) -> Option<RelationId> {
        if a == b || !self.contains(a) || !self.contains(b) {
            return None;
        }
        if let Some(existing) = self.relation(a, b, RelationKind::Exclusion) {
            return Some(existing);
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        Some(self.graph.add_edge(lo, hi, Relation::Exclusion { cause }))
    }

    pub fn are_exclusive(&self, a: InterId, b: InterId) -> bool {
        self.relation(a, b, RelationKind::Exclusion).is_some()
    }

    /// Maximal subsets of `list` with no exclusion inside, each in `list`
    /// order. Subsets are sorted by the positions of their members.
    pub fn partitions(&self, list: &[InterId]) -> Vec<Vec<InterId>> {
        if list.is_empty() {
            return Vec::new();
        }
        let mut compatible = UnGraph::<usize, ()>::with_capacity(list.len(), 0);
        let nodes: Vec<_> = (0..list.len()).map(|i| compatible.add_node(i)).collect();
        for (i, &a) in list.iter().enumerate() {
            for (j, &b) in list.iter().enumerate().skip(i + 1) {
                if !self.are_exclusive(a, b) {
                    compatible.add_edge(nodes[i], nodes[j], ());
                }
            }
        }

        let mut cliques: Vec<Vec<usize>> = maximal_cliques(&compatible)
            .into_iter()
            .map(|clique| {
                let mut members: Vec<usize> = clique.into_iter().map(|n| compatible[n]).collect();
                members.sort_unstable();
                members
            })
            .filter(|members| !members.is_empty())
            .collect();
        cliques.sort();
        cliques
            .into_iter()
            .map(|members| members.into_iter().map(|i| list[i]).collect())
            .collect()
    }

    pub fn snapshot(&self) -> SigSnapshot {
        let vertices = self
            .graph
            .node_indices()
            .map(|n| VertexEntry {
                id: n.index(),
                inter: self.graph[n].clone(),
            })
            .collect();
        let mut edges: Vec<(EdgeIndex, EdgeEntry)> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (s, t) = self.graph.edge_endpoints(e)?;
                Some((
                    e,
                    EdgeEntry {
                        source: s.index(),
                        target: t.index(),
                        relation: self.graph[e].clone(),
                    },
                ))
            })
            .collect();
        edges.sort_by_key(|(e, _)| *e);
        SigSnapshot {
            vertices,
            edges: edges.into_iter().map(|(_, entry)| entry).collect(),
        }
    }
}
