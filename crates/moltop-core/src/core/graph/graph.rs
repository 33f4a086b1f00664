use super::container::EdgeContainer;
use super::edge::Edge;
use super::node::GraphNode;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A graph over integer vertex ids with a typed payload per vertex.
///
/// Connectivity and payload are kept separate: a vertex may appear in the
/// edge set without a node ("missing node"), and a node may sit on a vertex
/// with no edges ("isolated"). The canonical `id` is derived from node
/// content alone — the sorted multiset of node serializations — so it is
/// invariant under any renumbering of vertices and under edge changes.
/// Equality of graphs delegates entirely to the id; this content-only rule
/// is intentional, not an oversight.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edge_container: EdgeContainer,
    nodes: BTreeMap<usize, GraphNode>,
    id: String,
}

impl Graph {
    /// Builds a graph from edges and a vertex-to-node mapping, and computes
    /// its canonical id.
    pub fn new(edges: Vec<Edge>, nodes: BTreeMap<usize, GraphNode>) -> Self {
        let mut graph = Self {
            edge_container: EdgeContainer::new(edges),
            nodes,
            id: String::new(),
        };
        graph.recalculate_id();
        graph
    }

    fn recalculate_id(&mut self) {
        let mut tokens: Vec<&str> = self.nodes.values().map(GraphNode::id).collect();
        tokens.sort_unstable();
        self.id = tokens.concat();
    }

    /// Returns the canonical content-derived id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the node at `vertex`, if one is assigned.
    pub fn node(&self, vertex: usize) -> Option<&GraphNode> {
        self.nodes.get(&vertex)
    }

    /// Assigns (or replaces) the node at `vertex` and refreshes the
    /// canonical id.
    pub fn set_node(&mut self, vertex: usize, node: GraphNode) {
        self.nodes.insert(vertex, node);
        self.recalculate_id();
    }

    /// Iterates over all (vertex, node) pairs, in vertex order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &GraphNode)> {
        self.nodes.iter().map(|(vertex, node)| (*vertex, node))
    }

    /// Returns every (vertex, node) pair whose vertex has degree zero,
    /// including vertices that do not appear in the edge set at all.
    pub fn isolated_nodes(&self) -> Vec<(usize, &GraphNode)> {
        self.nodes()
            .filter(|(vertex, _)| self.degree(*vertex) == 0)
            .collect()
    }

    /// Returns vertices that appear in the edge set but carry no node — a
    /// data-integrity signal for incomplete construction.
    pub fn vertices_missing_nodes(&self) -> Vec<usize> {
        self.edge_container
            .vertices()
            .into_iter()
            .filter(|vertex| !self.nodes.contains_key(vertex))
            .collect()
    }

    /// Returns all vertices with degree three or greater.
    pub fn junctions(&self) -> Vec<usize> {
        self.edge_container
            .vertices()
            .into_iter()
            .filter(|&vertex| self.degree(vertex) >= 3)
            .collect()
    }

    /// Returns the (vertex, node) pairs adjacent to `vertex` that carry
    /// nodes.
    pub fn neighbor_nodes(&self, vertex: usize) -> Vec<(usize, &GraphNode)> {
        self.edge_container
            .neighbor_vertices(vertex)
            .into_iter()
            .filter_map(|neighbor| self.nodes.get(&neighbor).map(|node| (neighbor, node)))
            .collect()
    }

    /// Returns the vertices connected to `vertex` through an edge.
    pub fn neighbor_vertices(&self, vertex: usize) -> Vec<usize> {
        self.edge_container.neighbor_vertices(vertex)
    }

    /// Returns the edges incident to `vertex`.
    pub fn neighbor_edges(&self, vertex: usize) -> Vec<Edge> {
        self.edge_container.neighbor_edges(vertex)
    }

    /// Returns all vertices of the edge set.
    pub fn vertices(&self) -> Vec<usize> {
        self.edge_container.vertices()
    }

    /// Returns all edges of the graph.
    pub fn edges(&self) -> Vec<Edge> {
        self.edge_container.edges()
    }

    /// Returns the degree of `vertex`; zero for vertices outside the edge
    /// set.
    pub fn degree(&self, vertex: usize) -> usize {
        self.edge_container.degree(vertex)
    }

    /// Returns the largest vertex degree in the graph.
    pub fn max_degree(&self) -> usize {
        self.edge_container.max_degree()
    }

    /// Returns all vertices with exactly the given degree.
    pub fn vertices_with_degree(&self, degree: usize) -> Vec<usize> {
        self.edge_container.vertices_with_degree(degree)
    }

    /// Returns whether `vertex` appears in the edge set.
    pub fn vertex_exists(&self, vertex: usize) -> bool {
        self.edge_container.vertex_exists(vertex)
    }

    /// Returns whether `edge` is stored in the graph.
    pub fn edge_exists(&self, edge: Edge) -> bool {
        self.edge_container.edge_exists(edge)
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Graph {}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph {}", self.id)?;
        for (vertex, node) in self.nodes() {
            writeln!(f, "  {vertex}: {node}")?;
        }
        Ok(())
    }
}

/// A strict ordering over (vertex, node) pairs that considers node content
/// only, never the vertex id. Useful to enumerate pairs deterministically
/// regardless of how vertices happen to be numbered.
pub fn cmp_vert_node_pair(a: &(usize, GraphNode), b: &(usize, GraphNode)) -> Ordering {
    a.1.id().cmp(b.1.id())
}
