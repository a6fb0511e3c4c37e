use std::collections::BTreeMap;

use crate::graph::{GraphError, SharedGraph, Vertex, VertexSet};

/// Index of a color, i.e. the position of its endpoint pair in [`Puzzle::endpoints`].
pub type Color = usize;

/// Reasons a [`Puzzle`] may be rejected on construction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PuzzleError {
    /// An endpoint or exclusive set member is not a vertex of the graph.
    #[error("vertex {0} is not part of the puzzle graph")]
    UnknownVertex(Vertex),
    /// Both endpoints of a color are the same vertex.
    #[error("both endpoints of a color are vertex {0}")]
    DegeneratePair(Vertex),
    /// A vertex is an endpoint more than once.
    #[error("vertex {0} is an endpoint of more than one color")]
    SharedEndpoint(Vertex),
    /// An exclusive set, given by index, has fewer than two members.
    #[error("exclusive set {0} has fewer than two members")]
    UndersizedExclusiveSet(usize),
    /// A vertex is in two exclusive sets.
    #[error("vertex {0} is in more than one exclusive set")]
    OverlappingExclusiveSets(Vertex),
    /// An endpoint is in an exclusive set.
    #[error("endpoint {0} cannot be in an exclusive set")]
    ExcludedEndpoint(Vertex),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A graph to be covered, the endpoint pair of each color, and sets of vertices no single color may use more than one of.
///
/// The exclusive sets are how bridges are expressed: the two lanes of a bridge cell are distinct vertices,
/// but a flow passing straight through one lane may not come back through the other.
#[derive(Clone, Debug)]
pub struct Puzzle {
    graph: SharedGraph,
    endpoints: Vec<(Vertex, Vertex)>,
    exclusive_sets: Vec<VertexSet>,
    exclusive_of: BTreeMap<Vertex, usize>,
}

impl Puzzle {
    pub fn new(graph: SharedGraph, endpoints: Vec<(Vertex, Vertex)>, exclusive_sets: Vec<VertexSet>) -> Result<Self, PuzzleError> {
        let mut seen_endpoints = VertexSet::new();
        for (v1, v2) in &endpoints {
            for v in [*v1, *v2] {
                if !graph.contains_vertex(v) {
                    return Err(PuzzleError::UnknownVertex(v));
                }
            }
            if v1 == v2 {
                return Err(PuzzleError::DegeneratePair(*v1));
            }
            for v in [*v1, *v2] {
                if !seen_endpoints.insert(v) {
                    return Err(PuzzleError::SharedEndpoint(v));
                }
            }
        }

        let mut exclusive_of = BTreeMap::new();
        for (i, set) in exclusive_sets.iter().enumerate() {
            if set.len() < 2 {
                return Err(PuzzleError::UndersizedExclusiveSet(i));
            }
            for v in set {
                if !graph.contains_vertex(*v) {
                    return Err(PuzzleError::UnknownVertex(*v));
                }
                if seen_endpoints.contains(v) {
                    return Err(PuzzleError::ExcludedEndpoint(*v));
                }
                if exclusive_of.insert(*v, i).is_some() {
                    return Err(PuzzleError::OverlappingExclusiveSets(*v));
                }
            }
        }

        Ok(Self { graph, endpoints, exclusive_sets, exclusive_of })
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// The endpoint pair of every color, in color order.
    pub fn endpoints(&self) -> &[(Vertex, Vertex)] {
        &self.endpoints
    }

    pub fn color_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn exclusive_sets(&self) -> &[VertexSet] {
        &self.exclusive_sets
    }

    /// The other members of the exclusive set holding `v`; empty if `v` is in none.
    pub fn exclusions(&self, v: Vertex) -> VertexSet {
        match self.exclusive_of.get(&v) {
            Some(i) => self.exclusive_sets[*i].iter().copied().filter(|u| *u != v).collect(),
            None => VertexSet::new(),
        }
    }

    /// Vertices that are not endpoints, i.e. those a solution must route some flow through.
    pub fn inner_vertices(&self) -> VertexSet {
        let mut vertices = self.graph.vertex_set();
        for (v1, v2) in &self.endpoints {
            vertices.remove(v1);
            vertices.remove(v2);
        }
        vertices
    }
}
