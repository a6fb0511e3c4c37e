//! Undirected simple graphs over integer vertex ids.
//!
//! [`SimpleGraph`] answers connectivity questions from scratch, optionally restricted to a vertex mask.
//! [`OnlineReducedGraph`] keeps the same answers current while vertices are masked out one at a time,
//! sharing its maps between snapshots so that search branches can diverge cheaply.

use std::collections::BTreeSet;

pub use forest::Forest;
pub use reduced::{BlockForest, MaskDelta, OnlineReducedGraph};
pub use simple::{SharedGraph, SimpleGraph};

pub mod forest;
pub mod reduced;
pub mod simple;

/// Opaque vertex id.
pub type Vertex = u32;
/// Ordered set of vertices; ordering keeps every traversal deterministic.
pub type VertexSet = BTreeSet<Vertex>;
/// Key of a connected or biconnected component tracked by an [`OnlineReducedGraph`].
pub type ComponentKey = u32;
/// Ordered set of component keys.
pub type KeySet = BTreeSet<ComponentKey>;

/// Reasons a graph mutation or construction may be rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The vertex is already present.
    #[error("vertex {0} already exists")]
    DuplicateVertex(Vertex),
    /// The vertex is not part of the graph.
    #[error("vertex {0} is not part of the graph")]
    UnknownVertex(Vertex),
    /// An edge would join a vertex to itself.
    #[error("vertex {0} cannot be adjacent to itself")]
    SelfLoop(Vertex),
    /// The two vertices are already adjacent.
    #[error("vertices {0} and {1} are already adjacent")]
    DuplicateEdge(Vertex, Vertex),
    /// The two vertices are not adjacent.
    #[error("vertices {0} and {1} are not adjacent")]
    MissingEdge(Vertex, Vertex),
    /// An adjacency listing names `{1}` as a neighbor of `{0}` but not the other way around.
    #[error("vertex {1} is listed next to {0} but not vice versa")]
    Asymmetric(Vertex, Vertex),
}
