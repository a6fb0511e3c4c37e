use std::collections::{BTreeMap, HashMap, VecDeque};
use std::mem;
use std::ops::Deref;
use std::rc::Rc;

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use unordered_pair::UnorderedPair;

use crate::graph::{GraphError, Vertex, VertexSet};

/// An undirected simple graph: no self-loops, no parallel edges.
///
/// Every query accepting a `mask` only walks the masked vertices and the edges between them.
/// The graph itself is never touched by a masked query, which is how the search explores sub-problems without copying.
#[derive(Clone, Debug)]
pub struct SimpleGraph {
    edges: UnGraphMap<Vertex, ()>,
}

impl Default for SimpleGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self { edges: UnGraphMap::new() }
    }

    /// Build a graph from adjacency sets, one per vertex.
    ///
    /// Vertices with no neighbors must still be listed (with an empty set).
    /// Every adjacency must be listed from both sides.
    pub fn from_adjacency<I, A>(sets: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (Vertex, A)>,
        A: IntoIterator<Item = Vertex>,
    {
        let sets: BTreeMap<Vertex, VertexSet> = sets.into_iter()
            .map(|(v, adj)| (v, adj.into_iter().collect()))
            .collect();

        let mut graph = Self::new();
        for v in sets.keys() {
            graph.edges.add_node(*v);
        }

        for (v, adj) in &sets {
            for u in adj {
                if u == v {
                    return Err(GraphError::SelfLoop(*v));
                }
                match sets.get(u) {
                    None => return Err(GraphError::UnknownVertex(*u)),
                    Some(back) if !back.contains(v) => return Err(GraphError::Asymmetric(*v, *u)),
                    Some(_) => if v < u {
                        graph.edges.add_edge(*v, *u, ());
                    },
                }
            }
        }

        Ok(graph)
    }

    /// Wrap this graph in a shared, read-only handle.
    pub fn into_shared(self) -> SharedGraph {
        SharedGraph(Rc::new(self))
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.edges.nodes()
    }

    pub fn vertex_set(&self) -> VertexSet {
        self.edges.nodes().collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.edges.node_count()
    }

    pub fn contains_vertex(&self, v: Vertex) -> bool {
        self.edges.contains_node(v)
    }

    pub fn edges(&self) -> impl Iterator<Item = UnorderedPair<Vertex>> + '_ {
        self.edges.all_edges().map(|(v1, v2, _)| UnorderedPair(v1, v2))
    }

    /// Number of adjacent vertex pairs among `mask` (all vertices if `None`), ignoring any vertex in `without`.
    pub fn edge_count(&self, mask: Option<&VertexSet>, without: Option<&VertexSet>) -> usize {
        let without = without.filter(|w| !w.is_empty());
        if mask.is_none() && without.is_none() {
            return self.edges.edge_count();
        }

        let mut vertices = self.mask_vertices(mask);
        if let Some(without) = without {
            vertices.retain(|v| !without.contains(v));
        }

        let half_edges: usize = vertices.iter()
            .map(|v| self.neighbors(*v).filter(|u| vertices.contains(u)).count())
            .sum();
        half_edges / 2
    }

    /// Whether `v1` and `v2` share an edge.
    pub fn adjacent(&self, v1: Vertex, v2: Vertex) -> bool {
        self.edges.contains_edge(v1, v2)
    }

    /// Every neighbor of `v`, ignoring masks.
    pub fn neighbors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.edges.neighbors(v)
    }

    /// The neighbors of `v`, never including `v`, restricted to `mask` if given.
    pub fn adjacencies(&self, v: Vertex, mask: Option<&VertexSet>) -> VertexSet {
        match mask {
            None => self.edges.neighbors(v).collect(),
            Some(mask) => self.edges.neighbors(v).filter(|u| mask.contains(u)).collect(),
        }
    }

    pub fn degree(&self, v: Vertex) -> usize {
        self.edges.neighbors(v).count()
    }

    /// Number of edges between `v` and the most distant vertex reachable through `mask`.
    pub fn eccentricity(&self, v: Vertex, mask: Option<&VertexSet>) -> usize {
        let vertices = self.mask_vertices(mask);
        let mut visited = VertexSet::new();
        let mut front = VertexSet::from([v]);
        let mut rounds = 0;
        while !front.is_empty() {
            let next_front: VertexSet = front.iter()
                .flat_map(|fv| self.neighbors(*fv))
                .collect();
            visited.extend(front.iter().copied());
            front = next_front.into_iter()
                .filter(|u| vertices.contains(u) && !visited.contains(u))
                .collect();
            if !front.is_empty() {
                rounds += 1;
            }
        }
        rounds
    }

    /// Sum of the distances from `v` to every vertex reachable through `mask`.
    pub fn hyper_eccentricity(&self, v: Vertex, mask: Option<&VertexSet>) -> usize {
        self.distance_sum(v, None, mask)
    }

    /// Sum of the distances from `v` to each of `targets` reachable through `mask`; unreachable targets count for nothing.
    pub fn hyper_distance(&self, v: Vertex, targets: &VertexSet, mask: Option<&VertexSet>) -> usize {
        self.distance_sum(v, Some(targets), mask)
    }

    fn distance_sum(&self, v: Vertex, targets: Option<&VertexSet>, mask: Option<&VertexSet>) -> usize {
        let vertices = self.mask_vertices(mask);
        let mut remaining = targets.cloned();
        let mut visited = VertexSet::new();
        let mut front = VertexSet::from([v]);
        let mut sum = 0;
        let mut rounds = 0;
        while !front.is_empty() {
            match remaining.as_mut() {
                Some(remaining) => {
                    if remaining.is_empty() {
                        break;
                    }
                    let hits = front.iter().filter(|fv| remaining.remove(*fv)).count();
                    sum += rounds * hits;
                }
                None => sum += rounds * front.len(),
            }
            let next_front: VertexSet = front.iter()
                .flat_map(|fv| self.neighbors(*fv))
                .collect();
            visited.extend(front.iter().copied());
            front = next_front.into_iter()
                .filter(|u| vertices.contains(u) && !visited.contains(u))
                .collect();
            rounds += 1;
        }
        sum
    }

    /// Return `vertices` ordered by increasing distance from `target`, breadth first.
    ///
    /// Vertices unreachable through `mask` are omitted.
    /// `target` itself comes first if it is listed.
    pub fn sort_closest(&self, vertices: &[Vertex], target: Vertex, mask: Option<&VertexSet>) -> Vec<Vertex> {
        let mut to_visit = self.mask_vertices(mask);
        to_visit.remove(&target);
        let mut wanted: VertexSet = vertices.iter().copied().collect();
        let mut ordered = Vec::with_capacity(wanted.len());
        if wanted.remove(&target) {
            ordered.push(target);
        }

        let mut bfs = VecDeque::from([target]);
        while !wanted.is_empty() {
            let Some(v) = bfs.pop_front() else { break };
            let ext = self.adjacencies(v, Some(&to_visit));
            for u in ext {
                to_visit.remove(&u);
                if wanted.remove(&u) {
                    ordered.push(u);
                }
                bfs.push_back(u);
            }
        }

        ordered
    }

    /// Whether some path joins `v1` to `v2` through `mask`.
    ///
    /// Panics if `v1 == v2`.
    pub fn connected(&self, v1: Vertex, v2: Vertex, mask: Option<&VertexSet>) -> bool {
        assert_ne!(v1, v2, "connectivity of a vertex to itself is not meaningful");
        if self.adjacent(v1, v2) {
            return true;
        }

        let mut to_visit = self.mask_vertices(mask);
        let mut front1 = VertexSet::from([v1]);
        let mut front2 = VertexSet::from([v2]);
        while !front1.is_empty() {
            to_visit.retain(|v| !front1.contains(v));
            front1 = front1.iter()
                .flat_map(|v| self.adjacencies(*v, Some(&to_visit)))
                .collect();
            if !front1.is_disjoint(&front2) {
                return true;
            }
            mem::swap(&mut front1, &mut front2);
        }
        false
    }

    /// A minimal list of vertices joining `v1` to `v2` through `mask`, starting at `v1` and ending at `v2`.
    ///
    /// Both ends are searched from at once, alternating one level at a time until the two trees meet.
    /// Empty if no such path exists.
    pub fn shortest_path(&self, v1: Vertex, v2: Vertex, mask: Option<&VertexSet>) -> Vec<Vertex> {
        if v1 == v2 {
            return vec![v1];
        } else if self.adjacent(v1, v2) {
            return vec![v1, v2];
        }

        let mut mask_a = self.mask_vertices(mask);
        mask_a.remove(&v1);
        mask_a.remove(&v2);
        let mut mask_b = mask_a.clone();
        // vertex -> parent toward the root of its own search tree
        let mut trees: HashMap<Vertex, Option<Vertex>> = HashMap::from([(v1, None), (v2, None)]);
        let mut leafs_a = VertexSet::from([v1]);
        let mut leafs_b = VertexSet::from([v2]);
        let mut join = None;

        while !mask_a.is_empty() && join.is_none() {
            let mut leafs = VertexSet::new();
            'expand: while let Some(v) = leafs_a.pop_first() {
                let ext = self.adjacencies(v, Some(&mask_a));
                mask_a.retain(|u| !ext.contains(u));
                leafs.extend(ext.iter().copied());
                for v_ext in ext {
                    if leafs_b.contains(&v_ext) {
                        join = Some((v_ext, v));
                        break 'expand;
                    }
                    trees.insert(v_ext, Some(v));
                }
            }
            if leafs.is_empty() {
                break;
            }
            leafs_a = mem::replace(&mut leafs_b, leafs);
            mem::swap(&mut mask_a, &mut mask_b);
        }

        let Some((far, near)) = join else {
            return Vec::new();
        };

        let climb = |start: Vertex| {
            let mut path = vec![start];
            while let Some(Some(parent)) = path.last().and_then(|v| trees.get(v)) {
                path.push(*parent);
            }
            path
        };
        let mut path1 = climb(far);
        let mut path2 = climb(near);
        if path1.last() == Some(&v2) {
            mem::swap(&mut path1, &mut path2);
        }
        path1.reverse();
        path1.extend(path2);
        path1
    }

    /// Whether every pair drawn from `vertices` is connected through `mask`.
    pub fn is_connected_set(&self, vertices: &VertexSet, mask: Option<&VertexSet>) -> bool {
        match vertices.len() {
            0 | 1 => return true,
            2 => {
                let (a, b) = vertices.iter().copied().collect_tuple().unwrap_or_default();
                return self.connected(a, b, mask);
            }
            _ => {}
        }

        let mut to_visit = self.mask_vertices(mask);
        to_visit.extend(vertices.iter().copied());
        let mut wanted = vertices.clone();
        let Some(first) = wanted.pop_first() else { return true };
        to_visit.remove(&first);
        let mut stack = vec![first];
        while let Some(v) = stack.pop() {
            for u in self.adjacencies(v, Some(&to_visit)) {
                to_visit.remove(&u);
                wanted.remove(&u);
                if wanted.is_empty() {
                    return true;
                }
                stack.push(u);
            }
        }
        false
    }

    /// Whether removing `v` divides the component of `v` within `mask`.
    pub fn is_separator(&self, v: Vertex, mask: Option<&VertexSet>) -> bool {
        let mut mask = self.mask_vertices(mask);
        let links = self.adjacencies(v, Some(&mask));
        if links.len() < 2 {
            return false;
        }
        mask.remove(&v);
        !self.is_connected_set(&links, Some(&mask))
    }

    /// The biconnected components of the graph restricted to `mask`, and its articulation points.
    ///
    /// Lowpoints are computed by an iterative depth-first search, so deep or degenerate grids cannot overflow the call stack.
    /// A vertex with no neighbors in `mask` forms a component by itself.
    pub fn biconnected_components(&self, mask: Option<&VertexSet>) -> (Vec<VertexSet>, VertexSet) {
        let vertices = self.mask_vertices(mask);
        let mut subtrees: HashMap<Vertex, VertexSet> = vertices.iter()
            .map(|v| (*v, VertexSet::from([*v])))
            .collect();
        let mut pending: HashMap<Vertex, Vec<Vertex>> = vertices.iter()
            .map(|v| (*v, self.neighbors(*v).filter(|u| vertices.contains(u)).collect_vec()))
            .collect();
        let mut components = Vec::new();
        let mut separators = VertexSet::new();
        let mut to_visit = vertices.clone();

        while let Some(root) = to_visit.pop_first() {
            let mut stack = vec![root];
            let mut depth = HashMap::from([(root, 0usize)]);
            let mut lowpoint = HashMap::from([(root, 0usize)]);
            let mut v_child: Option<Vertex> = None;

            while let Some(&v) = stack.last() {
                let mut v_next = None;
                if let Some(adj) = pending.get_mut(&v) {
                    while let Some(u) = adj.pop() {
                        if to_visit.contains(&u) {
                            v_next = Some(u);
                            break;
                        }
                    }
                }

                match v_next {
                    None => {
                        stack.pop();
                        let v_parent = stack.last().copied();
                        let mut low = lowpoint[&v];
                        for v_adj in self.neighbors(v).filter(|u| vertices.contains(u)) {
                            if Some(v_adj) != v_parent {
                                low = low.min(depth[&v_adj]);
                            }
                        }
                        lowpoint.insert(v, low);
                    }
                    Some(u) => {
                        depth.insert(u, stack.len());
                        lowpoint.insert(u, stack.len());
                        to_visit.remove(&u);
                        stack.push(u);
                    }
                }

                if let Some(child) = v_child {
                    let child_low = lowpoint[&child];
                    lowpoint.insert(v, lowpoint[&v].min(child_low));
                    let subtree = subtrees.remove(&child).unwrap_or_default();
                    // the root only separates when it still has another child to descend into
                    if !stack.is_empty() && child_low >= depth[&v] {
                        separators.insert(v);
                        let mut component = subtree;
                        component.insert(v);
                        components.push(component);
                    } else if let Some(own) = subtrees.get_mut(&v) {
                        own.extend(subtree);
                    }
                }

                v_child = if v_next.is_none() { Some(v) } else { None };
            }

            if let Some(rest) = subtrees.remove(&root) {
                components.push(rest);
            }
        }

        debug_assert!(subtrees.is_empty());
        (components, separators)
    }

    /// The vertices joined to `v` by some path through `mask`, including `v`.
    pub fn connected_component(&self, v: Vertex, mask: Option<&VertexSet>) -> VertexSet {
        let mut to_visit = self.mask_vertices(mask);
        to_visit.remove(&v);
        let mut component = VertexSet::from([v]);
        let mut stack = vec![v];
        while let Some(v) = stack.pop() {
            let ext = self.adjacencies(v, Some(&to_visit));
            for u in ext {
                to_visit.remove(&u);
                component.insert(u);
                stack.push(u);
            }
        }
        component
    }

    /// Partition `mask` into its connected components.
    pub fn disjoint_partitions(&self, mask: Option<&VertexSet>) -> Vec<VertexSet> {
        let mut to_visit = self.mask_vertices(mask);
        let mut partitions = Vec::new();
        while let Some(v) = to_visit.pop_first() {
            let partition = self.connected_component(v, Some(&to_visit));
            to_visit.retain(|u| !partition.contains(u));
            partitions.push(partition);
        }
        partitions
    }

    /// Allocate a fresh vertex id one above the current maximum (0 for an empty graph).
    pub fn push_vertex(&mut self) -> Vertex {
        let v = self.edges.nodes().max().map_or(0, |max| max + 1);
        self.edges.add_node(v);
        v
    }

    pub fn add_vertex(&mut self, v: Vertex) -> Result<(), GraphError> {
        if self.edges.contains_node(v) {
            return Err(GraphError::DuplicateVertex(v));
        }
        self.edges.add_node(v);
        Ok(())
    }

    pub fn add_vertices(&mut self, vertices: impl IntoIterator<Item = Vertex>) -> Result<(), GraphError> {
        vertices.into_iter().try_for_each(|v| self.add_vertex(v))
    }

    /// Delete `v` and its incident edges.
    pub fn remove_vertex(&mut self, v: Vertex) -> Result<(), GraphError> {
        match self.edges.remove_node(v) {
            true => Ok(()),
            false => Err(GraphError::UnknownVertex(v)),
        }
    }

    pub fn remove_vertices(&mut self, vertices: impl IntoIterator<Item = Vertex>) -> Result<(), GraphError> {
        vertices.into_iter().try_for_each(|v| self.remove_vertex(v))
    }

    /// Connect `v1` and `v2`, both of which must already exist and not be adjacent.
    pub fn add_edge(&mut self, v1: Vertex, v2: Vertex) -> Result<(), GraphError> {
        if v1 == v2 {
            return Err(GraphError::SelfLoop(v1));
        }
        for v in [v1, v2] {
            if !self.edges.contains_node(v) {
                return Err(GraphError::UnknownVertex(v));
            }
        }
        if self.edges.contains_edge(v1, v2) {
            return Err(GraphError::DuplicateEdge(v1, v2));
        }
        self.edges.add_edge(v1, v2, ());
        Ok(())
    }

    pub fn remove_edge(&mut self, v1: Vertex, v2: Vertex) -> Result<(), GraphError> {
        match self.edges.remove_edge(v1, v2) {
            Some(()) => Ok(()),
            None => Err(GraphError::MissingEdge(v1, v2)),
        }
    }

    /// A new set holding the graph's vertices, or a copy of `mask`.
    fn mask_vertices(&self, mask: Option<&VertexSet>) -> VertexSet {
        match mask {
            None => self.vertex_set(),
            Some(mask) => mask.clone(),
        }
    }
}

/// A read-only, cheaply cloned handle onto a [`SimpleGraph`].
///
/// It dereferences to every query of the graph but offers no way to mutate it,
/// which is how the search layer holds the puzzle graph.
#[derive(Clone, Debug)]
pub struct SharedGraph(Rc<SimpleGraph>);

impl Deref for SharedGraph {
    type Target = SimpleGraph;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<SimpleGraph> for SharedGraph {
    fn from(value: SimpleGraph) -> Self {
        value.into_shared()
    }
}
