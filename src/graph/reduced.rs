use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::graph::{ComponentKey, KeySet, SharedGraph, SimpleGraph, Vertex, VertexSet};

/// Hands out component keys, shared by every snapshot of one reduced graph so keys never collide across branches.
#[derive(Debug)]
struct KeySource(Cell<ComponentKey>);

impl Default for KeySource {
    fn default() -> Self {
        Self(Cell::new(1))
    }
}

impl KeySource {
    fn next(&self) -> ComponentKey {
        let key = self.0.get();
        self.0.set(key + 1);
        key
    }
}

/// What the most recent [`OnlineReducedGraph::mask_vertex`] did to the connected components.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MaskDelta {
    /// Component that ceased to exist, either emptied or split.
    pub component_deleted: Option<ComponentKey>,
    /// Component that lost the masked vertex but kept its key.
    pub component_reduced: Option<ComponentKey>,
    /// Components created by a split, if the masked vertex was a separator.
    pub new_sub_components: Option<KeySet>,
    pub separators_changed: bool,
}

/// The block-cut forest of a reduced graph.
#[derive(Clone, Debug)]
pub struct BlockForest {
    pub graph: SimpleGraph,
    /// Open vertex -> forest node. Separators map to their own node, everything else to the node of its block.
    pub vertex_map: BTreeMap<Vertex, Vertex>,
    /// Forest nodes standing for separators.
    pub articulations: VertexSet,
}

/// A graph whose vertices are masked out one at a time, keeping its connected components,
/// biconnected components and separators current after each step.
///
/// Cloning (or [`copy`](Self::copy)) is cheap: every map is reference counted and is only
/// duplicated by the first mask operation that needs to change it.
#[derive(Clone, Debug)]
pub struct OnlineReducedGraph {
    graph: SharedGraph,
    keys: Rc<KeySource>,
    vertices: Rc<VertexSet>,
    components: Rc<BTreeMap<ComponentKey, Rc<VertexSet>>>,
    bicon_components: Rc<BTreeMap<ComponentKey, Rc<VertexSet>>>,
    separators: Rc<VertexSet>,
    bicon_component_map: Rc<BTreeMap<Vertex, Rc<KeySet>>>,
    separator_map: Rc<BTreeMap<ComponentKey, Rc<VertexSet>>>,
    delta: MaskDelta,
}

impl OnlineReducedGraph {
    /// Track every vertex of `graph`.
    pub fn new(graph: SharedGraph) -> Self {
        let vertices = graph.vertex_set();
        Self::with_vertices(graph, vertices)
    }

    /// Track only `vertices`, as if everything else had already been masked.
    pub fn with_vertices(graph: SharedGraph, vertices: VertexSet) -> Self {
        let keys = Rc::new(KeySource::default());

        let components = graph.disjoint_partitions(Some(&vertices)).into_iter()
            .map(|c| (keys.next(), Rc::new(c)))
            .collect();

        let (bcs, separators) = graph.biconnected_components(Some(&vertices));
        let mut bicon_component_map: BTreeMap<Vertex, KeySet> = vertices.iter()
            .map(|v| (*v, KeySet::new()))
            .collect();
        let mut bicon_components = BTreeMap::new();
        let mut separator_map = BTreeMap::new();
        for bc in bcs {
            let k = keys.next();
            for v in &bc {
                if let Some(ks) = bicon_component_map.get_mut(v) {
                    ks.insert(k);
                }
            }
            separator_map.insert(k, Rc::new(&bc & &separators));
            bicon_components.insert(k, Rc::new(bc));
        }

        Self {
            graph,
            keys,
            vertices: Rc::new(vertices),
            components: Rc::new(components),
            bicon_components: Rc::new(bicon_components),
            separators: Rc::new(separators),
            bicon_component_map: Rc::new(bicon_component_map.into_iter().map(|(v, ks)| (v, Rc::new(ks))).collect()),
            separator_map: Rc::new(separator_map),
            delta: MaskDelta::default(),
        }
    }

    /// A snapshot sharing all state with `self`, with a clean delta.
    pub fn copy(&self) -> Self {
        Self {
            delta: MaskDelta::default(),
            ..self.clone()
        }
    }

    /// Remove `v` from the open set and repair every structure that contained it.
    ///
    /// Panics if `v` is not open.
    pub fn mask_vertex(&mut self, v: Vertex) {
        assert!(Rc::make_mut(&mut self.vertices).remove(&v), "vertex {v} is not open");
        self.delta = MaskDelta::default();

        let c_k = self.component_of(v).expect("every open vertex lies in a component");
        let components = Rc::make_mut(&mut self.components);
        let c = Rc::clone(&components[&c_k]);
        if c.len() == 1 {
            self.delta.component_deleted = Some(c_k);
            components.remove(&c_k);
        } else {
            let mut c = VertexSet::clone(&c);
            c.remove(&v);
            if self.separators.contains(&v) {
                self.delta.component_deleted = Some(c_k);
                components.remove(&c_k);
                let mut new_keys = KeySet::new();
                for part in self.graph.disjoint_partitions(Some(&c)) {
                    let k = self.keys.next();
                    components.insert(k, Rc::new(part));
                    new_keys.insert(k);
                }
                self.delta.new_sub_components = Some(new_keys);
            } else {
                self.delta.component_reduced = Some(c_k);
                components.insert(c_k, Rc::new(c));
            }
        }

        let bicon_component_map = Rc::make_mut(&mut self.bicon_component_map);
        let bicon_components = Rc::make_mut(&mut self.bicon_components);
        let separator_map = Rc::make_mut(&mut self.separator_map);
        let mut pending = KeySet::clone(&bicon_component_map.remove(&v).expect("every open vertex lies in a block"));

        if self.delta.component_deleted.is_some() && self.delta.new_sub_components.is_none() {
            // isolated vertex: its block is itself
            if let Some(bc_k) = pending.pop_first() {
                bicon_components.remove(&bc_k);
                separator_map.remove(&bc_k);
            }
            return;
        }

        let mut separators = VertexSet::clone(&self.separators);
        separators.remove(&v);
        while let Some(bc_k) = pending.pop_first() {
            let mut reduced = VertexSet::clone(&bicon_components[&bc_k]);
            reduced.remove(&v);

            if let (1, Some(&other)) = (reduced.len(), reduced.first()) {
                let other_keys = &bicon_component_map[&other];
                if other_keys.len() > 1 {
                    // what is left is already part of another block
                    let mut other_keys = KeySet::clone(other_keys);
                    other_keys.remove(&bc_k);
                    bicon_components.remove(&bc_k);
                    separator_map.remove(&bc_k);
                    if let (1, Some(bc_k_other)) = (other_keys.len(), other_keys.first()) {
                        separators.remove(&other);
                        if let Some(seps) = separator_map.get_mut(bc_k_other) {
                            Rc::make_mut(seps).remove(&other);
                        }
                    }
                    bicon_component_map.insert(other, Rc::new(other_keys));
                    continue;
                }
            }

            let (bcs, seps) = self.graph.biconnected_components(Some(&reduced));
            if seps.is_empty() {
                if let Some(old_seps) = separator_map.get_mut(&bc_k) {
                    if old_seps.contains(&v) {
                        Rc::make_mut(old_seps).remove(&v);
                    }
                }
                bicon_components.insert(bc_k, Rc::new(reduced));
            } else {
                bicon_components.remove(&bc_k);
                for bcv in &reduced {
                    if let Some(ks) = bicon_component_map.get_mut(bcv) {
                        Rc::make_mut(ks).remove(&bc_k);
                    }
                }
                let old_seps = separator_map.remove(&bc_k).unwrap_or_default();
                let boundary = &*old_seps | &seps;
                for bc in bcs {
                    let k = self.keys.next();
                    for bcv in &bc {
                        if let Some(ks) = bicon_component_map.get_mut(bcv) {
                            Rc::make_mut(ks).insert(k);
                        }
                    }
                    separator_map.insert(k, Rc::new(&bc & &boundary));
                    bicon_components.insert(k, Rc::new(bc));
                }
                separators.extend(seps);
            }
        }

        if separators != *self.separators {
            self.separators = Rc::new(separators);
            self.delta.separators_changed = true;
        }
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn delta(&self) -> &MaskDelta {
        &self.delta
    }

    pub fn all_masked(&self) -> bool {
        self.vertices.is_empty()
    }

    /// More than one connected component remains.
    pub fn disjoint(&self) -> bool {
        self.components.len() > 1
    }

    pub fn vertices(&self) -> &VertexSet {
        &self.vertices
    }

    /// The open set as a shared handle, for callers that keep it past this snapshot.
    pub fn shared_vertices(&self) -> Rc<VertexSet> {
        Rc::clone(&self.vertices)
    }

    pub fn is_open(&self, v: Vertex) -> bool {
        self.vertices.contains(&v)
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentKey, &VertexSet)> + '_ {
        self.components.iter().map(|(k, c)| (*k, &**c))
    }

    pub fn component_keys(&self) -> KeySet {
        self.components.keys().copied().collect()
    }

    pub fn component(&self, k: ComponentKey) -> Option<&VertexSet> {
        self.components.get(&k).map(|c| &**c)
    }

    /// Key of the component holding the open vertex `v`.
    pub fn component_of(&self, v: Vertex) -> Option<ComponentKey> {
        self.components.iter()
            .find(|(_, c)| c.contains(&v))
            .map(|(k, _)| *k)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count(Some(&self.vertices), None)
    }

    /// Open neighbors of `v`.
    pub fn adjacencies(&self, v: Vertex) -> VertexSet {
        self.graph.adjacencies(v, Some(&self.vertices))
    }

    /// Neighbors of `v` in component `k`.
    pub fn component_adjacencies(&self, v: Vertex, k: ComponentKey) -> VertexSet {
        match self.components.get(&k) {
            Some(c) => self.graph.adjacencies(v, Some(c)),
            None => VertexSet::new(),
        }
    }

    /// Neighbors of `v` in any of the components `keys`.
    pub fn components_adjacencies(&self, v: Vertex, keys: &KeySet) -> VertexSet {
        self.graph.neighbors(v)
            .filter(|u| keys.iter().any(|k| self.components.get(k).is_some_and(|c| c.contains(u))))
            .collect()
    }

    /// Whether `v` has a neighbor in component `k`.
    pub fn touches_component(&self, v: Vertex, k: ComponentKey) -> bool {
        self.components.get(&k)
            .is_some_and(|c| self.graph.neighbors(v).any(|u| c.contains(&u)))
    }

    /// Keys of the components holding some open neighbor of `v`.
    pub fn adjacent_components(&self, v: Vertex) -> KeySet {
        let adj = self.adjacencies(v);
        self.components.iter()
            .filter(|(_, c)| !c.is_disjoint(&adj))
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn eccentricity(&self, v: Vertex, omit: Option<&VertexSet>) -> usize {
        match omit {
            Some(omit) if !omit.is_empty() => self.graph.eccentricity(v, Some(&(&*self.vertices - omit))),
            _ => self.graph.eccentricity(v, Some(&self.vertices)),
        }
    }

    pub fn hyper_eccentricity(&self, v: Vertex, omit: Option<&VertexSet>) -> usize {
        match omit {
            Some(omit) if !omit.is_empty() => self.graph.hyper_eccentricity(v, Some(&(&*self.vertices - omit))),
            _ => self.graph.hyper_eccentricity(v, Some(&self.vertices)),
        }
    }

    pub fn hyper_distance(&self, v: Vertex, targets: &VertexSet) -> usize {
        self.graph.hyper_distance(v, targets, Some(&self.vertices))
    }

    pub fn sort_closest(&self, vertices: &[Vertex], target: Vertex) -> Vec<Vertex> {
        self.graph.sort_closest(vertices, target, Some(&self.vertices))
    }

    pub fn shortest_path(&self, v1: Vertex, v2: Vertex) -> Vec<Vertex> {
        self.graph.shortest_path(v1, v2, Some(&self.vertices))
    }

    pub fn is_separator(&self, v: Vertex) -> bool {
        self.separators.contains(&v)
    }

    pub fn separators(&self) -> &VertexSet {
        &self.separators
    }

    /// The current blocks, keyed, and the separator set.
    pub fn biconnected_components(&self) -> (impl Iterator<Item = (ComponentKey, &VertexSet)> + '_, &VertexSet) {
        (self.bicon_components.iter().map(|(k, bc)| (*k, &**bc)), &*self.separators)
    }

    /// The component holding the open vertex `v`.
    pub fn connected_component(&self, v: Vertex) -> Option<&VertexSet> {
        self.components.values()
            .find(|c| c.contains(&v))
            .map(|c| &**c)
    }

    pub fn disjoint_partitions(&self) -> impl Iterator<Item = &VertexSet> + '_ {
        self.components.values().map(|c| &**c)
    }

    /// Build the block-cut forest: one node per separator, one node per block,
    /// except that a two-vertex block joining two separators becomes a plain edge between them.
    pub fn block_forest(&self) -> BlockForest {
        let mut graph = SimpleGraph::new();
        let mut next_node: Vertex = 0;
        let mut push = |graph: &mut SimpleGraph| {
            let node = next_node;
            next_node += 1;
            graph.add_vertex(node).expect("forest nodes are allocated in sequence");
            node
        };

        let mut vertex_map = BTreeMap::new();
        let mut articulations = VertexSet::new();
        for sv in self.separators.iter() {
            let node = push(&mut graph);
            articulations.insert(node);
            vertex_map.insert(*sv, node);
        }

        for (bc_k, bc) in self.bicon_components.iter() {
            let seps = self.separator_map.get(bc_k).map(|s| VertexSet::clone(s)).unwrap_or_default();
            match (bc.len(), seps.len(), seps.first(), seps.last()) {
                (2, 2, Some(s1), Some(s2)) => {
                    graph.add_edge(vertex_map[s1], vertex_map[s2]).expect("two separators share at most one block");
                }
                _ => {
                    let node = push(&mut graph);
                    for v in bc.difference(&seps) {
                        vertex_map.insert(*v, node);
                    }
                    for sv in &seps {
                        graph.add_edge(node, vertex_map[sv]).expect("a block meets each separator once");
                    }
                }
            }
        }

        BlockForest { graph, vertex_map, articulations }
    }

    /// Panic unless every maintained structure equals the same structure recomputed from scratch.
    #[cfg(test)]
    pub(crate) fn assert_valid_state(&self) {
        use std::collections::BTreeSet;

        assert_eq!(*self.vertices, self.bicon_component_map.keys().copied().collect::<VertexSet>());

        let mut component_sum = VertexSet::new();
        for c in self.components.values() {
            assert!(!c.is_empty());
            assert!(c.is_disjoint(&component_sum));
            component_sum.extend(c.iter().copied());
        }
        assert_eq!(*self.vertices, component_sum);
        let fresh_components: BTreeSet<VertexSet> = self.graph.disjoint_partitions(Some(&self.vertices)).into_iter().collect();
        let kept_components: BTreeSet<VertexSet> = self.components.values().map(|c| VertexSet::clone(c)).collect();
        assert_eq!(fresh_components, kept_components);

        for (v, ks) in self.bicon_component_map.iter() {
            assert!(!ks.is_empty());
            assert_eq!(ks.len() > 1, self.separators.contains(v));
            for k in ks.iter() {
                assert!(self.bicon_components[k].contains(v));
            }
        }
        assert!(self.separator_map.keys().eq(self.bicon_components.keys()));
        for (k, seps) in self.separator_map.iter() {
            assert_eq!(**seps, &*self.separators & &*self.bicon_components[k]);
        }

        let (bcs, seps) = self.graph.biconnected_components(Some(&self.vertices));
        assert_eq!(seps, *self.separators);
        let fresh_blocks: BTreeSet<VertexSet> = bcs.into_iter().collect();
        let kept_blocks: BTreeSet<VertexSet> = self.bicon_components.values().map(|bc| VertexSet::clone(bc)).collect();
        assert_eq!(fresh_blocks, kept_blocks);
    }
}
