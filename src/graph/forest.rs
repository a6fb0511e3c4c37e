use std::collections::{BTreeMap, VecDeque};

use crate::graph::{SimpleGraph, Vertex};

/// A rooted tree recording, per node, its parent and its depth below the root.
#[derive(Clone, Debug)]
pub struct Tree {
    root: Vertex,
    nodes: BTreeMap<Vertex, (Option<Vertex>, usize)>,
}

impl Tree {
    pub fn new(root: Vertex) -> Self {
        Self { root, nodes: BTreeMap::from([(root, (None, 0))]) }
    }

    pub fn root(&self) -> Vertex {
        self.root
    }

    pub fn contains(&self, v: Vertex) -> bool {
        self.nodes.contains_key(&v)
    }

    /// Attach `v` below `parent`. Panics if `v` is already present or `parent` is not.
    pub fn add(&mut self, v: Vertex, parent: Vertex) {
        assert!(!self.contains(v), "{v} is already in the tree");
        let depth = self.depth_of(parent) + 1;
        self.nodes.insert(v, (Some(parent), depth));
    }

    pub fn depth_of(&self, v: Vertex) -> usize {
        self.nodes[&v].1
    }

    pub fn parent(&self, v: Vertex) -> Option<Vertex> {
        self.nodes[&v].0
    }

    /// The path from `v` to `u` through their lowest common ancestor, both ends included.
    pub fn find_path(&self, v: Vertex, u: Vertex) -> Vec<Vertex> {
        let mut v_path = vec![v];
        let mut u_path = vec![u];
        let (mut v_top, mut u_top) = (v, u);
        while v_top != u_top {
            let (v_depth, u_depth) = (self.depth_of(v_top), self.depth_of(u_top));
            if v_depth >= u_depth {
                v_top = self.parent(v_top).expect("nodes deeper than the root have parents");
                v_path.push(v_top);
            }
            if u_depth >= v_depth {
                u_top = self.parent(u_top).expect("nodes deeper than the root have parents");
                u_path.push(u_top);
            }
        }
        u_path.pop();
        v_path.extend(u_path.into_iter().rev());
        v_path
    }

    pub fn path_to_root(&self, v: Vertex) -> Vec<Vertex> {
        let mut path = vec![v];
        let mut top = v;
        while let Some(parent) = self.parent(top) {
            path.push(parent);
            top = parent;
        }
        path
    }
}

/// A set of disjoint rooted trees, looked up by any of their nodes.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    trees: Vec<Tree>,
    membership: BTreeMap<Vertex, usize>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// A breadth-first spanning forest of `graph`, rooted at the lowest id of each connected component.
    pub fn spanning(graph: &SimpleGraph) -> Self {
        let mut forest = Self::new();
        let mut roots = graph.vertex_set();
        while let Some(root) = roots.pop_first() {
            forest.add_tree(root);
            let mut bfs = VecDeque::from([root]);
            while let Some(v) = bfs.pop_front() {
                for u in graph.adjacencies(v, Some(&roots)) {
                    roots.remove(&u);
                    forest.add(u, v);
                    bfs.push_back(u);
                }
            }
        }
        forest
    }

    pub fn contains(&self, v: Vertex) -> bool {
        self.membership.contains_key(&v)
    }

    pub fn add_tree(&mut self, root: Vertex) {
        assert!(!self.contains(root), "{root} is already in the forest");
        self.membership.insert(root, self.trees.len());
        self.trees.push(Tree::new(root));
    }

    /// Attach `v` below `parent`, in whichever tree holds `parent`.
    pub fn add(&mut self, v: Vertex, parent: Vertex) {
        assert!(!self.contains(v), "{v} is already in the forest");
        let tree = self.membership[&parent];
        self.trees[tree].add(v, parent);
        self.membership.insert(v, tree);
    }

    fn tree_of(&self, v: Vertex) -> &Tree {
        &self.trees[self.membership[&v]]
    }

    pub fn depth_of(&self, v: Vertex) -> usize {
        self.tree_of(v).depth_of(v)
    }

    pub fn root_for(&self, v: Vertex) -> Vertex {
        self.tree_of(v).root()
    }

    /// The tree path from `v` to `u`, or `None` if they lie in different trees.
    pub fn find_path(&self, v: Vertex, u: Vertex) -> Option<Vec<Vertex>> {
        let tree = self.membership[&v];
        (tree == self.membership[&u]).then(|| self.trees[tree].find_path(v, u))
    }

    pub fn path_to_root(&self, v: Vertex) -> Vec<Vertex> {
        self.tree_of(v).path_to_root(v)
    }
}
