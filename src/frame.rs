//! One node of the search: a partially routed puzzle.
//!
//! Every unresolved color is represented by its two heads, the current extremities of the two halves of its path
//! grown from each endpoint. Masked vertices are the ones some flow already occupies.

use std::collections::BTreeMap;
use std::rc::Rc;

use itertools::Itertools;
use unordered_pair::UnorderedPair;

use crate::graph::{ComponentKey, Forest, KeySet, MaskDelta, OnlineReducedGraph, Vertex, VertexSet};
use crate::puzzle::{Color, Puzzle};

/// Extend the path of `color` from its end `end` (0 or 1) onto `to`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Move {
    pub color: Color,
    pub end: usize,
    pub to: Vertex,
}

/// The two heads of an unresolved color.
#[derive(Clone, Debug)]
pub struct HeadPair {
    pub color: Color,
    pub ends: [Vertex; 2],
    /// Components both heads touch; the rest of the path has to run through one of them.
    common: Rc<KeySet>,
    /// Vertices this color may no longer enter because it already used a member of their exclusive set.
    blocked: Rc<VertexSet>,
}

impl HeadPair {
    pub fn common(&self) -> &KeySet {
        &self.common
    }

    pub fn blocked(&self) -> &VertexSet {
        &self.blocked
    }

    fn ends_adjacent(&self, graph: &OnlineReducedGraph) -> bool {
        graph.graph().adjacent(self.ends[0], self.ends[1])
    }

    fn touched_by_both(&self, graph: &OnlineReducedGraph, k: ComponentKey) -> bool {
        self.ends.iter().all(|e| graph.touches_component(*e, k))
    }

    /// The common components after `to` was masked by some other color, or `None` if they are unchanged.
    fn updated_common(&self, graph: &OnlineReducedGraph, delta: &MaskDelta, to: Vertex) -> Option<KeySet> {
        let deleted = delta.component_deleted.filter(|k| self.common.contains(k));
        let reduced = delta.component_reduced
            .filter(|k| self.common.contains(k))
            .filter(|k| self.ends.iter().any(|e| graph.graph().adjacent(*e, to) && !graph.touches_component(*e, *k)));
        if deleted.is_none() && reduced.is_none() {
            return None;
        }

        let mut common = KeySet::clone(&self.common);
        if let Some(k) = deleted {
            common.remove(&k);
            common.extend(delta.new_sub_components.iter().flatten().copied().filter(|nk| self.touched_by_both(graph, *nk)));
        }
        if let Some(k) = reduced {
            common.remove(&k);
        }
        Some(common)
    }
}

/// The moves of a frame not yet tried, in the order they will be tried.
#[derive(Clone, Debug, Default)]
pub struct MoveCursor {
    moves: Vec<Move>,
    next: usize,
}

impl MoveCursor {
    fn new(moves: Vec<Move>) -> Self {
        Self { moves, next: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.moves.len() - self.next
    }
}

impl Iterator for MoveCursor {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        let mv = self.moves.get(self.next).copied()?;
        self.next += 1;
        Some(mv)
    }
}

/// Memo key of a frame: which vertices are still open, where the heads are, and what each head pair may not enter.
///
/// Colors are not part of the key: frames differing only in which color sits on a pair of heads share the same future.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Fingerprint {
    heads: Vec<(UnorderedPair<Vertex>, VertexSet)>,
    open: Rc<VertexSet>,
}

/// A search state: the reduced graph of open vertices, the unresolved head pairs, and the pending moves.
#[derive(Clone, Debug)]
pub struct Frame {
    graph: OnlineReducedGraph,
    pairs: Vec<HeadPair>,
    last_move: Option<Move>,
    cursor: MoveCursor,
    viable: bool,
}

impl Frame {
    /// The initial state of `puzzle`: every endpoint is a head, every other vertex is open.
    pub fn root(puzzle: &Puzzle) -> Self {
        let graph = OnlineReducedGraph::with_vertices(puzzle.graph().clone(), puzzle.inner_vertices());
        let pairs = puzzle.endpoints().iter()
            .enumerate()
            .map(|(color, (a, b))| HeadPair {
                color,
                ends: [*a, *b],
                common: Rc::new(&graph.adjacent_components(*a) & &graph.adjacent_components(*b)),
                blocked: Rc::default(),
            })
            .collect();

        let mut frame = Self { graph, pairs, last_move: None, cursor: MoveCursor::default(), viable: true };
        let scan = frame.graph.vertices().clone();
        frame.evaluate(&scan, true);
        frame
    }

    /// The state reached by playing `mv` here. Check [`viable`](Self::viable) before descending into it.
    pub fn child(&self, puzzle: &Puzzle, mv: Move) -> Self {
        let mut graph = self.graph.copy();
        let mut pairs = self.pairs.clone();
        let moving = pairs.iter()
            .position(|p| p.color == mv.color)
            .expect("moves only name unresolved colors");
        let from = pairs[moving].ends[mv.end];
        let other = pairs[moving].ends[1 - mv.end];

        let mut check_blocks = false;
        if mv.to == other {
            pairs.remove(moving);
            // the closed pair no longer reaches into any leaf block
            check_blocks = true;
        } else {
            graph.mask_vertex(mv.to);
            let delta = graph.delta().clone();
            check_blocks = delta.separators_changed;

            for (i, pair) in pairs.iter_mut().enumerate() {
                if i == moving {
                    pair.ends[mv.end] = mv.to;
                    let candidates = delta.component_reduced.into_iter()
                        .chain(delta.new_sub_components.iter().flatten().copied());
                    let common: KeySet = candidates.filter(|k| pair.touched_by_both(&graph, *k)).collect();
                    pair.common = Rc::new(common);

                    let exclusions = puzzle.exclusions(mv.to);
                    if !exclusions.is_empty() {
                        Rc::make_mut(&mut pair.blocked).extend(exclusions);
                    }
                } else if let Some(common) = pair.updated_common(&graph, &delta, mv.to) {
                    pair.common = Rc::new(common);
                }
            }
        }

        let scan = &graph.adjacencies(from) | &graph.adjacencies(mv.to);
        let mut frame = Self { graph, pairs, last_move: Some(mv), cursor: MoveCursor::default(), viable: true };
        frame.evaluate(&scan, check_blocks);
        frame
    }

    /// Run the pruning checks and, if they pass, plan the moves to try from here.
    fn evaluate(&mut self, scan: &VertexSet, check_blocks: bool) {
        self.viable = self.passes_simple_checks(scan) && (!check_blocks || self.passes_block_checks());
        if !self.viable {
            return;
        }
        match self.plan_moves() {
            Some(moves) => self.cursor = MoveCursor::new(moves),
            None => self.viable = false,
        }
    }

    fn passes_simple_checks(&self, scan: &VertexSet) -> bool {
        if self.pairs.iter().any(|p| p.common.is_empty() && !p.ends_adjacent(&self.graph)) {
            return false;
        }

        let reachable: KeySet = self.pairs.iter().flat_map(|p| p.common.iter().copied()).collect();
        if self.graph.components().any(|(k, _)| !reachable.contains(&k)) {
            return false;
        }

        // every open vertex needs two ways in, through other open vertices or heads
        let heads: VertexSet = self.pairs.iter().flat_map(|p| p.ends).collect();
        scan.iter()
            .filter(|u| self.graph.is_open(**u))
            .all(|u| {
                self.graph.graph().neighbors(*u)
                    .filter(|n| self.graph.is_open(*n) || heads.contains(n))
                    .nth(1)
                    .is_some()
            })
    }

    /// Checks on the block-cut forest, only worth redoing when the separators moved.
    fn passes_block_checks(&self) -> bool {
        if self.graph.separators().is_empty() {
            return true;
        }
        let bf = self.graph.block_forest();

        // a leaf block can only be filled if some head reaches into it without going through its separator
        let mut touched = VertexSet::new();
        for pair in &self.pairs {
            for e in pair.ends {
                for n in self.graph.adjacencies(e) {
                    if pair.blocked.contains(&n) || self.graph.is_separator(n) {
                        continue;
                    }
                    if self.graph.component_of(n).is_some_and(|k| pair.common.contains(&k)) {
                        touched.insert(bf.vertex_map[&n]);
                    }
                }
            }
        }
        let starved_leaf = bf.graph.vertices()
            .filter(|node| !bf.articulations.contains(node))
            .any(|node| bf.graph.degree(node) == 1 && !touched.contains(&node));
        if starved_leaf {
            return false;
        }

        // no separator can carry two colors
        let forest = Forest::spanning(&bf.graph);
        let mut claimed = VertexSet::new();
        for pair in &self.pairs {
            let Some(k) = pair.common.first().copied().filter(|_| pair.common.len() == 1) else { continue };
            if pair.ends_adjacent(&self.graph) {
                continue;
            }

            let [a, b] = pair.ends.map(|e| &self.graph.component_adjacencies(e, k) - &pair.blocked);
            let mut required: Option<VertexSet> = None;
            for (n1, n2) in a.iter().cartesian_product(b.iter()) {
                let Some(path) = forest.find_path(bf.vertex_map[n1], bf.vertex_map[n2]) else { continue };
                let crossed: VertexSet = path.into_iter().filter(|node| bf.articulations.contains(node)).collect();
                let narrowed = match required {
                    None => crossed,
                    Some(required) => &required & &crossed,
                };
                let exhausted = narrowed.is_empty();
                required = Some(narrowed);
                if exhausted {
                    break;
                }
            }

            if let Some(required) = required {
                if !claimed.is_disjoint(&required) {
                    return false;
                }
                claimed.extend(required);
            }
        }

        true
    }

    /// Pick the (color, end) to extend and order its candidate vertices, or `None` if some head or open vertex is stuck.
    fn plan_moves(&self) -> Option<Vec<Move>> {
        if self.pairs.is_empty() {
            return Some(Vec::new());
        }

        let mut options = Vec::with_capacity(self.pairs.len() * 2);
        for pair in &self.pairs {
            for end in 0..2 {
                let (e, other) = (pair.ends[end], pair.ends[1 - end]);
                let mut candidates = &self.graph.components_adjacencies(e, &pair.common) - &pair.blocked;
                if pair.ends_adjacent(&self.graph) {
                    candidates.insert(other);
                }
                if candidates.is_empty() {
                    return None;
                }
                options.push((pair, end, candidates));
            }
        }

        if let Some((pair, end, candidates)) = options.iter().find(|(_, _, c)| c.len() == 1) {
            return candidates.first().map(|to| vec![Move { color: pair.color, end: *end, to: *to }]);
        }

        let mut entrants: BTreeMap<Vertex, Vec<usize>> = BTreeMap::new();
        for (i, (_, _, candidates)) in options.iter().enumerate() {
            for u in candidates.iter().filter(|u| self.graph.is_open(**u)) {
                entrants.entry(*u).or_default().push(i);
            }
        }

        // an open vertex ends up with two path neighbors, each either an open vertex or a head stepping onto it;
        // with exactly two choices, any head among them has to step onto it
        let mut forced = None;
        for u in self.graph.vertices() {
            let heads = entrants.get(u).map(Vec::as_slice).unwrap_or_default();
            match (self.open_degree(*u) + heads.len(), heads) {
                (0 | 1, _) => return None,
                (2, [i]) => { forced.get_or_insert((*i, *u)); }
                (2, [i, j]) => {
                    if options[*i].0.color != options[*j].0.color {
                        return None;
                    }
                    forced.get_or_insert((*i, *u));
                }
                _ => {}
            }
        }
        if let Some((i, u)) = forced {
            let (pair, end, _) = &options[i];
            return Some(vec![Move { color: pair.color, end: *end, to: u }]);
        }

        // fewest candidates first, then the head closest to being walled in
        let (pair, end, candidates) = options.iter()
            .min_by_key(|(_, _, c)| (c.len(), c.iter().map(|u| self.open_degree(*u)).min()))?;
        let other = pair.ends[1 - end];
        let by_distance = self.graph.sort_closest(&candidates.iter().copied().collect_vec(), other);
        let rank = |u: &Vertex| by_distance.iter().position(|v| v == u).unwrap_or(by_distance.len());

        // closing first, then candidates hugging masked vertices, then by distance to the other head
        let ordered = candidates.iter()
            .copied()
            .sorted_by_key(|u| match *u == other {
                true => (0, 0),
                false => (1 + self.open_degree(*u), rank(u)),
            })
            .map(|to| Move { color: pair.color, end: *end, to })
            .collect();
        Some(ordered)
    }

    fn open_degree(&self, u: Vertex) -> usize {
        self.graph.graph().neighbors(u).filter(|n| self.graph.is_open(*n)).count()
    }

    pub fn graph(&self) -> &OnlineReducedGraph {
        &self.graph
    }

    /// Unresolved colors, in color order.
    pub fn pairs(&self) -> &[HeadPair] {
        &self.pairs
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Whether the frame survived pruning. Frames that did not have no moves.
    pub fn viable(&self) -> bool {
        self.viable
    }

    /// Every color joined and every vertex covered.
    pub fn is_solved(&self) -> bool {
        self.pairs.is_empty() && self.graph.all_masked()
    }

    pub fn has_pending(&self) -> bool {
        self.cursor.remaining() > 0
    }

    pub fn next_move(&mut self) -> Option<Move> {
        self.cursor.next()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let heads = self.pairs.iter()
            .map(|p| {
                let [a, b] = p.ends;
                let open_blocked: VertexSet = p.blocked.iter().copied().filter(|v| self.graph.is_open(*v)).collect();
                (UnorderedPair(a.min(b), a.max(b)), open_blocked)
            })
            .sorted_by_key(|(heads, _): &(UnorderedPair<Vertex>, VertexSet)| (heads.0, heads.1))
            .collect();
        Fingerprint { heads, open: self.graph.shared_vertices() }
    }
}
