use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use ndarray::Array2;

use crate::affiliation::{affiliation_of, AffiliationID};
use crate::cell::Cell;
use crate::graph::{SharedGraph, Vertex, VertexSet};
use crate::location::{Dimension, Location};
use crate::puzzle::{Puzzle, PuzzleError};
use crate::shape::{SquareStep, Step};
use crate::solver::{Flow, Solver, SolverConfig, SolverFailure};

/// Where a graph vertex sits on the board.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub(crate) struct Node {
    pub(crate) location: Location,
    // the forward direction of the bridge lane this vertex stands for
    pub(crate) lane: Option<SquareStep>,
}

/// A rectangular board of square cells.
///
/// [`Board`]s should be built using a [`Builder`](crate::builder::Builder) such as [`SquareBoardBuilder`](crate::builder::SquareBoardBuilder).
/// Each open cell is one vertex of the board graph, except bridges, which are one vertex per lane.
#[derive(Debug)]
pub struct Board {
    pub(crate) dims: (Dimension, Dimension),
    pub(crate) cells: Array2<Cell>,
    pub(crate) graph: SharedGraph,
    pub(crate) nodes: BTreeMap<Vertex, Node>,
    pub(crate) locations: BTreeMap<Location, Vec<Vertex>>,
    pub(crate) termini: Vec<(Location, Location)>,
    pub(crate) affiliation_displays: Vec<char>,
}

impl Board {
    /// Width and height.
    pub fn dims(&self) -> (Dimension, Dimension) {
        self.dims
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// The vertex of a plain cell; `None` for blockages, bridges and locations off the board.
    pub fn vertex_at(&self, location: Location) -> Option<Vertex> {
        match self.vertices_at(location) {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Every vertex at `location`: one for a plain cell, one per lane for a bridge, none for a blockage.
    pub fn vertices_at(&self, location: Location) -> &[Vertex] {
        self.locations.get(&location).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn location_of(&self, v: Vertex) -> Option<Location> {
        self.nodes.get(&v).map(|node| node.location)
    }

    /// Transcribe this board into a [`Puzzle`]: one color per pair of termini, in the order they were added, and one exclusive set per bridge.
    pub fn puzzle(&self) -> Result<Puzzle, PuzzleError> {
        let endpoints = self.termini.iter()
            .map(|(l1, l2)| (self.terminus_vertex(*l1), self.terminus_vertex(*l2)))
            .collect();

        let exclusive_sets = self.locations.values()
            .filter(|vertices| vertices.len() > 1)
            .map(|vertices| vertices.iter().copied().collect::<VertexSet>())
            .collect();

        Puzzle::new(self.graph.clone(), endpoints, exclusive_sets)
    }

    /// A [`Solver`] for this board with the default configuration.
    pub fn solver(&self) -> Result<Solver, PuzzleError> {
        self.solver_with(SolverConfig::default())
    }

    pub fn solver_with(&self, config: SolverConfig) -> Result<Solver, PuzzleError> {
        Ok(Solver::new(self.puzzle()?, config))
    }

    /// Solves this board, mutating and returning `self` accordingly.
    ///
    /// Runs the search to completion; fails with [`SolverFailure::Inconsistent`] if there is no solution.
    pub fn solve(mut self) -> Result<Self, SolverFailure> {
        let mut solver = self.solver()?;
        solver.run(u64::MAX);
        let flows = solver.solution().ok_or(SolverFailure::Inconsistent)?;
        self.apply_flows(&flows);
        Ok(self)
    }

    /// Paint `flows` onto the cells, replacing any paths painted before. Termini are left as they are.
    pub fn apply_flows(&mut self, flows: &[Flow]) {
        self.cells.map_inplace(|cell| match cell {
            Cell::Path { .. } => *cell = Cell::Empty,
            Cell::Bridge { affiliations } => *affiliations = [None; 2],
            _ => {}
        });

        for flow in flows {
            let aff: AffiliationID = affiliation_of(flow.color);
            for v in &flow.path {
                let Some(node) = self.nodes.get(v) else { continue };
                let cell = &mut self.cells[node.location.as_index()];
                match cell {
                    Cell::Terminus { .. } | Cell::Blocked => {}
                    Cell::Bridge { affiliations } => {
                        let lane = node.lane.map(|lane| lane.lane_index()).unwrap_or_default();
                        affiliations[lane] = Some(aff);
                    }
                    Cell::Path { .. } | Cell::Empty => *cell = Cell::Path { affiliation: aff },
                }
            }
        }
    }

    /// The locations `flow` passes through, in order. A bridge location appears once per lane used.
    pub fn locate(&self, flow: &Flow) -> Vec<Location> {
        flow.path.iter()
            .filter_map(|v| self.location_of(*v))
            .collect()
    }

    /// How many of the locations [`locate`](Self::locate) lists for `flow` come from its first `n` vertices.
    pub fn locate_prefix(&self, flow: &Flow, n: usize) -> usize {
        flow.path.iter()
            .take(n)
            .filter(|v| self.nodes.contains_key(v))
            .count()
    }

    fn terminus_vertex(&self, location: Location) -> Vertex {
        self.vertex_at(location).expect("termini are always placed on plain cells")
    }

    fn display_of(&self, affiliation: AffiliationID) -> char {
        self.affiliation_displays.get(affiliation).copied().unwrap_or('?')
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", SquareStep::print(self.cells.map(|cell| match cell {
            Cell::Terminus { affiliation } => self.display_of(*affiliation).to_ascii_uppercase(),
            Cell::Path { affiliation } => self.display_of(*affiliation).to_ascii_lowercase(),
            Cell::Bridge { .. } => '+',
            Cell::Blocked => '#',
            Cell::Empty => '.',
        })))
    }
}
