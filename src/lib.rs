//! # `flowline`
//!
//! A solver for [Numberlink](https://en.wikipedia.org/wiki/Numberlink) and variants as posited in the mobile game Flow Free and its Bridges expansion.
//! Begin by building a board object using a builder such as [`SquareBoardBuilder`](builder::SquareBoardBuilder).
//! Convert it to a board object, then call [`solve()`](crate::Board::solve), consuming the board and yielding a solved version of the board,
//! or take a [`Solver`] from [`Board::solver`] to search in chunks and enumerate solutions.
//!
//! # Internals
//! The board is expressed as an undirected graph G. A vertex corresponds to a cell as seen in-game, except for bridges, which become one vertex per lane,
//! and edges, naturally, encode connections between vertices.
//! The two lanes of a bridge form an "exclusive set": no single flow may use both.
//!
//! Each color grows from both of its endpoints at once; a color is done when its two heads meet.
//! The search is a depth-first walk over [`frame::Frame`]s, each holding the graph of still-uncovered vertices
//! as an [`OnlineReducedGraph`](graph::OnlineReducedGraph), which keeps connected components, biconnected components and articulation points current
//! as vertices are covered one at a time.
//! A frame is pruned as soon as:
//! 1. some uncovered vertex can no longer be reached, or is a dead end no head can enter;
//! 2. the heads of a color no longer share a component;
//! 3. a leaf block of the uncovered graph is touched by no color that could enter and leave it;
//! 4. two colors both need the same articulation point.
//!
//! Dead frames are remembered by a color-agnostic fingerprint of the heads and uncovered vertices, so that equivalent states reached in another order are skipped.

pub use board::Board;
pub use builder::Builder;
pub use location::Location;
pub use puzzle::{Color, Puzzle, PuzzleError};
pub use solver::{solve, Flow, Solver, SolverConfig, SolverFailure, SolverStats, StepOutcome};

pub(crate) mod board;
mod tests;
pub(crate) mod affiliation;
pub(crate) mod location;
pub mod shape;
pub(crate) mod cell;
pub mod builder;
pub mod graph;
pub(crate) mod puzzle;
pub mod frame;
pub(crate) mod memo;
pub(crate) mod solver;
#[cfg(feature = "wasm")]
pub mod wasm;
