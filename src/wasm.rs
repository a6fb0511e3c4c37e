use std::num::NonZero;

use itertools::Itertools;
use js_sys::{Array, Uint32Array};
use wasm_bindgen::prelude::*;

use crate::board::Board;
use crate::builder::{Builder, BuilderInvalidReason, SquareBoardBuilder};
use crate::location::Location;
use crate::solver::Solver;

/// A board and the search over it, driven from JavaScript in chunks.
#[wasm_bindgen]
pub struct FlowSession {
    board: Board,
    solver: Solver,
}

fn locations(flat: &[u32]) -> impl Iterator<Item = Location> + '_ {
    flat.chunks_exact(2).map(|xy| Location(xy[0] as usize, xy[1] as usize))
}

fn describe(reasons: Vec<BuilderInvalidReason>) -> JsError {
    JsError::new(&reasons.iter().map(ToString::to_string).join("; "))
}

#[wasm_bindgen]
impl FlowSession {
    /// `termini` is `[x1, y1, x2, y2, ...]`, four numbers per color; `bridges` and `blockages` are `[x, y, ...]`.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, termini: &[u32], bridges: &[u32], blockages: &[u32]) -> Result<FlowSession, JsError> {
        let (Some(w), Some(h)) = (NonZero::new(width as usize), NonZero::new(height as usize)) else {
            return Err(JsError::new("board dimensions must be non-zero"));
        };
        if termini.len() % 4 != 0 {
            return Err(JsError::new("termini must come in groups of four coordinates"));
        }

        let mut builder = SquareBoardBuilder::with_dims((w, h));
        // name colors a, b, c, ... wrapping after z
        for (i, (l1, l2)) in locations(termini).tuples().enumerate() {
            let display = char::from(b'a' + (i % 26) as u8);
            builder.add_termini(display, (l1, l2));
        }
        for location in locations(bridges) {
            builder.add_bridge(location);
        }
        for location in locations(blockages) {
            builder.drop_location(location);
        }

        let board = builder.build().map_err(describe)?;
        let solver = board.solver()?;
        Ok(FlowSession { board, solver })
    }

    /// Search for at most `limit` moves. Returns whether the search finished, solved or not.
    pub fn run(&mut self, limit: u32) -> bool {
        self.solver.run(u64::from(limit))
    }

    pub fn solved(&self) -> bool {
        self.solver.is_solved()
    }

    pub fn exhausted(&self) -> bool {
        self.solver.is_exhausted()
    }

    /// One `Uint32Array` per color: `[color, complete, split, x0, y0, x1, y1, ...]` along its current path.
    ///
    /// `complete` is 1 once both ends joined. The first `split` locations were grown from the first terminus;
    /// while incomplete, the rest continue from the second terminus and are not connected to them.
    pub fn flows(&self) -> Array {
        let out = Array::new();
        for flow in self.solver.flows() {
            let split = self.board.locate_prefix(&flow, flow.split);
            let mut packed = vec![flow.color as u32, u32::from(flow.complete), split as u32];
            for Location(x, y) in self.board.locate(&flow) {
                packed.push(x as u32);
                packed.push(y as u32);
            }
            out.push(&Uint32Array::from(packed.as_slice()));
        }
        out
    }

    pub fn skip_solution(&mut self) -> bool {
        self.solver.skip_solution()
    }

    /// Digest of the current search state, for hosts that only redraw on change.
    pub fn state_hash(&self) -> u64 {
        self.solver.state_hash()
    }

    /// The board as text, painted with the current flows.
    pub fn render(&mut self) -> String {
        self.board.apply_flows(&self.solver.flows());
        self.board.to_string()
    }
}
