use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

use tracing::{debug, info, instrument, trace};

use crate::frame::{Frame, Move};
use crate::graph::Vertex;
use crate::memo::Memo;
use crate::puzzle::{Color, Puzzle, PuzzleError};

/// Reasons solving may fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SolverFailure {
    /// The search space was exhausted without finding a solution.
    #[error("the puzzle has no solution")]
    Inconsistent,
    /// The puzzle could not be built in the first place.
    #[error("invalid puzzle: {0}")]
    Invalid(#[from] PuzzleError),
}

/// Tunables for a [`Solver`].
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    memo_capacity: NonZeroUsize,
}

impl SolverConfig {
    /// Default number of dead-end fingerprints remembered before eviction.
    pub const DEFAULT_MEMO_CAPACITY: usize = 1 << 16;

    pub fn new(memo_capacity: NonZeroUsize) -> Self {
        Self { memo_capacity }
    }

    /// Bound the number of remembered dead-end states.
    #[must_use]
    pub fn with_memo_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    pub fn memo_capacity(&self) -> NonZeroUsize {
        self.memo_capacity
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(Self::DEFAULT_MEMO_CAPACITY)
            .expect("default memo capacity must be non-zero");
        Self::new(capacity)
    }
}

/// What a single [`Solver::step`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepOutcome {
    /// A new frame was pushed.
    Progress,
    /// The next move led to a pruned, memoized or already reported state and was dropped.
    Discarded,
    /// A new frame was pushed and it is a solution.
    Solved,
    /// The top frame has no moves left; it should be stepped back from.
    Stalled,
    /// Nothing is left to search.
    Exhausted,
}

/// Counters kept over the life of a [`Solver`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SolverStats {
    /// Moves tried.
    pub steps: u64,
    /// Frames popped after running out of moves.
    pub backtracks: u64,
    /// Moves whose resulting frame failed a pruning check.
    pub pruned: u64,
    /// Moves whose resulting frame was already known dead.
    pub memo_hits: u64,
    /// Solutions found again after having been reported.
    pub duplicates: u64,
    pub max_depth: usize,
}

/// The path of one color as currently laid out, from its first endpoint toward its second.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flow {
    pub color: Color,
    pub path: Vec<Vertex>,
    /// Both halves met; `path` runs from one endpoint to the other.
    pub complete: bool,
    /// How many vertices of `path` were grown from the first endpoint. The rest were grown from the second, listed back to front.
    pub split: usize,
}

impl Flow {
    /// The part grown from the first endpoint and the part grown from the second, both in `path` order.
    /// Until the flow is complete there is a gap between them.
    pub fn halves(&self) -> (&[Vertex], &[Vertex]) {
        self.path.split_at(self.split)
    }
}

/// Depth-first search over [`Frame`]s, resumable in chunks.
pub struct Solver {
    puzzle: Puzzle,
    stack: Vec<Frame>,
    memo: Memo,
    seen: HashSet<Vec<Vec<Vertex>>>,
    // the bottom `fruitful` frames of the stack are ancestors of some solution and are never memoized
    fruitful: usize,
    stats: SolverStats,
}

/// A solver for `puzzle` with the default configuration. Nothing is searched until [`Solver::run`] or [`Solver::step`] is called.
pub fn solve(puzzle: Puzzle) -> Solver {
    Solver::new(puzzle, SolverConfig::default())
}

impl Solver {
    pub fn new(puzzle: Puzzle, config: SolverConfig) -> Self {
        let mut stack = Vec::new();
        if puzzle.color_count() > 0 {
            let root = Frame::root(&puzzle);
            if root.viable() {
                stack.push(root);
            } else {
                debug!("puzzle is unsolvable at the root");
            }
        }

        Self {
            puzzle,
            stats: SolverStats { max_depth: stack.len(), ..Default::default() },
            stack,
            memo: Memo::new(config.memo_capacity()),
            seen: HashSet::new(),
            fruitful: 0,
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    /// Try the next move of the top frame.
    pub fn step(&mut self) -> StepOutcome {
        let Some(top) = self.stack.last_mut() else {
            return StepOutcome::Exhausted;
        };
        let Some(mv) = top.next_move() else {
            return StepOutcome::Stalled;
        };
        let child = top.child(&self.puzzle, mv);
        self.stats.steps += 1;
        trace!(depth = self.stack.len(), color = mv.color, end = mv.end, to = mv.to, "step");

        if !child.viable() {
            self.stats.pruned += 1;
            return StepOutcome::Discarded;
        }
        if self.memo.contains(&child.fingerprint()) {
            self.stats.memo_hits += 1;
            return StepOutcome::Discarded;
        }

        let solved = child.is_solved();
        self.stack.push(child);
        self.stats.max_depth = self.stats.max_depth.max(self.stack.len());
        if !solved {
            return StepOutcome::Progress;
        }
        self.fruitful = self.stack.len() - 1;

        if self.seen.insert(self.solution_key()) {
            info!(steps = self.stats.steps, depth = self.stack.len(), "found a solution");
            StepOutcome::Solved
        } else {
            self.stack.pop();
            self.stats.duplicates += 1;
            StepOutcome::Discarded
        }
    }

    /// Pop the top frame if it has no moves left, remembering it as a dead end.
    pub fn step_back(&mut self) -> bool {
        match self.stack.last() {
            Some(top) if !top.has_pending() && !top.is_solved() => {}
            _ => return false,
        }
        let Some(top) = self.stack.pop() else { return false };
        self.stats.backtracks += 1;
        if self.stack.len() < self.fruitful {
            // led to a solution already reported, which does not make it a dead end
            self.fruitful = self.stack.len();
            debug!(depth = self.stack.len(), "backtrack past a solution");
        } else {
            let evicted = self.memo.insert(top.fingerprint());
            debug!(depth = self.stack.len(), evicted, "backtrack");
        }
        true
    }

    /// Search until a solution is found or nothing is left (`true`), or until `limit` moves were tried (`false`).
    #[instrument(level = "debug", skip(self), fields(depth = self.stack.len()))]
    pub fn run(&mut self, limit: u64) -> bool {
        let mut taken = 0;
        loop {
            if self.is_solved() || self.is_exhausted() {
                info!(solved = self.is_solved(), stats = ?self.stats, "search finished");
                return true;
            }
            if self.step_back() {
                continue;
            }
            if taken >= limit {
                return false;
            }
            self.step();
            taken += 1;
        }
    }

    pub fn is_solved(&self) -> bool {
        self.stack.last().is_some_and(Frame::is_solved)
    }

    pub fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }

    /// The path of every color as laid out by the current stack of moves.
    pub fn flows(&self) -> Vec<Flow> {
        let mut halves: Vec<[Vec<Vertex>; 2]> = self.puzzle.endpoints().iter()
            .map(|(a, b)| [vec![*a], vec![*b]])
            .collect();
        let mut complete = vec![false; halves.len()];

        for Move { color, end, to } in self.stack.iter().filter_map(Frame::last_move) {
            let other = halves[color][1 - end].last().copied();
            if other == Some(to) {
                complete[color] = true;
            } else {
                halves[color][end].push(to);
            }
        }

        halves.into_iter()
            .zip(complete)
            .enumerate()
            .map(|(color, ([mut path, tail], complete))| {
                let split = path.len();
                path.extend(tail.into_iter().rev());
                Flow { color, path, complete, split }
            })
            .collect()
    }

    /// The flows, if the top frame is a solution.
    pub fn solution(&self) -> Option<Vec<Flow>> {
        self.is_solved().then(|| self.flows())
    }

    /// A digest of the current search state, `0` once exhausted.
    pub fn state_hash(&self) -> u64 {
        let Some(top) = self.stack.last() else { return 0 };
        let mut hasher = DefaultHasher::new();
        top.fingerprint().hash(&mut hasher);
        hasher.finish()
    }

    /// Drop the current solution and keep searching for a different one.
    ///
    /// The memo is forgotten as well.
    pub fn skip_solution(&mut self) -> bool {
        if !self.is_solved() {
            return false;
        }
        self.memo.clear();
        self.stack.pop();
        debug!(depth = self.stack.len(), reported = self.seen.len(), "skipping solution");
        true
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Paths of the current stack oriented from their lower endpoint, identifying a solution regardless of search order.
    fn solution_key(&self) -> Vec<Vec<Vertex>> {
        self.flows().into_iter()
            .map(|flow| {
                let mut path = flow.path;
                if path.first() > path.last() {
                    path.reverse();
                }
                path
            })
            .collect()
    }
}
