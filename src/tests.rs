#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use itertools::Itertools;

    use crate::builder::{Builder, BuilderInvalidReason, SquareBoardBuilder};
    use crate::frame::{Frame, Move};
    use crate::graph::{SharedGraph, SimpleGraph, Vertex, VertexSet};
    use crate::location::{Dimension, Location};
    use crate::memo::Memo;
    use crate::shape::{SquareStep, Step};
    use crate::{Board, Flow, Puzzle, PuzzleError, Solver, SolverConfig, SolverFailure, StepOutcome};

    fn dims(width: usize, height: usize) -> (Dimension, Dimension) {
        (NonZero::new(width).unwrap(), NonZero::new(height).unwrap())
    }

    fn graph_of(count: usize, edges: &[(Vertex, Vertex)]) -> SharedGraph {
        let mut graph = SimpleGraph::new();
        for _ in 0..count {
            graph.push_vertex();
        }
        for (v1, v2) in edges {
            graph.add_edge(*v1, *v2).unwrap();
        }
        graph.into_shared()
    }

    /// Every vertex covered once, every path joins its own endpoints along edges, and no color uses both lanes of a bridge.
    fn assert_valid_solution(puzzle: &Puzzle, flows: &[Flow]) {
        assert_eq!(flows.len(), puzzle.color_count());

        let covered = flows.iter().flat_map(|flow| flow.path.iter().copied()).collect_vec();
        assert_eq!(covered.len(), puzzle.graph().vertex_count(), "a vertex is covered twice");
        assert_eq!(covered.into_iter().collect::<VertexSet>(), puzzle.graph().vertex_set());

        for flow in flows {
            assert!(flow.complete);
            let (a, b) = puzzle.endpoints()[flow.color];
            let ends = (*flow.path.first().unwrap(), *flow.path.last().unwrap());
            assert!(ends == (a, b) || ends == (b, a), "color {} does not join its endpoints", flow.color);
            for (v1, v2) in flow.path.iter().tuple_windows() {
                assert!(puzzle.graph().adjacent(*v1, *v2), "{v1} and {v2} are not adjacent");
            }
            for set in puzzle.exclusive_sets() {
                assert!(flow.path.iter().filter(|v| set.contains(v)).count() <= 1);
            }
        }
    }

    fn solve_to_completion(board: &Board) -> (Solver, Vec<Flow>) {
        let mut solver = board.solver().unwrap();
        assert!(solver.run(u64::MAX));
        let flows = solver.solution().expect("board should be solvable");
        assert_valid_solution(solver.puzzle(), &flows);
        (solver, flows)
    }

    #[test]
    fn remove_termini() {
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .pop_termini()
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), ".....
.....
.....
.....
.....
");
    }

    #[test]
    fn solve_most_basic() {
        // flow free classic pack level 1
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .add_termini('B', (Location(2, 0), Location(1, 3)))
            .add_termini('C', (Location(2, 1), Location(2, 4)))
            .add_termini('D', (Location(4, 0), Location(3, 3)))
            .add_termini('E', (Location(4, 1), Location(3, 4)))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "A.B.D
..C.E
.....
.B.D.
.ACE.
");

        solve_to_completion(&board);
        let solved = board.solve().unwrap();
        assert_eq!(format!("{}", solved), "AbBdD
abCdE
abcde
aBcDe
aACEe
")
    }

    #[test]
    fn solve_large_simple_square() {
        // flow free extreme pack 2 12x12 level 13
        let board = SquareBoardBuilder::with_dims(dims(12, 12))
            .add_termini('A', (Location(7, 4), Location(4, 11)))
            .add_termini('B', (Location(6, 4), Location(5, 11)))
            .add_termini('C', (Location(6, 6), Location(0, 11)))
            .add_termini('D', (Location(2, 2), Location(7, 3)))
            .add_termini('E', (Location(5, 4), Location(7, 11)))
            .add_termini('F', (Location(7, 2), Location(3, 8)))
            .add_termini('G', (Location(2, 8), Location(5, 10)))
            .build()
            .unwrap();

        let solved = board.solve().unwrap();
        assert_eq!(format!("{}", solved), "ccccceeeeeee
caaacebbbbbe
caDacebFffbe
cadacebDdfbe
cadacEBAdfbe
cadacccadfbe
cadaaaCadfbe
cadddaaadfbe
caGFdddddfbe
cagfffffffbe
cagggGbbbbbe
CaaaABbEeeee
")
    }

    #[test]
    fn simple_with_bridge() {
        // flow free bridges starter pack 5x5 level 2
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(1, 3), Location(3, 0)))
            .add_termini('B', (Location(1, 4), Location(4, 3)))
            .add_termini('C', (Location(0, 0), Location(0, 4)))
            .add_termini('D', (Location(1, 0), Location(2, 2)))
            .add_termini('E', (Location(4, 0), Location(2, 3)))
            .add_bridge(Location(2, 1))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "CD.AE
..+..
..D..
.AE.B
CB...
");
        assert_eq!(board.vertices_at(Location(2, 1)).len(), 2);
        assert_eq!(board.vertex_at(Location(2, 1)), None);

        solve_to_completion(&board);
        let solved = board.solve().unwrap();
        assert_eq!(format!("{}", solved), "CDdAE
ca+ae
caDee
cAEeB
CBbbb
");
    }

    #[test]
    fn adjacent_bridges() {
        // flow free bridges hashed pack 7x7 level 1
        let board = SquareBoardBuilder::with_dims(dims(7, 7))
            .add_termini('A', (Location(0, 5), Location(5, 6)))
            .add_termini('B', (Location(0, 0), Location(6, 6)))
            .add_termini('C', (Location(1, 1), Location(6, 1)))
            .add_termini('D', (Location(1, 2), Location(6, 4)))
            .add_termini('E', (Location(1, 5), Location(6, 2)))
            .add_termini('F', (Location(4, 2), Location(4, 5)))
            .add_bridge(Location(2, 3))
            .add_bridge(Location(2, 4))
            .add_bridge(Location(3, 3))
            .add_bridge(Location(3, 4))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "B......
.C....C
.D..F.E
..++...
..++..D
AE..F..
.....AB
");

        let solved = board.solve().unwrap();
        assert_eq!(format!("{}", solved), "Bcccccc
bCeeeeC
bDefFeE
bd++ddd
bb++bbD
AEefFbb
aaaaaAB
");
    }

    #[test]
    fn single_column() {
        let board = SquareBoardBuilder::with_dims(dims(1, 3))
            .add_termini('A', (Location(0, 0), Location(0, 2)))
            .build()
            .unwrap();

        let (solver, flows) = solve_to_completion(&board);
        assert_eq!(board.locate(&flows[0]), vec![Location(0, 0), Location(0, 1), Location(0, 2)]);
        assert!(solver.stats().steps > 0);
        assert_eq!(format!("{}", board.solve().unwrap()), "A\na\nA\n");
    }

    #[test]
    fn shared_corridor_is_unsolvable() {
        // both colors need the single open cell in the middle row
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(0, 4)))
            .add_termini('B', (Location(4, 0), Location(4, 4)))
            .drop_location(Location(0, 2))
            .drop_location(Location(1, 2))
            .drop_location(Location(3, 2))
            .drop_location(Location(4, 2))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "A...B
.....
##.##
.....
A...B
");

        // the conflict is visible before any move
        assert!(!Frame::root(&board.puzzle().unwrap()).viable());

        let mut solver = board.solver().unwrap();
        assert!(solver.run(u64::MAX));
        assert!(!solver.is_solved());
        assert!(solver.is_exhausted());
        assert_eq!(solver.stats().steps, 0);
        assert_eq!(solver.solution(), None);
        assert_eq!(solver.state_hash(), 0);
        assert!(matches!(board.solve(), Err(SolverFailure::Inconsistent)));
    }

    #[test]
    fn central_bridge_crossed_by_two_colors() {
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 2), Location(4, 2)))
            .add_termini('B', (Location(2, 0), Location(2, 4)))
            .add_termini('C', (Location(0, 0), Location(1, 0)))
            .add_termini('D', (Location(3, 0), Location(4, 0)))
            .add_termini('E', (Location(0, 4), Location(1, 4)))
            .add_termini('F', (Location(3, 4), Location(4, 4)))
            .add_bridge(Location(2, 2))
            .build()
            .unwrap();

        let (_, flows) = solve_to_completion(&board);

        let lanes = board.vertices_at(Location(2, 2));
        let users = lanes.iter()
            .map(|lane| flows.iter().find(|flow| flow.path.contains(lane)).unwrap().color)
            .collect_vec();
        assert_ne!(users[0], users[1]);

        for flow in &flows {
            for (l1, l2) in board.locate(flow).into_iter().tuple_windows() {
                assert!(SquareStep::direction_to(l1, l2).is_some(), "{l1:?} and {l2:?} are not neighbors");
            }
        }

        let solved = board.solve().unwrap().to_string();
        assert_eq!(solved.lines().nth(2).unwrap().chars().nth(2), Some('+'));
        assert!(!solved.contains('.'));
    }

    #[test]
    fn disconnected_endpoints() {
        let board = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(2, 0)))
            .drop_location(Location(1, 0))
            .drop_location(Location(1, 1))
            .drop_location(Location(1, 2))
            .build()
            .unwrap();
        assert!(matches!(board.solve(), Err(SolverFailure::Inconsistent)));

        // two separate edges, one color each, but a stray vertex nobody can reach
        let mut graph = SimpleGraph::new();
        let vertices = (0..5).map(|_| graph.push_vertex()).collect_vec();
        graph.add_edge(vertices[0], vertices[1]).unwrap();
        graph.add_edge(vertices[2], vertices[3]).unwrap();
        let puzzle = Puzzle::new(graph.into_shared(), vec![(0, 1), (2, 3)], vec![]).unwrap();
        let mut solver = crate::solve(puzzle);
        assert!(solver.run(u64::MAX));
        assert!(!solver.is_solved());
    }

    #[test]
    fn empty_puzzle() {
        let board = SquareBoardBuilder::with_dims(dims(3, 3)).build().unwrap();
        let mut solver = board.solver().unwrap();

        assert_eq!(solver.step(), StepOutcome::Exhausted);
        assert!(solver.run(10));
        assert!(!solver.is_solved());
        assert!(solver.is_exhausted());
        assert_eq!(solver.stats().steps, 0);
        assert!(solver.flows().is_empty());
    }

    #[test]
    fn chunked_run() {
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .add_termini('B', (Location(2, 0), Location(1, 3)))
            .add_termini('C', (Location(2, 1), Location(2, 4)))
            .add_termini('D', (Location(4, 0), Location(3, 3)))
            .add_termini('E', (Location(4, 1), Location(3, 4)))
            .build()
            .unwrap();

        let mut solver = board.solver().unwrap();
        let initial = solver.state_hash();
        assert_ne!(initial, 0);
        assert!(!solver.run(1));
        assert!(!solver.is_solved());
        assert_eq!(solver.stats().steps, 1);

        let mut chunks = 1;
        while !solver.run(3) {
            chunks += 1;
        }
        assert!(chunks > 1);
        assert!(solver.is_solved());
        assert_valid_solution(solver.puzzle(), &solver.solution().unwrap());
        assert_ne!(solver.state_hash(), initial);

        // partial paths grow from both ends until they meet
        let flows = solver.flows();
        assert!(flows.iter().all(|flow| flow.complete));
    }

    #[test]
    fn skip_solution_finds_another() {
        // the corner to corner tour of a 3x3 board is not unique
        let board = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(2, 2)))
            .build()
            .unwrap();

        let (mut solver, first) = solve_to_completion(&board);
        assert!(solver.skip_solution());
        assert!(!solver.skip_solution());
        assert!(solver.run(u64::MAX));
        let second = solver.solution().expect("a second tour exists");
        assert_valid_solution(solver.puzzle(), &second);
        assert_ne!(first, second);

        // enumerate the rest; every solution is reported once
        let mut seen = vec![first, second];
        while solver.skip_solution() {
            solver.run(u64::MAX);
            if let Some(flows) = solver.solution() {
                assert!(!seen.contains(&flows));
                seen.push(flows);
            }
        }
        assert!(solver.is_exhausted());
        assert!(seen.len() >= 2);
    }

    #[test]
    fn stepping_by_hand() {
        let board = SquareBoardBuilder::with_dims(dims(1, 3))
            .add_termini('A', (Location(0, 0), Location(0, 2)))
            .build()
            .unwrap();
        let mut solver = board.solver().unwrap();

        assert!(!solver.step_back());
        assert_eq!(solver.step(), StepOutcome::Progress);
        // both halves are listed, the gap between them not yet closed
        let partial = solver.flows().remove(0);
        assert_eq!(partial.path, vec![0, 1, 2]);
        assert!(!partial.complete);
        assert_eq!(partial.halves(), (&[0, 1][..], &[2][..]));
        assert_eq!(board.locate_prefix(&partial, partial.split), 2);
        assert_eq!(solver.step(), StepOutcome::Solved);
        assert!(solver.is_solved());
        let joined = solver.flows().remove(0);
        assert!(joined.complete);
        assert_eq!(joined.halves(), (&[0, 1][..], &[2][..]));

        // both frames below the solution had a single move, already taken
        assert!(solver.skip_solution());
        assert_eq!(solver.step(), StepOutcome::Stalled);
        assert_eq!(solver.step(), StepOutcome::Stalled);
        assert!(solver.step_back());
        assert_eq!(solver.step(), StepOutcome::Stalled);
        assert!(solver.step_back());
        assert!(!solver.step_back());
        assert_eq!(solver.step(), StepOutcome::Exhausted);
        assert!(solver.is_exhausted());
        assert_eq!(solver.stats().backtracks, 2);
    }

    #[test]
    fn small_memo_still_solves() {
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(1, 3), Location(3, 0)))
            .add_termini('B', (Location(1, 4), Location(4, 3)))
            .add_termini('C', (Location(0, 0), Location(0, 4)))
            .add_termini('D', (Location(1, 0), Location(2, 2)))
            .add_termini('E', (Location(4, 0), Location(2, 3)))
            .add_bridge(Location(2, 1))
            .build()
            .unwrap();

        let config = SolverConfig::default().with_memo_capacity(NonZero::new(1).unwrap());
        assert_eq!(config.memo_capacity().get(), 1);
        let mut solver = board.solver_with(config).unwrap();
        assert!(solver.run(u64::MAX));
        assert_valid_solution(solver.puzzle(), &solver.solution().unwrap());
    }

    #[test]
    fn painting_flows() {
        let mut board = SquareBoardBuilder::with_dims(dims(3, 1))
            .add_termini('q', (Location(0, 0), Location(2, 0)))
            .build()
            .unwrap();
        let (_, flows) = solve_to_completion(&board);

        board.apply_flows(&flows);
        assert_eq!(board.to_string(), "QqQ\n");
        board.apply_flows(&[]);
        assert_eq!(board.to_string(), "Q.Q\n");
    }

    #[test]
    fn invalid_builders() {
        let reasons = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(3, 0)))
            .build()
            .unwrap_err();
        assert_eq!(reasons, vec![BuilderInvalidReason::FeatureOutOfBounds]);

        // bridges must be interior; once invalid, later features are ignored
        let mut builder = SquareBoardBuilder::with_dims(dims(3, 3));
        builder.add_bridge(Location(0, 1)).add_bridge(Location(1, 1));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));

        let reasons = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(2, 2)))
            .drop_location(Location(2, 2))
            .build()
            .unwrap_err();
        assert_eq!(reasons, vec![BuilderInvalidReason::OverlappingFeatures(Location(2, 2))]);

        let reasons = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_bridge(Location(1, 1))
            .add_termini('A', (Location(1, 1), Location(2, 2)))
            .build()
            .unwrap_err();
        assert_eq!(reasons, vec![BuilderInvalidReason::OverlappingFeatures(Location(1, 1))]);

        let reasons = SquareBoardBuilder::with_dims(dims(4, 4))
            .add_bridge(Location(1, 1))
            .add_bridge(Location(2, 2))
            .drop_location(Location(1, 2))
            .build()
            .unwrap_err();
        assert_eq!(reasons, vec![
            BuilderInvalidReason::BlockageNextToBridge(Location(1, 1)),
            BuilderInvalidReason::BlockageNextToBridge(Location(2, 2)),
        ]);

        let valid = SquareBoardBuilder::default();
        assert_eq!(valid.is_valid(), None);
        assert_eq!(valid.build().unwrap().dims(), dims(5, 5));
    }

    #[test]
    fn invalid_puzzles() {
        let mut graph = SimpleGraph::new();
        for _ in 0..4 {
            graph.push_vertex();
        }
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(2, 3).unwrap();
        let graph = graph.into_shared();

        assert_eq!(Puzzle::new(graph.clone(), vec![(0, 9)], vec![]).unwrap_err(), PuzzleError::UnknownVertex(9));
        assert_eq!(Puzzle::new(graph.clone(), vec![(1, 1)], vec![]).unwrap_err(), PuzzleError::DegeneratePair(1));
        assert_eq!(Puzzle::new(graph.clone(), vec![(0, 1), (1, 2)], vec![]).unwrap_err(), PuzzleError::SharedEndpoint(1));
        assert_eq!(
            Puzzle::new(graph.clone(), vec![(0, 3)], vec![VertexSet::from([1])]).unwrap_err(),
            PuzzleError::UndersizedExclusiveSet(0),
        );
        assert_eq!(
            Puzzle::new(graph.clone(), vec![(0, 3)], vec![VertexSet::from([1, 2]), VertexSet::from([2, 1])]).unwrap_err(),
            PuzzleError::OverlappingExclusiveSets(1),
        );
        assert_eq!(
            Puzzle::new(graph.clone(), vec![(0, 3)], vec![VertexSet::from([0, 2])]).unwrap_err(),
            PuzzleError::ExcludedEndpoint(0),
        );

        let puzzle = Puzzle::new(graph, vec![(0, 3)], vec![VertexSet::from([1, 2])]).unwrap();
        assert_eq!(puzzle.exclusions(1), VertexSet::from([2]));
        assert!(puzzle.exclusions(0).is_empty());
        assert_eq!(puzzle.inner_vertices(), VertexSet::from([1, 2]));
    }

    #[test]
    fn search_under_a_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();

        // either color may take the middle row
        let board = SquareBoardBuilder::with_dims(dims(2, 3))
            .add_termini('A', (Location(0, 0), Location(1, 0)))
            .add_termini('B', (Location(0, 2), Location(1, 2)))
            .build()
            .unwrap();
        let solved = tracing::subscriber::with_default(subscriber, || board.solve()).unwrap();
        assert!(["AA\naa\nBB\n", "AA\nbb\nBB\n"].contains(&solved.to_string().as_str()));
    }

    #[test]
    fn memo_evicts_oldest_quarter() {
        let board = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(2, 2)))
            .build()
            .unwrap();
        let puzzle = board.puzzle().unwrap();
        let mut root = Frame::root(&puzzle);
        assert!(root.viable());
        let root_fingerprint = root.fingerprint();
        let moves = std::iter::from_fn(|| root.next_move()).collect_vec();
        let children = moves.iter()
            .map(|mv| root.child(&puzzle, *mv).fingerprint())
            .collect_vec();
        assert_eq!(children.len(), 2);

        let mut memo = Memo::new(NonZero::new(2).unwrap());
        assert!(memo.is_empty());
        assert_eq!(memo.insert(root_fingerprint.clone()), 0);
        assert_eq!(memo.insert(children[0].clone()), 0);
        assert!(memo.contains(&root_fingerprint));
        // the lookup refreshed the root, so the first child goes
        assert_eq!(memo.insert(children[1].clone()), 1);
        assert_eq!(memo.len(), 2);
        assert!(memo.contains(&root_fingerprint));
        assert!(!memo.contains(&children[0]));
        assert!(memo.contains(&children[1]));
        // reinserting a present entry evicts nothing
        assert_eq!(memo.insert(children[1].clone()), 0);

        memo.clear();
        assert!(memo.is_empty());
    }

    #[test]
    fn unreached_leaf_block() {
        // the bottom row hangs off the middle column and no head gets into it without passing through
        let board = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(2, 0)))
            .drop_location(Location(0, 1))
            .drop_location(Location(2, 1))
            .build()
            .unwrap();
        assert_eq!(board.to_string(), "A.A\n#.#\n...\n");
        assert!(!Frame::root(&board.puzzle().unwrap()).viable());

        // a cycle behind a bridge of the open graph, every vertex of it with two ways in
        let (a1, a2, x, y, p, q, r) = (0, 1, 2, 3, 4, 5, 6);
        let graph = graph_of(7, &[(a1, x), (a2, x), (x, y), (y, p), (p, q), (q, r), (r, y)]);
        let puzzle = Puzzle::new(graph, vec![(a1, a2)], vec![]).unwrap();
        let root = Frame::root(&puzzle);
        assert!(!root.viable());
        assert!(!root.has_pending());
    }

    #[test]
    fn two_colors_through_one_separator() {
        // s is the only way between the left and right triangles, and both colors have to cross
        let (a1, a2, b1, b2, l1, l2, s, r1, r2) = (0, 1, 2, 3, 4, 5, 6, 7, 8);
        let edges = [
            (a1, l1), (b1, l2), (l1, l2), (l1, s), (l2, s),
            (s, r1), (s, r2), (r1, r2), (r1, a2), (r2, b2),
        ];
        let puzzle = Puzzle::new(graph_of(9, &edges), vec![(a1, a2), (b1, b2)], vec![]).unwrap();
        assert!(!Frame::root(&puzzle).viable());

        let mut solver = crate::solve(puzzle);
        assert!(solver.is_exhausted());
        assert!(solver.run(u64::MAX));
        assert_eq!(solver.stats().steps, 0);

        // once the second color stays on the left, the first crosses alone
        let edges = [(a1, l1), (l1, s), (s, r1), (r1, a2), (b1, l2), (l2, b2), (l1, l2)];
        let puzzle = Puzzle::new(graph_of(8, &edges), vec![(a1, a2), (b1, b2)], vec![]).unwrap();
        assert!(Frame::root(&puzzle).viable());
    }

    #[test]
    fn dead_end_vertex() {
        // y can only be entered from x
        let (a, b, x, y) = (0, 1, 2, 3);
        let puzzle = Puzzle::new(graph_of(4, &[(a, x), (b, x), (x, y)]), vec![(a, b)], vec![]).unwrap();
        assert!(!Frame::root(&puzzle).viable());

        // a second way in through a head
        let puzzle = Puzzle::new(graph_of(4, &[(a, x), (b, x), (x, y), (y, b)]), vec![(a, b)], vec![]).unwrap();
        let mut root = Frame::root(&puzzle);
        assert!(root.viable());
        assert_eq!(root.next_move(), Some(Move { color: 0, end: 0, to: x }));
        assert_eq!(root.next_move(), None);
    }

    #[test]
    fn vertex_with_two_ways_in_forces_its_head() {
        // neither head is stuck, but z can only be covered from y and b
        let (a, b, x, y, z) = (0, 1, 2, 3, 4);
        let edges = [(a, x), (a, y), (x, y), (y, z), (z, b), (x, b)];
        let puzzle = Puzzle::new(graph_of(5, &edges), vec![(a, b)], vec![]).unwrap();
        let mut root = Frame::root(&puzzle);
        assert!(root.viable());
        assert_eq!(root.next_move(), Some(Move { color: 0, end: 1, to: z }));
        assert_eq!(root.next_move(), None);

        let mut solver = crate::solve(puzzle);
        assert!(solver.run(u64::MAX));
        assert_eq!(solver.solution().unwrap()[0].path, vec![a, x, y, z, b]);
    }

    #[test]
    fn common_components_after_a_split() {
        // s joins {l1, l2} to {r1, r2}; both heads of the first color touch both sides
        let (a1, a2, b1, b2, l1, l2, s, r1, r2) = (0, 1, 2, 3, 4, 5, 6, 7, 8);
        let edges = [
            (l1, l2), (l1, s), (l2, s), (r1, r2), (r1, s), (r2, s),
            (a1, l1), (a1, r1), (a2, l2), (a2, r2), (b1, s), (b2, l2),
        ];
        let puzzle = Puzzle::new(graph_of(9, &edges), vec![(a1, a2), (b1, b2)], vec![]).unwrap();
        let root = Frame::root(&puzzle);
        assert_eq!(root.graph().components().count(), 1);
        assert!(root.pairs().iter().all(|pair| pair.common().len() == 1));

        let child = root.child(&puzzle, Move { color: 1, end: 0, to: s });
        let graph = child.graph();
        assert_eq!(graph.components().count(), 2);
        let (left, right) = (graph.component_of(l1).unwrap(), graph.component_of(r1).unwrap());
        assert_ne!(left, right);

        let [a, b] = child.pairs() else { panic!("both colors are still open") };
        assert_eq!(a.ends, [a1, a2]);
        assert_eq!(a.common().iter().copied().collect_vec(), [left, right].into_iter().sorted().collect_vec());
        assert_eq!(b.ends, [s, b2]);
        assert_eq!(b.common().iter().copied().collect_vec(), vec![left]);
        // the right side is reached by the first color only, which is enough
        assert!(child.viable());
    }
}
