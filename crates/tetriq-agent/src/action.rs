use arrayvec::ArrayVec;
use rand::Rng;
use tetriq_engine::{Board, Move, MoveResult};

use crate::heuristic::BoardScorer;

/// A full placement: a move sequence ending in a drop, plus its learned
/// value. The sequence is fixed at enumeration; only the value changes.
#[derive(Debug, Clone)]
pub struct ScoredAction {
    moves: Vec<Move>,
    value: f64,
}

impl ScoredAction {
    fn new(moves: Vec<Move>, value: f64) -> Self {
        Self { moves, value }
    }

    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn add_value(&mut self, delta: f64) {
        self.value += delta;
    }

    /// Replays the sequence on a board. Individual moves may be rejected;
    /// the trailing drop still places the piece.
    pub fn apply(&self, board: &mut Board) {
        for &mv in &self.moves {
            board.apply(mv);
        }
    }

    /// Replays the sequence, failing if the active placement ever turns
    /// invalid or any move is rejected.
    pub fn apply_validated(&self, board: &mut Board) -> bool {
        if !board.current_placement_valid() {
            return false;
        }
        for &mv in &self.moves {
            board.apply(mv);
            if !board.current_placement_valid() || board.last_result() == MoveResult::Rejected {
                return false;
            }
        }
        true
    }
}

/// Every placement reachable from one state: for each surviving rotation
/// variant, the unshifted drop plus all left and right shift sweeps.
///
/// The stored order is fixed at enumeration and doubles as the persistence
/// order for saved weights, so selection never reorders it.
#[derive(Debug, Clone)]
pub struct ActionSet {
    actions: Vec<ScoredAction>,
}

/// Rotation prefixes tried per state: spawn orientation, clockwise, half
/// turn, counterclockwise.
const ROTATION_PREFIXES: [&[Move]; 4] = [
    &[],
    &[Move::Clockwise],
    &[Move::Clockwise, Move::Clockwise],
    &[Move::CounterClockwise],
];

impl ActionSet {
    /// Enumerates all placements against a base board whose piece sits at
    /// spawn. A rotation prefix that gets rejected on the base board is
    /// excluded entirely rather than kept as a silently unrotated duplicate.
    /// Values start uniformly random in `[0, 1)`.
    #[must_use]
    pub fn enumerate<R: Rng + ?Sized>(base: &Board, rng: &mut R) -> Self {
        let mut branches: ArrayVec<(&[Move], Board), 4> = ArrayVec::new();
        for prefix in ROTATION_PREFIXES {
            let mut rotated = base.clone();
            let rejected = prefix
                .iter()
                .any(|&mv| rotated.apply(mv) == MoveResult::Rejected);
            if !rejected {
                branches.push((prefix, rotated));
            }
        }

        let mut actions = Vec::new();
        for (prefix, rotated) in &branches {
            push_action(&mut actions, prefix.to_vec(), rng);

            let mut moves = prefix.to_vec();
            let mut probe = rotated.clone();
            while probe.apply(Move::Left) == MoveResult::Success {
                moves.push(Move::Left);
                push_action(&mut actions, moves.clone(), rng);
            }

            let mut moves = prefix.to_vec();
            let mut probe = rotated.clone();
            while probe.apply(Move::Right) == MoveResult::Success {
                moves.push(Move::Right);
                push_action(&mut actions, moves.clone(), rng);
            }
        }
        Self { actions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &ScoredAction {
        &self.actions[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut ScoredAction {
        &mut self.actions[index]
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.actions.iter().map(ScoredAction::value)
    }

    /// Overwrites all values in stored order. Lengths must match.
    pub fn set_values(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.actions.len());
        for (action, &value) in self.actions.iter_mut().zip(values) {
            action.value = value;
        }
    }

    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.actions.len())
    }

    /// Index of the exploitation choice: the `top_k` actions by learned
    /// value, re-ranked by replaying each on the actual board and comparing
    /// heuristic scores. The learned values rank placements of the
    /// quantized state; the re-rank grounds the final pick in the board the
    /// agent actually faces.
    #[must_use]
    pub fn best_index(&self, board: &Board, scorer: &BoardScorer, top_k: usize) -> usize {
        let mut order: Vec<usize> = (0..self.actions.len()).collect();
        order.sort_by(|&a, &b| self.actions[b].value.total_cmp(&self.actions[a].value));
        order.truncate(top_k.max(1));
        self.best_by_heuristic(board, scorer, &order)
    }

    /// Index of the heuristic choice over the whole action set.
    #[must_use]
    pub fn heuristic_index(&self, board: &Board, scorer: &BoardScorer) -> usize {
        let all: Vec<usize> = (0..self.actions.len()).collect();
        self.best_by_heuristic(board, scorer, &all)
    }

    fn best_by_heuristic(&self, board: &Board, scorer: &BoardScorer, candidates: &[usize]) -> usize {
        assert!(!candidates.is_empty());
        let base_score = scorer.score(board);
        let mut best = candidates[0];
        let mut best_delta = f64::NEG_INFINITY;
        for &index in candidates {
            let mut lookahead = board.clone();
            self.actions[index].apply(&mut lookahead);
            let delta = scorer.score(&lookahead) - base_score;
            if delta > best_delta {
                best_delta = delta;
                best = index;
            }
        }
        best
    }
}

fn push_action<R: Rng + ?Sized>(actions: &mut Vec<ScoredAction>, mut moves: Vec<Move>, rng: &mut R) {
    moves.push(Move::Drop);
    actions.push(ScoredAction::new(moves, rng.random()));
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use tetriq_engine::{Piece, PieceKind, PieceRotation, Position};

    use crate::state::StateSpace;

    use super::*;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    fn empty_base(kind: PieceKind) -> Board {
        let space = StateSpace::new(10, 20, 4, 2, 3);
        let mut board = Board::new(10, 24);
        let piece = Piece::new(kind);
        board.spawn(piece, space.spawn_position(piece)).unwrap();
        board
    }

    #[test]
    fn every_action_ends_with_a_drop() {
        let base = empty_base(PieceKind::T);
        let set = ActionSet::enumerate(&base, &mut rng());
        assert!(!set.is_empty());
        for i in 0..set.len() {
            assert_eq!(set.get(i).moves().last(), Some(&Move::Drop));
        }
    }

    #[test]
    fn square_piece_enumerates_all_columns_per_rotation() {
        let base = empty_base(PieceKind::O);
        let set = ActionSet::enumerate(&base, &mut rng());
        // O spawns at x = 4 on a width 10 board: 4 left shifts, 4 right
        // shifts, plus the unshifted drop, for each of 4 rotation variants.
        assert_eq!(set.len(), 4 * 9);
    }

    #[test]
    fn initial_values_are_unit_interval_random() {
        let base = empty_base(PieceKind::L);
        let set = ActionSet::enumerate(&base, &mut rng());
        let values: Vec<f64> = set.values().collect();
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
        // Not all identical.
        assert!(values.iter().any(|&v| (v - values[0]).abs() > 1e-9));
    }

    #[test]
    fn rejected_rotations_are_excluded() {
        // Vertical I in a one-column shaft: no rotation can apply, and no
        // shift can apply, leaving exactly the bare drop.
        let mut board = Board::from_ascii(
            4,
            8,
            ".###
             .###
             .###
             .###
             .###
             .###
             .###",
        );
        board
            .spawn(
                Piece::with_rotation(PieceKind::I, PieceRotation::new(1)),
                Position::new(-2, 3),
            )
            .unwrap();

        let set = ActionSet::enumerate(&board, &mut rng());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).moves(), &[Move::Drop]);
    }

    #[test]
    fn selection_leaves_stored_order_untouched() {
        let base = empty_base(PieceKind::S);
        let mut set = ActionSet::enumerate(&base, &mut rng());
        for i in 0..set.len() {
            #[allow(clippy::cast_precision_loss)]
            set.get_mut(i).set_value(i as f64);
        }
        let before: Vec<f64> = set.values().collect();

        let scorer = BoardScorer::new(20);
        let _ = set.best_index(&base, &scorer, 40);
        let _ = set.heuristic_index(&base, &scorer);

        let after: Vec<f64> = set.values().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn top_one_selection_follows_learned_values() {
        let base = empty_base(PieceKind::Z);
        let mut set = ActionSet::enumerate(&base, &mut rng());
        for i in 0..set.len() {
            set.get_mut(i).set_value(0.0);
        }
        set.get_mut(7).set_value(10.0);

        let scorer = BoardScorer::new(20);
        assert_eq!(set.best_index(&base, &scorer, 1), 7);
    }

    #[test]
    fn heuristic_prefers_row_completing_placement() {
        // Bottom row open only at the far right; dropping the O into the
        // gap clears two rows, which the heuristic rewards over any other
        // placement.
        let mut board = Board::from_ascii(
            10,
            24,
            "########..
             ########..",
        );
        let space = StateSpace::new(10, 20, 4, 2, 3);
        let piece = Piece::new(PieceKind::O);
        board.spawn(piece, space.spawn_position(piece)).unwrap();

        let set = ActionSet::enumerate(&board, &mut rng());
        let scorer = BoardScorer::new(20);
        let best = set.get(set.heuristic_index(&board, &scorer));

        let mut lookahead = board.clone();
        best.apply(&mut lookahead);
        assert_eq!(lookahead.rows_cleared(), 2);
    }

    #[test]
    fn validated_replay_detects_rejected_moves() {
        let mut board = Board::new(10, 24);
        board
            .spawn(Piece::new(PieceKind::O), Position::new(0, 20))
            .unwrap();
        let action = ScoredAction::new(vec![Move::Left, Move::Drop], 0.0);
        assert!(!action.apply_validated(&mut board));

        let mut board = Board::new(10, 24);
        board
            .spawn(Piece::new(PieceKind::O), Position::new(4, 20))
            .unwrap();
        let action = ScoredAction::new(vec![Move::Left, Move::Drop], 0.0);
        assert!(action.apply_validated(&mut board));
    }
}
