use tetriq_engine::{Board, Move};

use crate::{heuristic::BoardScorer, table::QTable};

/// Supplier of the next move for a live board, polled once per tick.
pub trait MoveSource {
    fn next_move(&mut self, board: &Board) -> Move;
}

/// Never moves the piece; useful where a game loop requires a source but no
/// input is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleMoveSource;

impl MoveSource for IdleMoveSource {
    fn next_move(&mut self, _board: &Board) -> Move {
        Move::Nothing
    }
}

/// Plays a learned table: asks it for a full placement sequence, then feeds
/// it back one move per poll, requesting a fresh sequence when exhausted.
#[derive(Debug)]
pub struct TableMoveSource<'a> {
    table: &'a QTable,
    scorer: &'a BoardScorer,
    top_k: usize,
    queued: Vec<Move>,
    cursor: usize,
}

impl<'a> TableMoveSource<'a> {
    #[must_use]
    pub fn new(table: &'a QTable, scorer: &'a BoardScorer, top_k: usize) -> Self {
        Self {
            table,
            scorer,
            top_k,
            queued: Vec::new(),
            cursor: 0,
        }
    }
}

impl MoveSource for TableMoveSource<'_> {
    fn next_move(&mut self, board: &Board) -> Move {
        if self.cursor >= self.queued.len() {
            self.queued = self.table.select_move_sequence(board, self.scorer, self.top_k);
            self.cursor = 0;
        }
        let mv = self.queued[self.cursor];
        self.cursor += 1;
        mv
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use tetriq_engine::{MoveResult, Piece, PieceKind};

    use crate::state::StateSpace;

    use super::*;

    #[test]
    fn idle_source_always_does_nothing() {
        let board = Board::new(10, 24);
        let mut source = IdleMoveSource;
        assert_eq!(source.next_move(&board), Move::Nothing);
        assert_eq!(source.next_move(&board), Move::Nothing);
    }

    #[test]
    fn table_source_replays_one_sequence_then_requeues() {
        let space = StateSpace::new(4, 5, 4, 2, 3);
        let mut rng = Pcg32::seed_from_u64(21);
        let table = QTable::new(space, &mut rng);
        let scorer = BoardScorer::new(space.playable_height());
        let mut source = TableMoveSource::new(&table, &scorer, 40);

        let mut board = Board::new(space.board_width(), space.total_height());
        let piece = Piece::new(PieceKind::O);
        board.spawn(piece, space.spawn_position(piece)).unwrap();

        // Drive the board until the queued sequence places the piece.
        let mut placed = false;
        for _ in 0..16 {
            let mv = source.next_move(&board);
            if board.apply(mv) == MoveResult::Placed {
                placed = true;
                break;
            }
        }
        assert!(placed);

        // With no piece on the board the source idles.
        assert_eq!(source.next_move(&board), Move::Nothing);
    }
}
