use tetriq_engine::{Board, Piece, PieceKind, Position};

/// Quantization of boards into a dense, finite state index.
///
/// A board is summarized by pooling its columns into groups (each group
/// represented by its tallest column), bucketing the pooled heights by a
/// divisor, and packing the buckets together with the falling piece's kind
/// into a single index. The mapping is lossy by construction; the point is a
/// state count small enough for a dense value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace {
    board_width: usize,
    playable_height: usize,
    top_buffer: usize,
    column_group: usize,
    height_divisor: usize,
}

impl StateSpace {
    /// # Panics
    ///
    /// Panics when the column group does not divide the board width, when a
    /// pooling factor is zero, or when the top buffer cannot hold a spawned
    /// piece's bounding box.
    #[must_use]
    pub fn new(
        board_width: usize,
        playable_height: usize,
        top_buffer: usize,
        column_group: usize,
        height_divisor: usize,
    ) -> Self {
        assert!(column_group > 0 && height_divisor > 0);
        assert_eq!(
            board_width % column_group,
            0,
            "column group must divide the board width"
        );
        assert!(
            top_buffer >= 4,
            "top buffer must hold a spawned piece's bounding box"
        );
        assert!((playable_height + 1) / height_divisor > 0);
        Self {
            board_width,
            playable_height,
            top_buffer,
            column_group,
            height_divisor,
        }
    }

    #[must_use]
    pub fn board_width(&self) -> usize {
        self.board_width
    }

    /// Rows that count toward the game; the game is over when the stack
    /// grows past this.
    #[must_use]
    pub fn playable_height(&self) -> usize {
        self.playable_height
    }

    /// Spawn headroom above the playable rows.
    #[must_use]
    pub fn top_buffer(&self) -> usize {
        self.top_buffer
    }

    #[must_use]
    pub fn total_height(&self) -> usize {
        self.playable_height + self.top_buffer
    }

    /// Number of quantized height values per column group.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        (self.playable_height + 1) / self.height_divisor
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.board_width / self.column_group
    }

    /// Number of distinct pooled height profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.bucket_count()
            .pow(u32::try_from(self.group_count()).unwrap_or(u32::MAX))
    }

    /// Total states: one per (height profile, piece kind) pair.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.profile_count() * PieceKind::LEN
    }

    /// Canonical spawn anchor: horizontally centered, resting on top of the
    /// playable rows.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn spawn_position(&self, piece: Piece) -> Position {
        Position::new(
            (self.board_width / 2 - piece.width() / 2) as i32,
            self.playable_height as i32,
        )
    }

    /// Whether the board's active piece sits at its canonical spawn anchor.
    #[must_use]
    pub fn piece_at_spawn(&self, board: &Board) -> bool {
        match (board.current_piece(), board.current_position()) {
            (Some(piece), Some(position)) => position == self.spawn_position(piece),
            _ => false,
        }
    }

    /// Encodes a board (with an active piece) into its state index.
    ///
    /// Buckets are packed most-significant-group-first in base
    /// `bucket_count`, then combined with the piece kind. Heights above the
    /// playable rows clamp into the top bucket, so any live board encodes in
    /// range.
    ///
    /// # Panics
    ///
    /// Panics when the board has no active piece.
    #[must_use]
    pub fn encode(&self, board: &Board) -> usize {
        let piece = board
            .current_piece()
            .expect("state encoding requires an active piece");

        let mut profile = 0;
        for group in 0..self.group_count() {
            let start = group * self.column_group;
            let pooled = (start..start + self.column_group)
                .map(|x| board.column_height(i32::try_from(x).unwrap_or(i32::MAX)))
                .max()
                .unwrap_or(0);
            let bucket = (pooled / self.height_divisor).min(self.bucket_count() - 1);
            profile = profile * self.bucket_count() + bucket;
        }
        profile * PieceKind::LEN + piece.kind().index()
    }

    /// Reconstructs the representative board for a state index: each column
    /// group filled with placeholder cells to its bucket's height, and a
    /// piece of the decoded kind at the canonical spawn anchor.
    ///
    /// Round-trips with [`encode`](Self::encode) for every index below
    /// [`state_count`](Self::state_count).
    #[must_use]
    pub fn decode(&self, state: usize) -> Board {
        debug_assert!(state < self.state_count());
        let kind = PieceKind::from_index(state % PieceKind::LEN)
            .expect("piece index below PieceKind::LEN");
        let mut profile = state / PieceKind::LEN;

        let mut buckets = vec![0; self.group_count()];
        for bucket in buckets.iter_mut().rev() {
            *bucket = profile % self.bucket_count();
            profile /= self.bucket_count();
        }

        let width = self.board_width;
        let height = self.total_height();
        let mut grid = vec![None; width * height];
        for (group, bucket) in buckets.iter().enumerate() {
            for x in group * self.column_group..(group + 1) * self.column_group {
                for y in 0..bucket * self.height_divisor {
                    grid[y * width + x] = Some(PieceKind::O);
                }
            }
        }

        let mut board = Board::from_grid(width, height, grid);
        let piece = Piece::new(kind);
        board
            .spawn(piece, self.spawn_position(piece))
            .expect("decoded fill stays below the spawn rows");
        board
    }
}
