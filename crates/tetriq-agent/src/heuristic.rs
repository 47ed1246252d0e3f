use tetriq_engine::Board;

/// Weights for the four board metrics. Negative weights penalize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub aggregate_height: f64,
    pub complete_lines: f64,
    pub holes: f64,
    pub bumpiness: f64,
}

impl Default for ScoreWeights {
    /// Hand-tuned weights; see the scorer docs for what each term measures.
    fn default() -> Self {
        Self {
            aggregate_height: -2.0,
            complete_lines: 3.0,
            holes: -1.5,
            bumpiness: -0.75,
        }
    }
}

/// Static board evaluation used for reward shaping and move re-ranking.
///
/// The score is a weighted sum of aggregate column height, rows cleared by
/// the last placement, hole count, and bumpiness. It is not an absolute
/// quality measure; consumers compare scores of successive snapshots and act
/// on the difference.
///
/// Above 3/4 of the playable height the height and line weights double, so
/// a tall stack shifts the policy toward survival and clearing.
#[derive(Debug, Clone)]
pub struct BoardScorer {
    weights: ScoreWeights,
    playable_height: usize,
}

impl BoardScorer {
    #[must_use]
    pub fn new(playable_height: usize) -> Self {
        Self::with_weights(ScoreWeights::default(), playable_height)
    }

    #[must_use]
    pub fn with_weights(weights: ScoreWeights, playable_height: usize) -> Self {
        Self {
            weights,
            playable_height,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, board: &Board) -> f64 {
        let mut height_weight = self.weights.aggregate_height;
        let mut line_weight = self.weights.complete_lines;
        if board.max_height() > 3 * self.playable_height / 4 {
            height_weight *= 2.0;
            line_weight *= 2.0;
        }

        height_weight * aggregate_height(board) as f64
            + line_weight * board.rows_cleared() as f64
            + self.weights.holes * holes(board) as f64
            + self.weights.bumpiness * bumpiness(board) as f64
    }
}

/// Sum of column heights. Rows cleared by the last placement are credited
/// back (as `cleared * width`) so a clearing placement is not double-counted
/// against the height term; the lines term already pays for the clear.
fn aggregate_height(board: &Board) -> usize {
    let sum: usize = (0..board.width())
        .map(|x| board.column_height(i32::try_from(x).unwrap_or(i32::MAX)))
        .sum();
    sum + board.rows_cleared() * board.width()
}

/// Empty cells with at least one settled cell above them in the same column.
fn holes(board: &Board) -> usize {
    let mut count = 0;
    for x in 0..board.width() {
        let x = i32::try_from(x).unwrap_or(i32::MAX);
        for y in 0..board.column_height(x) {
            if board.cell(x, i32::try_from(y).unwrap_or(i32::MAX)).is_none() {
                count += 1;
            }
        }
    }
    count
}

/// Sum of absolute height differences between adjacent columns.
fn bumpiness(board: &Board) -> usize {
    (0..board.width() - 1)
        .map(|x| {
            let x = i32::try_from(x).unwrap_or(i32::MAX);
            board.column_height(x).abs_diff(board.column_height(x + 1))
        })
        .sum()
}
