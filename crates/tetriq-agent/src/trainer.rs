use rand::Rng;
use tetriq_engine::{Board, Move, MoveResult, Piece, PieceKind};

use crate::{
    heuristic::BoardScorer,
    replay::{ActionRef, ReplayBuffer, Transition},
    table::QTable,
};

/// Hyperparameters for episode generation and value updates.
#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    /// TD learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Full passes over the replay buffer per training call.
    pub epochs: usize,
    /// Learned-value candidates kept for heuristic re-ranking.
    pub top_k: usize,
    /// Replay buffer capacity.
    pub replay_capacity: usize,
    /// Minimum buffered transitions before updates run.
    pub replay_threshold: usize,
    /// Flat reward per placed piece.
    pub drop_reward: f64,
    /// Scale for the quadratic row-clear bonus.
    pub rows_clear_reward: f64,
    /// Scale for the heuristic score delta.
    pub heuristic_reward: f64,
    /// Survival bonus paid every `milestone_interval` placements.
    pub milestone_reward: f64,
    pub milestone_interval: usize,
    /// Exploration rate: starts above 1 so early games are pure
    /// exploration, filling the replay buffer before values mean anything.
    pub epsilon: Schedule,
    /// Within exploration, the chance of following the heuristic rather
    /// than a uniformly random action.
    pub heuristic_ratio: Schedule,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.02,
            gamma: 0.9,
            epochs: 5,
            top_k: 40,
            replay_capacity: 20_000,
            replay_threshold: 2_000,
            drop_reward: 0.01,
            rows_clear_reward: 1.0,
            heuristic_reward: 1.0,
            milestone_reward: 1.0,
            milestone_interval: 100,
            epsilon: Schedule::new(2.0, 0.0, 1e-4),
            heuristic_ratio: Schedule::new(2.0, 0.0, 1e-4),
        }
    }
}

/// A value annealed linearly toward a floor, one step per training pass.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    value: f64,
    floor: f64,
    step: f64,
}

impl Schedule {
    #[must_use]
    pub const fn new(value: f64, floor: f64, step: f64) -> Self {
        Self { value, floor, step }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    fn anneal(&mut self) {
        self.value = self.floor.max(self.value - self.step);
    }
}

/// Tabular Q-learning driver: generates episodes with an epsilon-greedy
/// policy, buffers transitions, and applies TD updates over the buffer.
#[derive(Debug)]
pub struct Trainer<R> {
    table: QTable,
    scorer: BoardScorer,
    replay: ReplayBuffer,
    config: TrainerConfig,
    epsilon: Schedule,
    heuristic_ratio: Schedule,
    rng: R,
}

impl<R: Rng> Trainer<R> {
    #[must_use]
    pub fn new(table: QTable, scorer: BoardScorer, config: TrainerConfig, rng: R) -> Self {
        Self {
            scorer,
            replay: ReplayBuffer::new(config.replay_capacity),
            epsilon: config.epsilon,
            heuristic_ratio: config.heuristic_ratio,
            config,
            table,
            rng,
        }
    }

    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    #[must_use]
    pub fn into_table(self) -> QTable {
        self.table
    }

    #[must_use]
    pub fn replay(&self) -> &ReplayBuffer {
        &self.replay
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon.value()
    }

    /// Plays one epsilon-greedy game from an empty board, buffering a
    /// transition per placement. Returns the number of pieces placed.
    pub fn train_episode(&mut self) -> usize {
        let space = self.table.space();
        let mut board = Board::new(space.board_width(), space.total_height());
        let mut state = self.spawn_piece(&mut board);

        let mut prev_score = self.scorer.score(&board);
        let mut steps = 0;
        loop {
            let action = self.choose_action(state, &board);
            self.table.action_set(state).get(action).apply(&mut board);
            steps += 1;

            // Every enumerated sequence ends with a drop, so this only
            // fires if the simulator and the action space disagree.
            if board.last_result() != MoveResult::Placed {
                eprintln!("move sequence ended without a placement, forcing a drop");
                board.apply(Move::Drop);
            }

            let reward = self.step_reward(&board, &mut prev_score, steps);
            let taken = ActionRef { state, action };

            if board.max_height() > space.playable_height() {
                self.replay.push(Transition {
                    action: taken,
                    next: None,
                    reward,
                });
                break;
            }

            let next_state = self.spawn_piece(&mut board);
            let next_action =
                self.table
                    .action_set(next_state)
                    .best_index(&board, &self.scorer, self.config.top_k);
            self.replay.push(Transition {
                action: taken,
                next: Some(ActionRef {
                    state: next_state,
                    action: next_action,
                }),
                reward,
            });
            state = next_state;
        }
        steps
    }

    /// Runs the configured number of TD epochs over the replay buffer,
    /// then anneals the exploration schedules. Does nothing until the
    /// buffer reaches the replay threshold.
    pub fn train_table(&mut self) {
        if self.replay.len() < self.config.replay_threshold {
            return;
        }

        for _ in 0..self.config.epochs {
            for transition in self.replay.iter() {
                let current = self.table.value(transition.action);
                let target = match transition.next {
                    None => transition.reward,
                    Some(next) => transition.reward + self.config.gamma * self.table.value(next),
                };
                self.table
                    .add_value(transition.action, self.config.alpha * (target - current));
            }
        }

        self.epsilon.anneal();
        self.heuristic_ratio.anneal();
    }

    /// Plays one fully greedy game, validating every replayed move.
    /// Returns the number of pieces placed, or `None` if the policy ever
    /// produced an invalid move.
    pub fn test_episode(&mut self) -> Option<usize> {
        let space = self.table.space();
        let mut board = Board::new(space.board_width(), space.total_height());
        let mut state = self.spawn_piece(&mut board);

        let mut steps = 0;
        loop {
            let set = self.table.action_set(state);
            let index = set.best_index(&board, &self.scorer, self.config.top_k);
            if !set.get(index).apply_validated(&mut board) {
                return None;
            }
            steps += 1;

            if board.max_height() > space.playable_height() {
                break;
            }
            state = self.spawn_piece(&mut board);
        }
        Some(steps)
    }

    fn spawn_piece(&mut self, board: &mut Board) -> usize {
        let kind: PieceKind = self.rng.random();
        let piece = Piece::new(kind);
        let position = self.table.space().spawn_position(piece);
        board
            .spawn(piece, position)
            .expect("spawn rows stay clear while the game is live");
        self.table.space().encode(board)
    }

    fn choose_action(&mut self, state: usize, board: &Board) -> usize {
        let set = self.table.action_set(state);
        let explore: f64 = self.rng.random();
        if explore < self.epsilon.value() {
            let guided: f64 = self.rng.random();
            if guided < self.heuristic_ratio.value() {
                set.heuristic_index(board, &self.scorer)
            } else {
                set.random_index(&mut self.rng)
            }
        } else {
            set.best_index(board, &self.scorer, self.config.top_k)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn step_reward(&self, board: &Board, prev_score: &mut f64, steps: usize) -> f64 {
        let new_score = self.scorer.score(board);
        let cleared = board.rows_cleared() as f64;
        let mut reward = self.config.heuristic_reward * (new_score - *prev_score)
            + self.config.rows_clear_reward * cleared * cleared * board.width() as f64
            + self.config.drop_reward;
        *prev_score = new_score;
        if steps % self.config.milestone_interval == 0 {
            reward += self.config.milestone_reward * (steps / self.config.milestone_interval) as f64;
        }
        reward
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use crate::state::StateSpace;

    use super::*;

    fn small_trainer(seed: u64) -> Trainer<Pcg32> {
        let space = StateSpace::new(4, 5, 4, 2, 3);
        let mut rng = Pcg32::seed_from_u64(seed);
        let table = QTable::new(space, &mut rng);
        let scorer = BoardScorer::new(space.playable_height());
        Trainer::new(table, scorer, TrainerConfig::default(), rng)
    }

    fn standard_trainer(seed: u64) -> Trainer<Pcg32> {
        let space = StateSpace::new(10, 20, 4, 2, 3);
        let mut rng = Pcg32::seed_from_u64(seed);
        let table = QTable::new(space, &mut rng);
        let scorer = BoardScorer::new(space.playable_height());
        Trainer::new(table, scorer, TrainerConfig::default(), rng)
    }

    #[test]
    fn train_episode_places_pieces_and_buffers_transitions() {
        let mut trainer = small_trainer(11);
        let steps = trainer.train_episode();
        assert!(steps >= 1);
        assert_eq!(trainer.replay().len(), steps);

        // Exactly one terminal transition, and it is the last one.
        let terminals: Vec<bool> = trainer.replay().iter().map(|t| t.next.is_none()).collect();
        assert_eq!(terminals.iter().filter(|&&t| t).count(), 1);
        assert_eq!(terminals.last(), Some(&true));
    }

    #[test]
    fn replay_stays_within_capacity_across_games() {
        let mut trainer = small_trainer(12);
        for _ in 0..100 {
            trainer.train_episode();
            trainer.train_table();
            assert!(trainer.replay().len() <= trainer.replay().capacity());
        }
    }

    #[test]
    fn training_below_threshold_leaves_values_unchanged() {
        let mut trainer = small_trainer(13);
        let before: Vec<f64> = trainer.table().action_set(0).values().collect();

        // One short game on a tiny board cannot reach the threshold.
        trainer.train_episode();
        assert!(trainer.replay().len() < trainer.config.replay_threshold);
        trainer.train_table();

        let after: Vec<f64> = trainer.table().action_set(0).values().collect();
        assert_eq!(before, after);
        assert_eq!(trainer.epsilon(), 2.0);
    }

    #[test]
    fn training_past_threshold_updates_values_and_anneals() {
        let mut trainer = small_trainer(14);
        while trainer.replay().len() < trainer.config.replay_threshold {
            trainer.train_episode();
        }
        let visited = trainer.replay().iter().next().unwrap().action;
        let before = trainer.table().value(visited);

        trainer.train_table();

        assert!(trainer.epsilon() < 2.0);
        // The first buffered transition's value moved toward its target.
        assert_ne!(trainer.table().value(visited), before);
    }

    #[test]
    fn greedy_play_on_fresh_standard_table_never_goes_invalid() {
        let mut trainer = standard_trainer(15);
        for _ in 0..100 {
            let score = trainer.test_episode();
            assert!(score.is_some());
            assert!(score.unwrap() >= 1);
        }
    }
}
