use std::{
    fs::File,
    io::{self, BufWriter, Write as _},
    path::Path,
};

use rand::Rng;
use tetriq_engine::{Board, Move};

use crate::{action::ActionSet, heuristic::BoardScorer, replay::ActionRef, state::StateSpace};

/// Why a saved weights file could not be applied. Every variant leaves the
/// table's current values untouched.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadError {
    #[display("weights file not found")]
    Missing,
    #[display("failed to read weights file")]
    Io(#[error(source)] io::Error),
    #[display("weights file has {found} state lines, expected {expected}")]
    LineCount { expected: usize, found: usize },
    #[display("state {state} has {found} action values, expected {expected}")]
    ActionCount {
        state: usize,
        expected: usize,
        found: usize,
    },
    #[display("state {state} has an unparseable action value {value:?}")]
    Value { state: usize, value: String },
}

/// Dense value table: one enumerated [`ActionSet`] per state index.
///
/// Construction decodes every state and enumerates its placements upfront,
/// so lookups during training and inference are plain indexing.
#[derive(Debug)]
pub struct QTable {
    space: StateSpace,
    states: Vec<ActionSet>,
}

impl QTable {
    /// Builds the full table with uniformly random initial values.
    #[must_use]
    pub fn new<R: Rng + ?Sized>(space: StateSpace, rng: &mut R) -> Self {
        let states = (0..space.state_count())
            .map(|state| ActionSet::enumerate(&space.decode(state), rng))
            .collect();
        Self { space, states }
    }

    #[must_use]
    pub fn space(&self) -> StateSpace {
        self.space
    }

    #[must_use]
    pub fn action_set(&self, state: usize) -> &ActionSet {
        &self.states[state]
    }

    #[must_use]
    pub fn value(&self, action: ActionRef) -> f64 {
        self.states[action.state].get(action.action).value()
    }

    pub fn add_value(&mut self, action: ActionRef, delta: f64) {
        self.states[action.state].get_mut(action.action).add_value(delta);
    }

    /// Chooses the move sequence to play on a live board.
    ///
    /// Without an active piece there is nothing to decide. A piece away
    /// from its canonical spawn anchor invalidates the table's action
    /// sequences (they were enumerated from spawn), so it is simply
    /// dropped. Otherwise the board is encoded and the best action's
    /// sequence returned.
    #[must_use]
    pub fn select_move_sequence(
        &self,
        board: &Board,
        scorer: &BoardScorer,
        top_k: usize,
    ) -> Vec<Move> {
        if board.current_piece().is_none() {
            return vec![Move::Nothing];
        }
        if !self.space.piece_at_spawn(board) {
            return vec![Move::Drop];
        }
        let set = &self.states[self.space.encode(board)];
        set.get(set.best_index(board, scorer, top_k)).moves().to_vec()
    }

    /// Writes the table as flat text: one line per state in index order,
    /// action values whitespace-separated in stored order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for set in &self.states {
            let mut first = true;
            for value in set.values() {
                if first {
                    first = false;
                } else {
                    write!(writer, " ")?;
                }
                write!(writer, "{value}")?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }

    /// Loads values saved by [`save`](Self::save).
    ///
    /// All-or-nothing: the whole file is parsed and validated against this
    /// table's dimensions before any value is applied, so a failed load
    /// leaves the current (freshly initialized) values intact. A missing
    /// file is its own variant so callers can start from defaults without
    /// treating it as corruption.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::Missing),
            Err(e) => return Err(LoadError::Io(e)),
        };

        let lines: Vec<&str> = content.lines().collect();
        if lines.len() != self.states.len() {
            return Err(LoadError::LineCount {
                expected: self.states.len(),
                found: lines.len(),
            });
        }

        let mut parsed = Vec::with_capacity(lines.len());
        for (state, line) in lines.iter().enumerate() {
            let values = line
                .split_whitespace()
                .map(|value| {
                    value.parse::<f64>().map_err(|_| LoadError::Value {
                        state,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, LoadError>>()?;
            if values.len() != self.states[state].len() {
                return Err(LoadError::ActionCount {
                    state,
                    expected: self.states[state].len(),
                    found: values.len(),
                });
            }
            parsed.push(values);
        }

        for (set, values) in self.states.iter_mut().zip(&parsed) {
            set.set_values(values);
        }
        Ok(())
    }
}
