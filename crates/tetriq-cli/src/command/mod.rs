use std::path::Path;

use clap::{Args, Parser, Subcommand};
use tetriq_agent::{LoadError, QTable, StateSpace};

mod evaluate;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a value table with tabular Q-learning
    Train(#[clap(flatten)] train::TrainArg),
    /// Play greedy games with saved weights and summarize the scores
    Evaluate(#[clap(flatten)] evaluate::EvaluateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match &args.mode {
        Mode::Train(arg) => train::run(arg)?,
        Mode::Evaluate(arg) => evaluate::run(arg)?,
    }
    Ok(())
}

/// Board and state-space dimensions shared by the subcommands.
#[derive(Debug, Clone, Copy, Args)]
pub(crate) struct SpaceArg {
    /// Board width in columns
    #[arg(long, default_value_t = 10)]
    width: usize,

    /// Playable board height in rows
    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Hidden spawn rows above the playable area
    #[arg(long, default_value_t = 4)]
    top_buffer: usize,

    /// Adjacent columns pooled into one height reading
    #[arg(long, default_value_t = 2)]
    column_group: usize,

    /// Rows per quantized height bucket
    #[arg(long, default_value_t = 3)]
    height_divisor: usize,
}

impl SpaceArg {
    pub(crate) fn to_space(self) -> StateSpace {
        StateSpace::new(
            self.width,
            self.height,
            self.top_buffer,
            self.column_group,
            self.height_divisor,
        )
    }
}

/// Loads saved weights into `table`, keeping the fresh random values when
/// the file is missing or unreadable.
pub(crate) fn load_weights(table: &mut QTable, path: &Path) {
    match table.load(path) {
        Ok(()) => eprintln!("Loaded weights from {}", path.display()),
        Err(LoadError::Missing) => eprintln!(
            "Weights file {} not found, starting from fresh values",
            path.display()
        ),
        Err(err) => eprintln!(
            "Could not load weights from {}: {err}, starting from fresh values",
            path.display()
        ),
    }
}
