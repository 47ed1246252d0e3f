use std::path::PathBuf;

use anyhow::bail;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use tetriq_agent::{BoardScorer, QTable, Trainer, TrainerConfig};
use tetriq_stats::descriptive::DescriptiveStats;

use crate::command::SpaceArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Number of greedy games to play
    #[arg(long, default_value_t = 100)]
    games: u64,

    #[clap(flatten)]
    space: SpaceArg,

    /// Seed for a reproducible run; omit for an OS-seeded one
    #[arg(long)]
    seed: Option<u64>,

    /// Weights file to play with
    #[arg(long, default_value = "tetriq-weights.txt")]
    weights: PathBuf,

    /// Fail on an invalid replayed move instead of skipping the game
    #[arg(long)]
    strict: bool,
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let space = arg.space.to_space();
    let mut rng = match arg.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    eprintln!("Building value table for {} states...", space.state_count());
    let mut table = QTable::new(space, &mut rng);
    super::load_weights(&mut table, &arg.weights);

    let scorer = BoardScorer::new(space.playable_height());
    let mut trainer = Trainer::new(table, scorer, TrainerConfig::default(), rng);

    let mut scores = Vec::new();
    let mut invalid_games = 0_u64;
    for game in 1..=arg.games {
        match trainer.test_episode() {
            Some(score) => {
                eprintln!("Game {game}: {score} pieces");
                scores.push(score as f64);
            }
            None if arg.strict => bail!("policy produced an invalid move in game {game}"),
            None => {
                eprintln!("Game {game}: invalid move, skipped");
                invalid_games += 1;
            }
        }
    }

    match DescriptiveStats::new(scores) {
        Some(stats) => {
            eprintln!(
                "Played {} games: min {:.0}, max {:.0}, mean {:.2}, median {:.0}, std dev {:.2}",
                stats.count, stats.min, stats.max, stats.mean, stats.median, stats.std_dev
            );
        }
        None => eprintln!("No completed games to summarize"),
    }
    if invalid_games > 0 {
        eprintln!("Skipped {invalid_games} games with invalid moves");
    }

    Ok(())
}
