use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use tetriq_agent::{BoardScorer, QTable, Trainer, TrainerConfig};
use tetriq_stats::descriptive::DescriptiveStats;

use crate::{
    command::SpaceArg,
    model::training_report::{ScoreSummary, TrainingReport},
    util::Output,
};

const LOG_INTERVAL: u64 = 1_000;
const CHECKPOINT_INTERVAL: u64 = 10_000;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of training games to play
    #[arg(long, default_value_t = 100_000)]
    games: u64,

    #[clap(flatten)]
    space: SpaceArg,

    /// Seed for a reproducible run; omit for an OS-seeded one
    #[arg(long)]
    seed: Option<u64>,

    /// Weights file to resume from
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where to write the learned weights
    #[arg(long, default_value = "tetriq-weights.txt")]
    weights_out: PathBuf,

    /// Model name recorded in the training report
    #[arg(long, default_value = "tetriq-q")]
    name: String,

    /// Write the JSON training report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let space = arg.space.to_space();
    let mut rng = match arg.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    eprintln!("Building value table for {} states...", space.state_count());
    let mut table = QTable::new(space, &mut rng);
    if let Some(path) = &arg.load {
        super::load_weights(&mut table, path);
    }

    let scorer = BoardScorer::new(space.playable_height());
    let mut trainer = Trainer::new(table, scorer, TrainerConfig::default(), rng);

    let mut train_scores = Vec::new();
    let mut test_scores = Vec::new();
    for game in 1..=arg.games {
        let score = trainer.train_episode();
        train_scores.push(score as f64);
        trainer.train_table();

        if game % LOG_INTERVAL == 0 {
            let epsilon = trainer.epsilon();
            match trainer.test_episode() {
                Some(test) => {
                    test_scores.push(test as f64);
                    eprintln!("Game {game}: train {score}, test {test}, epsilon {epsilon:.3}");
                }
                None => {
                    eprintln!("Game {game}: train {score}, test invalid, epsilon {epsilon:.3}");
                }
            }
        }
        if game % CHECKPOINT_INTERVAL == 0 {
            trainer.table().save(&arg.weights_out).with_context(|| {
                format!("Failed to save weights to {}", arg.weights_out.display())
            })?;
            eprintln!("Saved weights after game {game}");
        }
    }

    trainer
        .table()
        .save(&arg.weights_out)
        .with_context(|| format!("Failed to save weights to {}", arg.weights_out.display()))?;
    eprintln!("Weights saved to {}", arg.weights_out.display());

    let report = TrainingReport {
        name: arg.name.clone(),
        trained_at: Utc::now(),
        games: arg.games,
        state_count: space.state_count(),
        final_epsilon: trainer.epsilon(),
        train_scores: DescriptiveStats::new(train_scores)
            .as_ref()
            .map(ScoreSummary::from),
        test_scores: DescriptiveStats::new(test_scores)
            .as_ref()
            .map(ScoreSummary::from),
    };
    Output::save_json(&report, arg.report.clone())?;

    Ok(())
}
