use chrono::{DateTime, Utc};
use serde::Serialize;
use tetriq_stats::descriptive::DescriptiveStats;

/// JSON summary of a training run, written alongside the weights file.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TrainingReport {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub games: u64,
    pub state_count: usize,
    pub final_epsilon: f64,
    pub train_scores: Option<ScoreSummary>,
    pub test_scores: Option<ScoreSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScoreSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl From<&DescriptiveStats> for ScoreSummary {
    fn from(stats: &DescriptiveStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.std_dev,
        }
    }
}
