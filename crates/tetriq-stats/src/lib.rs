//! Statistical summaries for training and evaluation runs.
//!
//! Currently limited to [`descriptive::DescriptiveStats`], which condenses a
//! batch of episode scores into the usual central-tendency and dispersion
//! measures.
//!
//! # Examples
//!
//! ```
//! use tetriq_stats::descriptive::DescriptiveStats;
//!
//! let scores = [12.0, 7.0, 31.0, 18.0, 22.0];
//! let stats = DescriptiveStats::new(scores).unwrap();
//! assert_eq!(stats.min, 7.0);
//! assert_eq!(stats.max, 31.0);
//! ```

pub mod descriptive;
