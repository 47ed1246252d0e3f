pub(crate) mod training_report;
