pub mod classifier;
pub mod contract;
pub mod history;
pub mod join;
pub mod metrics;
pub mod report;
pub mod rollover;
