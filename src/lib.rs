pub mod analysis;
pub mod config;
pub mod data;
pub mod output;
pub mod pipeline;
pub mod types;
