pub mod aggregates;
pub mod circular;
pub mod deviation;
pub mod error;
pub mod frequency;
pub mod generator;
pub mod loader;
pub mod report;
pub mod sensitivity;
pub mod stats;
pub mod types;
pub mod views;
