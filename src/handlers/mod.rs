pub mod analytics;
pub mod portfolio;
