pub mod analytics;
pub mod budget;
pub mod goal_seek;
pub mod planner;
pub mod portfolio;
pub mod valuation;
