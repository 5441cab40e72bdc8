pub mod control;
pub mod health;
pub mod report;
