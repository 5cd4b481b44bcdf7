pub mod analytics;
pub mod apps;
pub mod health;
pub mod track;
