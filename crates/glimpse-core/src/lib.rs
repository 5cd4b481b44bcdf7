pub mod analytics;
pub mod application;
pub mod config;
pub mod error;
pub mod event;
pub mod store;
pub mod window;
