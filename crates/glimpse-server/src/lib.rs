pub mod app;
pub mod apps;
pub mod auth;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod state;
