pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod models;
pub mod observability;
pub mod state;
pub mod store;
