pub mod api;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
