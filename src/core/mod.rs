pub mod auth;
pub mod badge;
pub mod client;
pub mod config;
pub mod formatter;
pub mod models;
pub mod monitor;
pub mod pacing;
pub mod panel;
pub mod store;
pub mod tier;
