pub mod app;
pub mod auth;
pub mod config;
pub mod contacts;
pub mod error;
pub mod state;
pub mod validate;
