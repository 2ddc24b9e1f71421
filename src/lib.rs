pub mod alerts;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod executor;
pub mod health;
pub mod history;
pub mod run_guard;
pub mod scheduler;
pub mod web;
