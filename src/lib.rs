// src/lib.rs
pub mod banner;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod poller;
pub mod shell;
pub mod views;
