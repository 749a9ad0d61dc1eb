pub mod auth;
pub mod clear;
pub mod config;
pub mod context;
pub mod daemon;
pub mod invalidate;
pub mod prompts;
pub mod status;
pub mod sync;
pub mod sync_ui;
