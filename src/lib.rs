pub mod accounts;
pub mod app;
pub mod config;
pub mod error;
pub mod flash;
pub mod render;
pub mod resume;
pub mod state;
