pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod export;
pub mod layout;
pub mod processing;
pub mod render;
pub mod sample;
pub mod server;
pub mod state;
pub mod types;
