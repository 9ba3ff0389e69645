pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod graph;
pub mod images;
pub mod loader;
pub mod output;
pub mod session;
pub mod tui;
pub mod view;
