//! MiniFlix backend: video catalog browsing, wishlists and playback tracking
//! over a JSON HTTP API.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod services;

pub use app::{AppState, build_app};
