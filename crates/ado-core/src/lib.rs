pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod library;
pub mod news;
pub mod platform;
pub mod playback;
pub mod protocol;
pub mod state;
pub mod upload;
