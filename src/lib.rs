//! Markdown preview with watch-and-regenerate.
//!
//! Pipeline: [`watcher::FileWatcher`] (directory watch + debounce) feeds
//! [`session::watch_loop`], which runs one [`regen::Regenerate`] at a time.

pub mod app;
pub mod cli;
pub mod config;
pub mod opener;
pub mod output;
pub mod regen;
pub mod render;
pub mod session;
pub mod watcher;
pub mod writer;
