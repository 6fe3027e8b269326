//! UI layer for desktop GUI: app shell, upload panel and result panel.

pub mod app;

pub use app::{ClassifierApp, StartupConfig};
