//! Configuration loaded from the per-user `config.toml`.

pub mod settings;

pub use settings::{app_dir, Settings};
