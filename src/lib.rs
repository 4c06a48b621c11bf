pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
pub use app::{router, serve, AppState};
pub use config::{ServerConfig, Settings};
pub use crate::core::{decode, encode, encode_json, Roster};
pub use utils::error::{AppError, Result};
