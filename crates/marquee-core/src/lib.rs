//! Marquee Core: movie records, ranking, snapshot cache, configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod ranking;
pub mod storage;

pub use config::AppConfig;
pub use error::{CoreError, Result};
pub use models::*;

pub use ranking::rank;
pub use storage::snapshot::{is_fresh, load_snapshot, save_snapshot};
