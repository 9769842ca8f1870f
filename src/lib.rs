pub mod cli;
pub mod coerce;
pub mod config;
pub mod entity;
pub mod error;
pub mod http;
pub mod input;
pub mod lifecycle;
pub mod photos;
pub mod stats;
pub mod storage;

pub use config::{Config, Project};
pub use error::{HumidorError, Result};
pub use lifecycle::TastingEngine;
pub use stats::{compute_dashboard_stats, DashboardStats};
pub use storage::SqliteStore;
