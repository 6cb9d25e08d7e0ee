pub mod config;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use error::{GameError, Result};
