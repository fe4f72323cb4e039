pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::OvationConfig;
pub use error::{OvationError, Result};
pub use events::EngineEvent;
pub use types::*;
