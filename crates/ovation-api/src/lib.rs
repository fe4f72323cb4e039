//! Ovation API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Provides the REST API for the Ovation application: batch trigger,
//! quota and statistics summaries, settings, debug controls, and the
//! live event stream.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
