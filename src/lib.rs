//! Authenticated pairwise WebSocket relay.
//!
//! A participant opens `/api/v0/chat/{handle}` and every text frame is
//! persisted, then forwarded live to the counterpart if they hold the
//! matching connection.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod websocket;

pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
