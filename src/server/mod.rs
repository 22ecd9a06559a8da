//! HTTP server: state, handlers and router assembly

pub mod builder;
pub mod handlers;
pub mod state;

pub use builder::{ServerBuilder, build_router};
pub use state::AppState;
