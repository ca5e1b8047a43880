//! HTTP and WebSocket surface (feature `web`)

mod server;

pub mod routes;
pub mod state;
pub mod utils;

pub use server::{bind_listener, build_app, serve};
pub use state::AppState;
