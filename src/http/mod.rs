//! HTTP server runtime.
//!
//! Binds the listener and serves the router until SIGTERM/SIGINT, then drains
//! in-flight requests before returning.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
