//! Autolens API Server module
//!
//! Provides the HTTP REST API over in-memory dataset sessions.
//! Run with `autolens-server`.

pub mod handlers;
pub mod server;
pub mod session;

pub use server::{router, run_api_server};
