//! Tower Middleware
//!
//! Layers the transport layer mounts in front of protected routes.

pub mod auth;

pub use auth::{AuthLayer, AuthService};
