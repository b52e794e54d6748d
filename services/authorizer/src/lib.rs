//! Warden authorizer service library.
//!
//! Wires the decision engine from `warden-authz` to its collaborators: env
//! configuration, tracing, the remote key-set source, and the api-key secret
//! store. `main.rs` only parses config and serves the router built here.

pub mod app;
pub mod config;
pub mod fetch;
pub mod observability;
pub mod secrets;
