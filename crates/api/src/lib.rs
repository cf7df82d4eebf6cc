//! HTTP API: configuration, routing, auth middleware and response mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
