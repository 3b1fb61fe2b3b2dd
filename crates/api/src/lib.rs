//! Storefront API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes) so
//! integration tests and the binary entrypoint can both access them.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod validation;
