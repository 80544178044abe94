//! # tasktrack API Server Library
//!
//! This library provides the core functionality for the tasktrack API server.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and the manager gate
//! - `config`: Layered configuration
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Credential and path id extractors
//! - `lifecycle`: Serving, draining and stopping the listener
//! - `metrics`: Request counters
//! - `middleware`: Request observer and panic recovery
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod metrics;
pub mod middleware;
pub mod routes;
