//! Scanwise library crate
//!
//! Exposes the streaming pipeline (schema, engine, session, renderers) so
//! benchmarks and tests can drive it without going through CLI startup.

pub mod app;
pub mod component;
pub mod config;
pub mod engine;
pub mod logging;
pub mod motion;
pub mod router;
pub mod schedule;
pub mod schema;
pub mod session;
pub mod stream;
pub mod ui;
