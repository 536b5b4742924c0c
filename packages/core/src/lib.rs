// Library root. Exposes the modules for the binary and for integration
// tests in `tests/`. Production entry point remains `src/main.rs`.

pub mod api;
pub mod db;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod services;
pub mod types;

// Only needed by the binary, kept public so tests can reach them.
pub mod cli;
pub mod config;
pub mod logging;
