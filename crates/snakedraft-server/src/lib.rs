// Library root: re-exports all modules so integration tests and the binary
// share the same server code.

pub mod app;
pub mod config;
pub mod ws_server;
