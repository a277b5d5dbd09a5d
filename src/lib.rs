// ABOUTME: Library root for lambdeploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod build;
pub mod config;
pub mod deploy;
pub mod desired;
pub mod diagnostics;
pub mod error;
pub mod hooks;
pub mod output;
pub mod platform;
pub mod reconcile;
pub mod types;
