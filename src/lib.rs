//! # Ferry - self-updating application launcher
//!
//! Keeps a companion application up to date and starts it.
//!
//! ## Features
//!
//! - **Release Channels**: launcher and application releases share one catalog
//! - **Silent Updates**: download with progress, unattended installer run
//! - **Install Discovery**: finds the application in well-known locations
//! - **Detached Launch**: the application outlives the launcher
//! - **Self-Update**: the launcher replaces its own binary and restarts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ferry::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod libs;
