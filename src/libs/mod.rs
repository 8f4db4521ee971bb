//! Core library modules for the ferry launcher.
//!
//! ## Features
//!
//! - **Core Infrastructure**: configuration, data storage, messaging, errors
//! - **Release Resolution**: catalog access, channel filtering, version comparison
//! - **Install State**: persisted install record and install-location discovery
//! - **Update Pipeline**: streaming download, silent installer, launcher self-update
//! - **Hand-off**: detached start of the managed application
//! - **Flow**: the orchestrator state machine and its terminal rendering
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ferry::libs::config::Config;
//! use ferry::libs::data_storage::DataStorage;
//! use ferry::libs::orchestrator::{FlowOutcome, Session};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let (mut session, _events) = Session::open(&Config::read()?, &DataStorage::new())?;
//! if let FlowOutcome::UpToDate(_) = session.start().await? {
//!     session.launch().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data_storage;
pub mod discovery;
pub mod download;
pub mod error;
pub mod installer;
pub mod launcher;
pub mod messages;
pub mod metadata;
pub mod orchestrator;
pub mod registry;
pub mod release;
pub mod self_update;
pub mod view;
