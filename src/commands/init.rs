//! Configuration initialization command.
//!
//! Runs the interactive wizard pre-filled with the current (or default)
//! settings and saves the result to the launcher's data directory.

use crate::{
    libs::{config::Config, messages::Message},
    msg_success,
};
use anyhow::Result;

pub fn cmd() -> Result<()> {
    Config::init()?.save()?;
    msg_success!(Message::ConfigSaved);
    Ok(())
}
