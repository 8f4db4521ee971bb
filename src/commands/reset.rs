use crate::{
    libs::{config::Config, data_storage::DataStorage, messages::Message, registry::PathRegistry},
    msg_success,
};
use anyhow::Result;

/// Clears the install record; the next run starts from discovery again.
pub fn cmd() -> Result<()> {
    let config = Config::read()?;
    PathRegistry::open(&DataStorage::new(), &config.app()).clear();
    msg_success!(Message::RecordCleared);
    Ok(())
}
