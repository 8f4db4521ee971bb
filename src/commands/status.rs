use crate::libs::{config::Config, data_storage::DataStorage, orchestrator::Session, view::View};
use anyhow::Result;

pub fn cmd() -> Result<()> {
    let config = Config::read()?;
    let (session, _events) = Session::open(&config, &DataStorage::new())?;
    View::status(&session.status());
    Ok(())
}
