use crate::{
    libs::{config::Config, data_storage::DataStorage, messages::Message, orchestrator::Session},
    msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Game install directory; prompts when omitted
    path: Option<PathBuf>,

    /// Probe the well-known install locations instead
    #[arg(short, long, conflicts_with = "path")]
    detect: bool,
}

pub fn cmd(args: PathArgs) -> Result<()> {
    let config = Config::read()?;
    let (mut session, _events) = Session::open(&config, &DataStorage::new())?;

    if args.detect {
        // Found and not-found are both reported by the registry.
        session.detect_install_path();
        return Ok(());
    }

    let path = match args.path {
        Some(path) => path,
        None => {
            let default = session.registry().default_path().display().to_string();
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptInstallPath.to_string())
                .default(default)
                .interact_text()?;
            PathBuf::from(input.trim())
        }
    };

    let installed = session.choose_install_path(&path);
    msg_success!(Message::InstallPathSet(path.display().to_string()));
    if !installed {
        msg_warning!(Message::InstallPathWithoutExecutable(path.display().to_string()));
    }
    Ok(())
}
