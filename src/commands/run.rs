//! Interactive update-and-launch flow.
//!
//! Drives a [`Session`] from startup to hand-off: launcher self-update, game
//! update, then the launch. Status events are printed while each step runs.
//! The user confirms the launch (unless `--launch` or `auto_launch` is set)
//! and is offered a retry after a failure. Ctrl+C stops the launcher; an
//! installer still running is killed with it, a launched game is not.

use crate::{
    libs::{
        config::Config,
        data_storage::DataStorage,
        messages::Message,
        orchestrator::{EventReceiver, FlowOutcome, Session},
        self_update,
        view::EventPrinter,
    },
    msg_error, msg_info, msg_warning,
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::future::Future;
use std::path::Path;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Launch the game without asking once it is up to date
    #[arg(short, long)]
    launch: bool,
}

pub async fn cmd(args: RunArgs) -> Result<()> {
    let config = Config::read()?;
    let (mut session, mut events) = Session::open(&config, &DataStorage::new())?;
    let mut printer = EventPrinter::new();
    let auto_launch = args.launch || config.launcher().auto_launch;

    let Some(outcome) = follow(session.start(), &mut events, &mut printer).await else {
        return Ok(());
    };
    let mut ready = match outcome {
        Ok(FlowOutcome::Restart(executable)) => return restart(&executable),
        Ok(FlowOutcome::UpToDate(_)) => true,
        Err(_) => false,
    };

    loop {
        if ready {
            if !auto_launch && !confirm(Message::ConfirmLaunch, true)? {
                return Ok(());
            }
            match follow(session.launch(), &mut events, &mut printer).await {
                None | Some(Ok(_)) => return Ok(()),
                Some(Err(_)) => {}
            }
        }

        if !confirm(Message::ConfirmRetry, false)? {
            return Ok(());
        }
        match follow(session.check_for_updates(), &mut events, &mut printer).await {
            None => return Ok(()),
            Some(result) => ready = result.is_ok(),
        }
    }
}

/// Runs `flow` while printing its events; `None` when interrupted by Ctrl+C.
///
/// Dropping `flow` on interrupt kills an installer it may be awaiting.
pub(crate) async fn follow<F: Future>(flow: F, events: &mut EventReceiver, printer: &mut EventPrinter) -> Option<F::Output> {
    tokio::pin!(flow);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut listening = true;

    loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => printer.print(&event),
            output = &mut flow => {
                while let Ok(event) = events.try_recv() {
                    printer.print(&event);
                }
                return Some(output);
            }
            signal = &mut interrupt, if listening => match signal {
                Ok(()) => {
                    msg_warning!(Message::ReceivedCtrlC);
                    msg_info!(Message::FlowInterrupted);
                    return None;
                }
                Err(e) => {
                    msg_error!(Message::CtrlCListenFailed(e.to_string()));
                    listening = false;
                }
            },
        }
    }
}

fn confirm(prompt: Message, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt.to_string())
        .default(default)
        .interact()?)
}

/// Hands over to the freshly installed launcher binary.
fn restart(executable: &Path) -> Result<()> {
    msg_info!(Message::RestartingLauncher);
    if let Err(e) = self_update::restart(executable) {
        msg_error!(e.user_message());
    }
    Ok(())
}
