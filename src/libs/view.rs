use super::download::format_bytes;
use super::messages::Message;
use super::orchestrator::{LauncherEvent, OrchestratorState, SessionStatus, StatusEvent};
use crate::{msg_error, msg_info, msg_print, msg_success};
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn status(status: &SessionStatus) {
        let mut table = Table::new();
        let install = &status.install;
        let display = |path: &Option<std::path::PathBuf>| path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string());
        let installed = if install.installed { "yes" } else { "no" };
        let last_check = install
            .last_checked_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());

        table.add_row(row!["STATE", status.state]);
        table.add_row(row!["INSTALL PATH", display(&install.install_path)]);
        table.add_row(row!["EXECUTABLE", display(&install.executable_path)]);
        table.add_row(row!["INSTALLED", installed]);
        table.add_row(row!["VERSION", install.version]);
        table.add_row(row!["LAST CHECK", last_check]);
        table.add_row(row!["DEFAULT PATH", install.default_path.display()]);

        msg_print!(Message::StatusTitle, true);
        table.printstd();
    }

    /// Terminal rendering of markdown release notes: markers stripped, bullets normalized.
    pub fn release_notes(notes: &str) -> String {
        notes
            .lines()
            .map(|line| {
                let trimmed = line.trim_start();
                let indent = &line[..line.len() - trimmed.len()];
                if let Some(heading) = trimmed.strip_prefix('#') {
                    heading.trim_start_matches('#').trim().to_uppercase()
                } else if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
                    format!("{}• {}", indent, strip_emphasis(item))
                } else {
                    format!("{}{}", indent, strip_emphasis(trimmed))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_string()
    }
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "").replace('`', "")
}

/// Prints status events; download progress only in 10 % steps, repeated messages once.
#[derive(Debug, Default)]
pub struct EventPrinter {
    last_progress: Option<(OrchestratorState, u8)>,
    last_message: Option<String>,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, event: &LauncherEvent) {
        match event {
            LauncherEvent::Status(status) => self.print_status(status),
            LauncherEvent::Ready(ready) => tracing::debug!(ready, "ready to launch"),
        }
    }

    fn print_status(&mut self, event: &StatusEvent) {
        let fresh = match event.progress {
            Some(progress) => self.progress_advanced(event.status, progress),
            None => self.last_message.as_deref() != Some(event.message.as_str()),
        };
        if !fresh {
            return;
        }
        self.last_message = Some(event.message.clone());

        match event.status {
            OrchestratorState::Error => msg_error!(event.message),
            OrchestratorState::UpToDate | OrchestratorState::GameLaunched => msg_success!(event.message),
            _ => msg_info!(event.message),
        }

        if let Some(context) = &event.context {
            let size = context.file_size.map(format_bytes).unwrap_or_else(|| "-".to_string());
            msg_print!(format!(
                "{} ({})\n{}",
                Message::ReleaseNotesHeader(context.latest_version.to_string()),
                size,
                View::release_notes(&context.release_notes)
            ));
        }
    }

    fn progress_advanced(&mut self, state: OrchestratorState, progress: u8) -> bool {
        let advanced = match self.last_progress {
            Some((last_state, last)) if last_state == state => (progress == 100 && last < 100) || progress >= last.saturating_add(10),
            _ => true,
        };
        if advanced {
            self.last_progress = Some((state, progress));
        }
        advanced
    }
}
