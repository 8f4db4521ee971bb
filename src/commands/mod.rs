pub mod check;
pub mod init;
pub mod launch;
pub mod path;
pub mod reset;
pub mod run;
pub mod status;
pub mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Update the launcher and the game, then offer to launch it")]
    Run(run::RunArgs),
    #[command(about = "Check for a game update and install it")]
    Check,
    #[command(about = "Install any pending game update and launch the game")]
    Launch,
    #[command(about = "Set or detect the game install path")]
    Path(path::PathArgs),
    #[command(about = "Show the game installation status")]
    Status,
    #[command(about = "Forget the game install path and version")]
    Reset,
    #[command(about = "Update the launcher to the latest version")]
    Update,
    #[command(about = "Configuration initialization")]
    Init,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Run(args) => run::cmd(args).await,
            Commands::Check => check::cmd().await,
            Commands::Launch => launch::cmd().await,
            Commands::Path(args) => path::cmd(args),
            Commands::Status => status::cmd(),
            Commands::Reset => reset::cmd(),
            Commands::Update => update::cmd().await,
            Commands::Init => init::cmd(),
        }
    }
}
