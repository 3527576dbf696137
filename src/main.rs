use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use ampsassist::{
    cli::{self, SyncOptions},
    config::{self, Settings},
    error,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run one sync cycle
    Sync(SyncArgs),

    /// Run a sync cycle now and then on every interval
    Watch(SyncArgs),

    /// Evict library files no manifest or protected playlist references
    Clean(CleanArgs),

    /// Mirror the manifests on disk to Plex
    Plex(QuietArgs),

    /// Show manifests, library size and Plex playlists
    Info,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SyncArgs {
    /// Skip the Plex mirror; protected playlists are still read
    #[clap(long)]
    pub no_remote: bool,

    /// Keep unreferenced files this time
    #[clap(long)]
    pub no_evict: bool,

    /// Hide progress bars
    #[clap(long, short)]
    pub quiet: bool,
}

impl From<SyncArgs> for SyncOptions {
    fn from(args: SyncArgs) -> Self {
        SyncOptions {
            no_remote: args.no_remote,
            no_evict: args.no_evict,
            quiet: args.quiet,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CleanArgs {
    /// List what would be deleted without deleting
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct QuietArgs {
    /// Hide progress spinners
    #[clap(long, short)]
    pub quiet: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    match cli.command {
        Command::Sync(args) => cli::sync(&settings, args.into()).await,
        Command::Watch(args) => cli::watch(&settings, args.into()).await,
        Command::Clean(args) => cli::clean(&settings, args.dry_run).await,
        Command::Plex(args) => {
            let options = SyncOptions {
                quiet: args.quiet,
                ..Default::default()
            };
            cli::plex(&settings, options.show_progress()).await
        }
        Command::Info => cli::info(&settings).await,
        Command::Completions(_) => {}
    }
}
