use crate::demo::{run_demo, run_sync_drill, DemoArgs, SyncDrillArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use witchcity::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "WitchCityRope",
    about = "Run the WitchCityRope community service or walk through its workflows",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk an applicant through vetting, the RSVP guard, and door check-in
    Demo(DemoArgs),
    /// Stage offline door check-ins and reconcile them against the live roster
    Sync(SyncDrillArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load demo members, events, and registrations before serving
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Sync(args) => run_sync_drill(args),
    }
}
