use crate::demo::{run_checkout_report, run_demo, CheckoutReportArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use turnover::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Housekeeping Turnover Service",
    about = "Run and demonstrate the housekeeping turnover service from the command line",
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
    /// Render a checkout report over a seeded demo day
    Report(CheckoutReportArgs),
    /// Run an end-to-end CLI demo covering scheduling, the task lifecycle,
    /// and the deep-clean rotation
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_checkout_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
