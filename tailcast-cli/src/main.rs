use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod serve;

#[derive(Parser)]
#[command(
    name = "tailcast",
    about = "Tail a logfile and stream new lines over TCP to connected clients"
)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    serve: serve::ServeArgs,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    serve::run(cli.serve).await
}
