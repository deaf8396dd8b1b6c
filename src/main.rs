use aws_mfa_profile::{app, cli::Args, options::Environment};
use log::error;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // Verbosity comes from the flags; RUST_LOG can still set per-module filters.
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level())
        .init();

    if let Err(e) = app::run(args, Environment::from_env()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
