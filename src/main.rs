use clap::Parser;
use mdq::cli::{self, Cli};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = cli::run(cli, &mut io::stdout().lock());
    if let Err(err) = &result {
        eprintln!("Error: {:#}", err);
    }
    ExitCode::from(cli::exit_status(&result))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "mdq=warn",
        1 => "mdq=info",
        2 => "mdq=debug",
        _ => "mdq=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
