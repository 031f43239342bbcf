use clap::Parser;

use fulltext::cli::{run, Cli};
use fulltext::observability::init_logging;

fn main() -> std::process::ExitCode {
    init_logging();
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match run(cli, &mut stdout) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
