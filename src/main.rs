use hashcheck::cli::Cli;
use hashcheck::logging;
use hashcheck::theme::Theme;
use std::process::ExitCode;

/// Exit code for any error, distinct from "differences found"
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match cli.run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", Theme::error("Error:"), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
