use std::env::args_os;
use std::process::ExitCode;

use cv_imshow::{run, CLIParser};

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match run(&arguments) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            eprintln!("{} command(s) failed", failures);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("cv-imshow failed because of: {}", e);
            ExitCode::FAILURE
        }
    }
}
