//! permit - file permission requests against a department directory

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = permit_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
