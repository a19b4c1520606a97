//! Binary entry point for the invokerd executor.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match invokerd::run_executor() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr().lock(), "invokerd: {error}");
            ExitCode::FAILURE
        }
    }
}
