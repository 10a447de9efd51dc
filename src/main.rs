//! yamlcontent - YAML document storage from the command line

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = yaml_content::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
