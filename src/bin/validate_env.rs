use std::path::PathBuf;
use std::process::ExitCode;

use cv_rag::env_check::{load_env_file, EnvReport};
use cv_rag::logging;

fn main() -> ExitCode {
    logging::init();
    let candidates = [PathBuf::from(".env"), PathBuf::from("../.env")];
    match load_env_file(&candidates) {
        Some(path) => println!("loaded {}", path.display()),
        None => println!("no .env file found; checking the process environment"),
    }

    let report = EnvReport::from_process_env();
    print!("{}", report.render());
    if report.is_ok() {
        println!("\nall required keys are defined");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
