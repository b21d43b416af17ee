use std::process::ExitCode;

use exphost::commands::COMMANDS;
use exphost::{logging, CommandRegistry, HostConfig, InitError, RuntimeHost};

fn main() -> ExitCode {
    logging::init();

    let config = match HostConfig::resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("exphost: {e}");
            return ExitCode::FAILURE;
        }
    };
    let registry = match CommandRegistry::new(COMMANDS) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("exphost: {e}");
            return ExitCode::FAILURE;
        }
    };

    // sys.argv is text; undecodable bytes become U+FFFD.
    let args: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let host = match RuntimeHost::create(&args, &registry, &config) {
        Ok(h) => h,
        Err(e) => {
            // A SystemExit already said whatever the application wanted said.
            if !matches!(e, InitError::Exit { .. }) {
                eprintln!("exphost: {e}");
            }
            return ExitCode::from(e.exit_code());
        }
    };
    host.log("Hello from here...");
    host.destroy();
    ExitCode::SUCCESS
}
