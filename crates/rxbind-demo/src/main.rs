#![forbid(unsafe_code)]

use std::process::ExitCode;

use rxbind_demo::{DemoConfig, logging, run};
use tracing::error;

fn main() -> ExitCode {
    let config = DemoConfig::parse();
    if let Err(err) = logging::init(&config) {
        eprintln!("{err}");
        return exit_code(err.exit_code());
    }

    match run(&config) {
        Ok(reports) => {
            for report in reports {
                println!("== {}", report.scenario.name());
                for line in report.lines {
                    println!("   {line}");
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "demo failed");
            eprintln!("rxbind-demo: {err}");
            exit_code(err.exit_code())
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
