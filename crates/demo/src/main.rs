//! Hook demo CLI.
//!
//! Runs the hello-world, priority and replacement scenarios against one
//! shared registry and prints what each call returns.
//!
//! # Usage
//!
//! ```bash
//! WIREHOOK_LOG=wirehook_core=trace WIREHOOK_LOG_FORMAT=compact greet
//! ```

use std::sync::Arc;

use wirehook::BoxError;
use wirehook::prelude::*;

type Scenario = fn(&Arc<HookRegistry>) -> Result<Vec<String>, BoxError>;

fn main() {
    let log_config = TracingConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    log_config.init();

    let hooks = Arc::new(HookRegistry::new());

    let scenarios: [(&str, Scenario); 3] = [
        ("hello world", demo::hello_world),
        ("hook priority", demo::priorities),
        ("replacement", demo::replacement),
    ];

    for (title, scenario) in scenarios {
        println!("----------- {title} -----------");
        match scenario(&hooks) {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    tracing::debug!(hooks = hooks.len(), "Demo finished");
}
