//! Diagnostic logging via the `log` facade and `env_logger` backend.
//!
//! Level resolution, highest priority first:
//!
//! 1. `RUST_LOG` environment variable
//! 2. `--quiet` → errors only
//! 3. `-v` → debug, `-vv` → trace
//! 4. default → warn, so normal CLI output stays clean
//!
//! Log lines go to stderr; command output goes to stdout.

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging. Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    let _ = builder.try_init();
}

/// Map CLI verbosity flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
