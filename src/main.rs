//! resetpv entry point
//!
//! Parses arguments and runs via `cli::run`, prints errors to stderr and
//! exits non-zero on failure.

use resetpv::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
