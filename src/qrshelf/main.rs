//! # QRShelf CLI
//!
//! The CLI lives in `cli/`; this file only invokes `cli::run()` and handles
//! process termination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (src/qrshelf/cli/)                               │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + dispatch (commands.rs)                  │
//! │  - Terminal output (print.rs)                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (src/qrshelf/api.rs)                             │
//! │  - Positions → ids, structured `CmdResult` values           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors from any layer end up here: printed as `Error: <message>` on stderr,
//! exit code 1.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
