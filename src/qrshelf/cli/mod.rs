//! # CLI Layer
//!
//! One possible UI client for qrshelf. It is the only place that knows about
//! terminal I/O, exit codes and output formatting.
//!
//! ## Behavior
//!
//! Every invocation operates on one collection: generated codes by default,
//! scanned codes with `--scanned`. Positions refer to the revealed window, which
//! starts at one page and grows with `--pages N`.
//!
//! `qrshelf` with no command lists the revealed codes.
//!
//! `scan` with no arguments reads one payload per line from stdin, so a decoder
//! can be piped straight in (`zbarcam --raw | qrshelf scan`).
//!
//! `edit <idx>` without text opens `$EDITOR` on the code's text.
//!
//! ## Environment
//!
//! - `QRSHELF_HOME`: data directory (collections, images, config.json)
//! - `QRSHELF_LOG`: log filter for stderr diagnostics (default `warn`)
//!
//! ## Module Structure
//!
//! - `commands`: Per-command handlers that call the API and print results
//! - `print`: Output formatting (item lines, colored messages)
//! - `setup`: Argument parsing via clap

mod commands;
mod print;
pub mod setup;

pub use commands::run;
