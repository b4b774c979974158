use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qrshelf", bin_name = "qrshelf", version)]
#[command(about = "Generate, scan and organize QR codes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Operate on scanned codes instead of generated ones
    #[arg(short, long, global = true, help_heading = "Options")]
    pub scanned: bool,

    /// Number of pages to reveal before running the command
    #[arg(
        short,
        long,
        global = true,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..),
        help_heading = "Options"
    )]
    pub pages: u32,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Generate a QR code from text
    #[command(alias = "g", display_order = 1)]
    Generate {
        /// Text words (joined with spaces)
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Add decoded payloads as scanned codes (one per line on stdin if none given)
    #[command(display_order = 2)]
    Scan { payloads: Vec<String> },

    /// List the revealed codes
    #[command(alias = "ls", display_order = 3)]
    List,

    /// Select codes by position
    #[command(display_order = 10)]
    Select {
        /// Positions (e.g. 1 3 5-7)
        #[arg(required_unless_present = "all", num_args = 1..)]
        indexes: Vec<String>,

        /// Select every revealed code
        #[arg(long, conflicts_with = "indexes")]
        all: bool,
    },

    /// Deselect codes by position
    #[command(display_order = 11)]
    Deselect {
        /// Positions (e.g. 1 3 5-7)
        #[arg(required_unless_present = "all", num_args = 1..)]
        indexes: Vec<String>,

        /// Deselect every revealed code
        #[arg(long, conflicts_with = "indexes")]
        all: bool,
    },

    /// Edit a code's text (opens the editor when no text is given)
    #[command(alias = "e", display_order = 12)]
    Edit {
        /// Position of the code
        index: String,

        /// New text words (joined with spaces)
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Delete codes by position, or the current selection
    #[command(alias = "rm", display_order = 13)]
    Delete {
        /// Positions (e.g. 1 3 5-7)
        #[arg(required_unless_present = "selected", num_args = 1..)]
        indexes: Vec<String>,

        /// Delete the selected codes
        #[arg(long, conflicts_with = "indexes")]
        selected: bool,
    },

    /// Write a code's QR image to a PNG file
    #[command(display_order = 14)]
    Image {
        /// Position of the code
        index: String,

        /// Output file
        output: PathBuf,
    },

    /// Copy the selected scanned codes into the generated codes
    #[command(name = "move", display_order = 20)]
    Move,

    /// Save the selected codes' images to the photo directory
    #[command(display_order = 21)]
    Export,

    /// Get or set configuration
    #[command(display_order = 30)]
    Config {
        /// Configuration key (batch-size, qr-scale, photo-dir)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
