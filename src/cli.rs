//! Command-line argument definitions and validation.
//!
//! `Args` is the raw `clap` surface; `Config` is what actually drives
//! `main` once at-most-one-action and path-normalization rules have been
//! applied. Keeping the two separate mirrors how the original C `main()`
//! first parses with `getopt` and only afterwards checks
//! `num_command_options`.

use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

/// Compound File Binary File format analyser.
///
/// With no action flag, prints header fields and exits.
#[derive(Parser, Debug)]
#[command(name = "cfbf", version, about = "Compound File Binary File format analyser")]
pub struct Args {
    /// File to analyse.
    pub input_file: PathBuf,

    /// List directory tree.
    #[arg(short = 'l')]
    pub list: bool,

    /// Dump the object with this path to the output file
    /// (e.g. "Root Entry/Quill/QuillSub/CONTENTS").
    #[arg(short = 'r', value_name = "PATH")]
    pub dump_path: Option<String>,

    /// Extract TEXT section from the CONTENTS object, write to output file.
    #[arg(short = 't')]
    pub extract_text: bool,

    /// Walk FAT structure, highlight any problems.
    #[arg(short = 'w')]
    pub walk: bool,

    /// [with -t] Path to use for the CONTENTS object.
    #[arg(short = 'c', value_name = "PATH", default_value = "Root Entry/Quill/QuillSub/CONTENTS")]
    pub contents_path: String,

    /// Output file name (default is stderr for -w, stdout otherwise).
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Be less verbose.
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// [with -t] Don't convert text to UTF-8 for output, keep as UTF-16.
    #[arg(short = 'u')]
    pub keep_utf16: bool,

    /// Be more verbose.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// The single action requested on the command line, or `Header` when none
/// of `-l/-r/-t/-w` was given.
#[derive(Debug, Clone)]
pub enum Action {
    Header,
    List,
    Dump(String),
    ExtractText(String),
    Walk,
}

#[derive(Debug)]
pub struct Config {
    pub input_file: PathBuf,
    pub action: Action,
    pub output: Option<String>,
    pub convert_to_utf8: bool,
    pub log_level: log::LevelFilter,
}

impl Config {
    /// Validates `args` into a `Config`, enforcing "at most one of -l, -r,
    /// -t, -w" the same way the original's `num_command_options` check does.
    pub fn from_args(args: Args) -> Result<Self> {
        let mut chosen: Vec<Action> = Vec::new();
        if args.list {
            chosen.push(Action::List);
        }
        if let Some(path) = &args.dump_path {
            let trimmed = path.trim_start_matches('/').to_string();
            chosen.push(Action::Dump(trimmed));
        }
        if args.extract_text {
            chosen.push(Action::ExtractText(args.contents_path.clone()));
        }
        if args.walk {
            chosen.push(Action::Walk);
        }

        if chosen.len() > 1 {
            return Err(Error::Misuse(
                "only one of -r, -l, -t and -w may be given. Use -h for help.".into(),
            ));
        }

        let action = chosen.into_iter().next().unwrap_or(Action::Header);

        let verbosity = i32::from(args.verbose) - i32::from(args.quiet);
        let log_level = match verbosity {
            i32::MIN..=-1 => log::LevelFilter::Error,
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        Ok(Config {
            input_file: args.input_file,
            action,
            output: args.output,
            convert_to_utf8: !args.keep_utf16,
            log_level,
        })
    }
}
