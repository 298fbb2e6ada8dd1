//! Error types shared across the parser.
//!
//! Kinds follow the CFBF spec's own taxonomy: I/O failures opening or
//! mapping the file, format violations (bad signature/BOM/impossible
//! index), structural inconsistencies (chain cycles, count mismatches),
//! failed path lookups, misuse of the stream reader, and UTF-16/UTF-8
//! conversion failures in the display shell.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error: {0}")]
    Format(String),

    #[error("structure error: {0}")]
    Structure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("misuse: {0}")]
    Misuse(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
