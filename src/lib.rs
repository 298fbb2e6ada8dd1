pub mod cfbf;
pub mod chain;
pub mod cli;
pub mod directory;
pub mod encoding;
pub mod error;
pub mod fat;
pub mod header;
pub mod mapping;
pub mod minifat;
pub mod sector;
pub mod stream;
pub mod walker;

#[cfg(test)]
mod test_support;

pub use cfbf::Cfbf;
pub use error::{Error, Result};
