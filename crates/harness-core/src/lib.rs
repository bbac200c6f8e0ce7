pub mod aggregate;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod frontmatter;
pub mod health;
pub mod insights;
pub mod io;
pub mod memory_service;
pub mod paths;
pub mod plans;
pub mod source;
pub mod tokens;
pub mod types;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregate::Analyzer;
pub use error::{HarnessError, Result};
