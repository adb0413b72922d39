//! General purpose utility functions and structures
pub use self::errors::{
    caused_human, human, internal, ChainError, CliError, CliResult, CorralError, CorralResult,
};
pub use self::paths::{expand_tilde, read};

pub mod errors;
pub mod paths;
