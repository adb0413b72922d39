//! Command-line client for a community package registry, targeting
//! rolling-release distributions that keep user-contributed packages
//! outside the distro's binary repos.
#![deny(unused)]
#![cfg_attr(test, deny(warnings))]

use docopt::Docopt;
use log::debug;
use serde::de::DeserializeOwned;

pub use shell::{ColorConfig, MultiShell, Verbosity};
pub use util::{human, CliError, CliResult, CorralError, CorralResult};

#[macro_export]
macro_rules! bail {
    ($($fmt:tt)*) => {
        return Err($crate::util::human(format!($($fmt)*)))
    };
}

pub mod aggregate;
pub mod archive;
pub mod config;
pub mod json_sink;
pub mod localdb;
pub mod package;
pub mod pool;
pub mod recipe;
pub mod registry;
pub mod render;
pub mod search;
pub mod shell;
pub mod task;
pub mod util;

/// Decode CLI flags from a docopt usage string into a `serde`-deserializable
/// struct (C10).
pub fn flags_from_args<T>(usage: &str, args: &[String]) -> CliResult<T>
where
    T: DeserializeOwned,
{
    Docopt::new(usage)
        .and_then(|d| d.argv(args.iter().map(String::as_str)).deserialize())
        .map_err(|e| {
            let code = if e.fatal() { 1 } else { 0 };
            CliError::new(human(e.to_string()), code)
        })
}

/// Terminate the process according to a `CliError`'s exit code, printing
/// the error (and, in verbose mode, its full cause chain) first.
pub fn handle_error(err: CliError, shell: &mut MultiShell) {
    debug!("handle_error; err={:?}", err);

    let CliError { error, exit_code, unknown } = err;
    let fatal = exit_code != 0;
    let hide = unknown && shell.get_verbose() != Verbosity::Verbose;

    if let Some(error) = error {
        let _ = if hide {
            shell.error("An unknown error occurred")
        } else if fatal {
            shell.error(&error)
        } else {
            shell.say(&error)
        };

        if !handle_cause(error.as_ref(), shell) || hide {
            let _ = shell.say("\nTo learn more, run the command again with --verbose.");
        }
    }

    std::process::exit(exit_code);
}

fn handle_cause(mut corral_err: &dyn CorralError, shell: &mut MultiShell) -> bool {
    let verbose = shell.get_verbose();
    loop {
        corral_err = match corral_err.corral_cause() {
            Some(cause) => cause,
            None => break,
        };
        if verbose != Verbosity::Verbose && !corral_err.is_human() {
            return false;
        }
        let _ = shell.say(format!("\nCaused by:\n  {}", corral_err));
    }
    true
}

pub fn version() -> String {
    format!(
        "corral {}",
        match option_env!("CFG_VERSION") {
            Some(s) => s.to_string(),
            None => format!(
                "{}.{}.{}{}",
                env!("CARGO_PKG_VERSION_MAJOR"),
                env!("CARGO_PKG_VERSION_MINOR"),
                env!("CARGO_PKG_VERSION_PATCH"),
                option_env!("CARGO_PKG_VERSION_PRE").unwrap_or("")
            ),
        }
    )
}
