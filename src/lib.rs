//! A subcommand tree argument parser.
//!
//! Flags are typed cells bound to a [`Handle`] at construction time. A flag
//! may be given on the command line by its short or long name, by one of its
//! deprecated aliases, or through an environment variable. The matched
//! command's action runs only once every required flag is present and every
//! validator has accepted its value.
//!
//! ```no_run
//! use argtree::{Cli, Command, Flag};
//!
//! let (flag, port) = Flag::int(8091).short("p").long("port").desc("Port to bind").build();
//! let mut serve = Command::new("serve", "Start the server");
//! serve.add_flag(flag);
//! serve.set_action(move || println!("serving on {}", port.get()));
//!
//! let mut cli = Cli::new("demo", "A demo program");
//! cli.add_command(serve);
//! cli.run_or_exit();
//! ```

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

mod args;
mod cli;
mod command;
mod flag;
mod usage;
mod validators;
mod value;

use std::fmt;

pub use crate::{
    cli::{Cli, Environment, ProcessEnv},
    command::Command,
    flag::{
        ca_cert_flag, default_option_handler, host_flag, no_ssl_verify_flag,
        password_option_handler, password_flag, username_flag, Flag, FlagBuilder, OptionHandler,
        Taken, Validator,
    },
    validators::{host_validator, HostError, HostErrorKind},
    value::{FromValue, Handle, Value, ValueError},
};

pub use argtree_term::{man::ManError, passwd::PasswdError};

/// Error type returned by validators and option handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Process exit codes. Values other than zero follow `sysexits.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    CliUsageError = 64,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// A command tree that can't be run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Found multiple flags defined for `{0}`")]
    DuplicateFlag(String),
}

/// Reasons a parse stops short of dispatching. Each is printed followed by
/// the usage text of the command being parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid subcommand `{0}`")]
    InvalidSubcommand(String),
    #[error("Expected flag: {0}")]
    ExpectedFlag(String),
    #[error("Unknown flag: {0}")]
    UnknownFlag(String),
    #[error("Argument for {flag} already specified{}", by_deprecated(.deprecated))]
    AlreadySpecified { flag: String, deprecated: Option<String> },
    #[error("{0}")]
    Handler(BoxError),
    #[error("Unable to process value for flag: {token}. {source}")]
    InvalidValue { token: String, source: ValueError },
    #[error("{0}")]
    Validation(BoxError),
    #[error("value of '{env}' is not valid")]
    InvalidEnv { env: String, source: ValueError },
    #[error("{}", MissingFlags(.0))]
    MissingRequired(Vec<String>),
    #[error("Invalid argument encoding: {0}")]
    InvalidEncoding(String),
}

fn by_deprecated(deprecated: &Option<String>) -> String {
    match deprecated {
        Some(alias) => format!(" by a deprecated flag ({alias})"),
        None => String::new(),
    }
}

struct MissingFlags<'a>(&'a [String]);

impl fmt::Display for MissingFlags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for flag in self.0 {
            write!(f, "{sep}Flag required, but not specified: {flag}")?;
            sep = "\n";
        }
        Ok(())
    }
}
