use std::{
    collections::HashMap,
    ffi::OsString,
    hash::BuildHasher,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{args::Args, command::Command, flag::Flag, ConfigError, Error, ExitCode};

/// Where flags look up their environment variables.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// State handed down while descending the command tree. Each level gets its
/// own copy, extended with its name.
pub(crate) struct Context<'a> {
    pub(crate) man_path: &'a Path,
    pub(crate) env: &'a dyn Environment,
    pub(crate) trail: Vec<String>,
}

impl<'a> Context<'a> {
    pub(crate) fn enter(&self, name: &str) -> Context<'a> {
        let mut trail = self.trail.clone();
        trail.push(name.to_string());
        Context { man_path: self.man_path, env: self.env, trail }
    }
}

/// The program itself: the root of the command tree.
pub struct Cli {
    root: Command,
    man_path: PathBuf,
}

impl Cli {
    pub fn new(name: &str, desc: &str) -> Cli {
        Cli { root: Command::new(name, desc), man_path: PathBuf::new() }
    }

    /// Directory the manual pages of every command are looked up in.
    pub fn set_man_path(&mut self, path: impl Into<PathBuf>) {
        self.man_path = path.into();
    }

    pub fn set_man_page(&mut self, page: &str) {
        self.root.set_man_page(page);
    }

    pub fn set_action(&mut self, action: impl FnMut() + 'static) {
        self.root.set_action(action);
    }

    pub fn add_command(&mut self, cmd: Command) {
        self.root.add_command(cmd);
    }

    /// # Panics
    ///
    /// See [`Command::add_flag`].
    pub fn add_flag(&mut self, flag: Flag) {
        self.root.add_flag(flag);
    }

    pub fn try_add_flag(&mut self, flag: Flag) -> Result<(), ConfigError> {
        self.root.try_add_flag(flag)
    }

    pub fn usage(&self) -> String {
        self.root.usage()
    }

    /// Parses the process arguments against the process environment,
    /// printing to stdout.
    pub fn run(&mut self) -> ExitCode {
        let args = std::env::args_os().skip(1).collect();
        self.run_os_with(args, &ProcessEnv, &mut io::stdout().lock())
    }

    /// Like [`Cli::run`], exiting the process unless parsing succeeded.
    pub fn run_or_exit(&mut self) {
        let code = self.run();
        if !code.is_success() {
            std::process::exit(code.code())
        }
    }

    /// Like [`Cli::run_with`], rejecting arguments that aren't valid UTF-8.
    pub fn run_os_with(
        &mut self,
        args: Vec<OsString>,
        env: &dyn Environment,
        out: &mut dyn Write,
    ) -> ExitCode {
        let mut decoded = Vec::with_capacity(args.len());
        for arg in args {
            match arg.into_string() {
                Ok(it) => decoded.push(it),
                Err(it) => {
                    let err = Error::InvalidEncoding(format!("{it:?}"));
                    let title = self.root.usage_title(&[self.root.name().to_string()]);
                    w!(out, "{err}\n\n{title}{}", self.usage());
                    return ExitCode::CliUsageError;
                }
            }
        }
        self.run_with(decoded, env, out)
    }

    /// Parses `args`, which don't include the program name.
    pub fn run_with(
        &mut self,
        args: Vec<String>,
        env: &dyn Environment,
        out: &mut dyn Write,
    ) -> ExitCode {
        let ctx = Context { man_path: &self.man_path, env, trail: Vec::new() };
        let mut args = Args::new(args);
        self.root.parse(&ctx, &mut args, out)
    }
}
