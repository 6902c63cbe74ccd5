use std::{io::Write, iter};

use tracing::{debug, warn};

use crate::{
    args::Args,
    cli::Context,
    flag::Flag,
    ConfigError, Error, ExitCode, ManError, Result,
};

/// A node of the subcommand tree.
pub struct Command {
    pub(crate) name: String,
    pub(crate) desc: String,
    pub(crate) man_page: Option<String>,
    action: Option<Box<dyn FnMut()>>,
    pub(crate) hidden: bool,
    manual: bool,
    pub(crate) commands: Vec<Command>,
    flags: Vec<Flag>,
    help: Flag,
}

impl Command {
    pub fn new(name: &str, desc: &str) -> Command {
        Command {
            name: name.to_string(),
            desc: desc.to_string(),
            man_page: None,
            action: None,
            hidden: false,
            manual: false,
            commands: Vec::new(),
            flags: Vec::new(),
            help: Flag::help(),
        }
    }

    /// A command that only displays the manual page `page`.
    pub fn manual(name: &str, desc: &str, page: &str) -> Command {
        let mut cmd = Command::new(name, desc);
        cmd.man_page = Some(page.to_string());
        cmd.manual = true;
        cmd
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Shown instead of the usage text when help is asked for with `--help`.
    pub fn set_man_page(&mut self, page: &str) {
        self.man_page = Some(page.to_string());
    }

    /// Runs once parsing of this command succeeds. Without an action the
    /// usage text is printed instead.
    pub fn set_action(&mut self, action: impl FnMut() + 'static) {
        self.action = Some(Box::new(action));
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn add_command(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    /// # Panics
    ///
    /// If the short or long name of `flag` is already taken on this command,
    /// `-h` and `--help` included.
    pub fn add_flag(&mut self, flag: Flag) {
        if let Err(err) = self.try_add_flag(flag) {
            panic!("{err}")
        }
    }

    pub fn try_add_flag(&mut self, flag: Flag) -> Result<(), ConfigError> {
        for other in self.flags() {
            if !flag.short().is_empty() && flag.short() == other.short() {
                return Err(ConfigError::DuplicateFlag(flag.short().to_string()));
            }
            if !flag.long().is_empty() && flag.long() == other.long() {
                return Err(ConfigError::DuplicateFlag(flag.long().to_string()));
            }
        }
        self.flags.push(flag);
        Ok(())
    }

    /// Flags in display order, the help flag last.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter().chain(iter::once(&self.help))
    }

    fn flags_mut(&mut self) -> impl Iterator<Item = &mut Flag> {
        self.flags.iter_mut().chain(iter::once(&mut self.help))
    }

    fn flag_mut(&mut self, idx: usize) -> &mut Flag {
        match self.flags.get_mut(idx) {
            Some(flag) => flag,
            None => &mut self.help,
        }
    }

    pub(crate) fn parse(
        &mut self,
        ctx: &Context<'_>,
        args: &mut Args,
        out: &mut dyn Write,
    ) -> ExitCode {
        if self.manual {
            return match self.show_manual(ctx) {
                Ok(()) => ExitCode::Success,
                Err(err) => {
                    w!(out, "{err}\n");
                    ExitCode::CliUsageError
                }
            };
        }

        let ctx = ctx.enter(&self.name);
        self.flags_mut().for_each(Flag::reset);

        let res = if args.peek().is_some() && args.peek_flag().is_none() {
            self.parse_commands(&ctx, args, out)
        } else {
            self.parse_flags(&ctx, args, out)
        };

        match res {
            Ok(code) => code,
            Err(err) => {
                debug!(command = %self.name, error = %err, "usage error");
                w!(out, "{err}\n\n");
                self.write_usage(&ctx, out);
                ExitCode::CliUsageError
            }
        }
    }

    fn parse_commands(
        &mut self,
        ctx: &Context<'_>,
        args: &mut Args,
        out: &mut dyn Write,
    ) -> Result<ExitCode> {
        let Some(name) = args.next() else {
            self.write_usage(ctx, out);
            return Ok(ExitCode::Success);
        };

        match self.commands.iter_mut().find(|it| it.name == name) {
            Some(cmd) => {
                debug!(command = %name, "matched subcommand");
                Ok(cmd.parse(ctx, args, out))
            }
            None => Err(Error::InvalidSubcommand(name)),
        }
    }

    fn parse_flags(
        &mut self,
        ctx: &Context<'_>,
        args: &mut Args,
        out: &mut dyn Write,
    ) -> Result<ExitCode> {
        // The environment provides a baseline that arguments are checked against.
        let mut from_env = false;
        for flag in self.flags_mut() {
            if flag.env().is_empty() {
                continue;
            }
            let Some(value) = ctx.env.var(flag.env()).filter(|it| !it.is_empty()) else {
                continue;
            };
            flag.set(&value)
                .map_err(|source| Error::InvalidEnv { env: flag.env().to_string(), source })?;
            flag.mark_found(&value, true, false);
            from_env = true;
            debug!(env = flag.env(), "flag set from environment");
            flag.validate().map_err(Error::Validation)?;
        }

        if args.is_empty() && !from_env {
            self.write_usage(ctx, out);
            return Ok(ExitCode::Success);
        }

        while let Some(token) = args.next() {
            if !token.starts_with('-') {
                return Err(Error::ExpectedFlag(token));
            }
            let Some((idx, deprecated)) = self.find_flag(&token) else {
                return Err(Error::UnknownFlag(token));
            };
            let flag = self.flag_mut(idx);

            if deprecated {
                warn!(flag = %token, "deprecated flag used");
                w!(out, "Warning: {token} is deprecated, use {}\n", flag.names());
            }
            if flag.found_non_env() {
                let alias = flag.found_deprecated().map(str::to_string);
                return Err(Error::AlreadySpecified {
                    flag: flag.names(),
                    deprecated: alias.or_else(|| deprecated.then(|| token.clone())),
                });
            }
            flag.mark_found(&token, false, deprecated);

            let text = if flag.is_bool_flag() {
                "true".to_string()
            } else {
                let next = args.peek().unwrap_or_default();
                let taken = flag.take(&token, next).map_err(Error::Handler)?;
                if taken.consumed {
                    args.next();
                }
                taken.value
            };
            flag.set(&text).map_err(|source| Error::InvalidValue { token: token.clone(), source })?;
            flag.validate().map_err(Error::Validation)?;
        }

        if self.help.found() {
            if self.help.found_long() && self.man_page.is_some() {
                if let Err(err) = self.show_manual(ctx) {
                    w!(out, "{err}\n");
                }
            } else {
                self.write_usage(ctx, out);
            }
            return Ok(ExitCode::Success);
        }

        let missing = self
            .flags()
            .filter(|it| it.is_required() && !it.found())
            .map(Flag::names)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Error::MissingRequired(missing));
        }

        if let Some(action) = self.action.as_mut() {
            debug!(command = %self.name, "dispatching");
            action();
        } else {
            self.write_usage(ctx, out);
        }
        Ok(ExitCode::Success)
    }

    /// Resolves `-x`, `--xyz` or a deprecated alias. Primary names win over
    /// aliases; the flag is returned by index together with whether an alias
    /// matched.
    fn find_flag(&self, token: &str) -> Option<(usize, bool)> {
        let name = token.strip_prefix("--").or_else(|| token.strip_prefix('-')).unwrap_or(token);
        if let Some(idx) = self.flags().position(|it| it.is_named(name)) {
            return Some((idx, false));
        }
        self.flags().position(|it| it.is_deprecated_alias(name)).map(|idx| (idx, true))
    }

    fn show_manual(&self, ctx: &Context<'_>) -> Result<(), ManError> {
        let page = self.man_page.as_deref().unwrap_or_default();
        debug!(page, "opening manual page");
        argtree_term::man::show_manual(ctx.man_path, page)
    }

    fn write_usage(&self, ctx: &Context<'_>, out: &mut dyn Write) {
        w!(out, "{}{}", self.usage_title(&ctx.trail), self.usage());
    }
}
