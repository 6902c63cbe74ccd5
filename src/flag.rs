use std::{
    cell::RefCell,
    collections::BTreeMap,
    io::{self, Write},
    marker::PhantomData,
    mem,
    rc::Rc,
};

use crate::{
    validators::host_validator,
    value::{FromValue, Handle, Value, ValueError},
    BoxError,
};

/// Checks, and possibly normalizes, a value once its flag has been set.
pub type Validator = Box<dyn Fn(&mut Value) -> Result<(), BoxError>>;

/// Decides which text a non-boolean flag is set to, given the flag token and
/// the token after it (empty when there is none).
pub type OptionHandler = Box<dyn Fn(&str, &str) -> Result<Taken, BoxError>>;

/// What an [`OptionHandler`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taken {
    pub value: String,
    /// Whether the token after the flag was used up as its value.
    pub consumed: bool,
}

/// Requires the next token to be a value rather than another flag.
pub fn default_option_handler(opt: &str, value: &str) -> Result<Taken, BoxError> {
    if value.is_empty() || value.starts_with('-') {
        return Err(format!("Expected argument for option: {opt}").into());
    }
    Ok(Taken { value: value.to_string(), consumed: true })
}

/// Like [`default_option_handler`], but prompts on the terminal without echo
/// when no value follows the flag.
pub fn password_option_handler(opt: &str, value: &str) -> Result<Taken, BoxError> {
    if value.is_empty() || value.starts_with('-') {
        tracing::debug!(flag = opt, "prompting for password");
        let mut stdout = io::stdout();
        write!(stdout, "Password: ")?;
        stdout.flush()?;
        let password = argtree_term::passwd::get_passwd()?;
        return Ok(Taken { value: String::from_utf8(password)?, consumed: false });
    }
    Ok(Taken { value: value.to_string(), consumed: true })
}

#[derive(Debug, Default, Clone)]
struct Discovery {
    short: bool,
    long: bool,
    env: bool,
    /// The alias token, when found through a deprecated name.
    deprecated: Option<String>,
}

pub struct Flag {
    short: String,
    long: String,
    env: String,
    deprecated: Vec<String>,
    desc: String,
    value: Rc<RefCell<Value>>,
    default: Value,
    validator: Option<Validator>,
    handler: OptionHandler,
    required: bool,
    hidden: bool,
    found: Discovery,
}

impl Flag {
    pub fn bool(default: bool) -> FlagBuilder<bool> {
        FlagBuilder::new(Value::Bool(default))
    }

    pub fn int(default: isize) -> FlagBuilder<isize> {
        FlagBuilder::new(Value::Int(default))
    }

    pub fn int64(default: i64) -> FlagBuilder<i64> {
        FlagBuilder::new(Value::Int64(default))
    }

    pub fn uint(default: usize) -> FlagBuilder<usize> {
        FlagBuilder::new(Value::Uint(default))
    }

    pub fn uint64(default: u64) -> FlagBuilder<u64> {
        FlagBuilder::new(Value::Uint64(default))
    }

    pub fn float64(default: f64) -> FlagBuilder<f64> {
        FlagBuilder::new(Value::Float64(default))
    }

    pub fn string(default: &str) -> FlagBuilder<String> {
        FlagBuilder::new(Value::String(default.to_string()))
    }

    pub fn string_map(default: BTreeMap<String, String>) -> FlagBuilder<BTreeMap<String, String>> {
        FlagBuilder::new(Value::StringMap(default))
    }

    pub fn int_list(default: Vec<isize>) -> FlagBuilder<Vec<isize>> {
        FlagBuilder::new(Value::IntList(default))
    }

    pub fn rune(default: char) -> FlagBuilder<char> {
        FlagBuilder::new(Value::Rune(default))
    }

    pub(crate) fn help() -> Flag {
        Flag::bool(false).short("h").long("help").desc("Prints the help message").build().0
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn deprecated(&self) -> &[String] {
        &self.deprecated
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_bool_flag(&self) -> bool {
        self.value.borrow().is_bool_flag()
    }

    /// `-s/--long`, `-s` or `--long`, depending on which names are set.
    pub fn names(&self) -> String {
        match (self.short.is_empty(), self.long.is_empty()) {
            (false, false) => format!("-{}/--{}", self.short, self.long),
            (false, true) => format!("-{}", self.short),
            (true, false) => format!("--{}", self.long),
            (true, true) => String::new(),
        }
    }

    pub(crate) fn is_named(&self, name: &str) -> bool {
        !name.is_empty() && (self.short == name || self.long == name)
    }

    pub(crate) fn is_deprecated_alias(&self, name: &str) -> bool {
        !name.is_empty() && self.deprecated.iter().any(|it| it == name)
    }

    pub(crate) fn found(&self) -> bool {
        self.found.env || self.found_non_env()
    }

    pub(crate) fn found_non_env(&self) -> bool {
        self.found.short || self.found.long || self.found.deprecated.is_some()
    }

    pub(crate) fn found_long(&self) -> bool {
        self.found.long
    }

    pub(crate) fn found_deprecated(&self) -> Option<&str> {
        self.found.deprecated.as_deref()
    }

    pub(crate) fn mark_found(&mut self, token: &str, env: bool, deprecated: bool) {
        if deprecated {
            self.found.deprecated = Some(token.to_string());
        } else if env {
            self.found.env = true;
        } else if token.starts_with("--") {
            self.found.long = true;
        } else if token.starts_with('-') {
            self.found.short = true;
        }
    }

    /// Restores the default value and forgets how the flag was found.
    pub(crate) fn reset(&mut self) {
        *self.value.borrow_mut() = self.default.clone();
        self.found = Discovery::default();
    }

    pub(crate) fn set(&self, text: &str) -> Result<(), ValueError> {
        self.value.borrow_mut().set(text)
    }

    pub(crate) fn take(&self, opt: &str, next: &str) -> Result<Taken, BoxError> {
        (self.handler)(opt, next)
    }

    /// Runs the validator on a copy of the value, keeping its rewrite only
    /// when it succeeds and leaves the value kind alone.
    pub(crate) fn validate(&self) -> Result<(), BoxError> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let mut value = self.value.borrow().clone();
        validator(&mut value)?;
        if mem::discriminant(&value) != mem::discriminant(&self.default) {
            let msg = format!("Validator for {} changed the type of its value", self.names());
            return Err(msg.into());
        }
        *self.value.borrow_mut() = value;
        Ok(())
    }
}

/// Describes a flag before it is attached to a command.
pub struct FlagBuilder<T> {
    flag: Flag,
    _ty: PhantomData<T>,
}

impl<T: FromValue> FlagBuilder<T> {
    fn new(default: Value) -> Self {
        FlagBuilder {
            flag: Flag {
                short: String::new(),
                long: String::new(),
                env: String::new(),
                deprecated: Vec::new(),
                desc: String::new(),
                value: Rc::new(RefCell::new(default.clone())),
                default,
                validator: None,
                handler: Box::new(default_option_handler),
                required: false,
                hidden: false,
                found: Discovery::default(),
            },
            _ty: PhantomData,
        }
    }

    pub fn short(mut self, name: &str) -> Self {
        self.flag.short = name.to_string();
        self
    }

    pub fn long(mut self, name: &str) -> Self {
        self.flag.long = name.to_string();
        self
    }

    /// Environment variable consulted before any argument is read.
    pub fn env(mut self, var: &str) -> Self {
        self.flag.env = var.to_string();
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.flag.desc = desc.to_string();
        self
    }

    /// Old names that still resolve to this flag, with a warning.
    pub fn deprecated(mut self, names: &[&str]) -> Self {
        self.flag.deprecated.extend(names.iter().map(|it| it.to_string()));
        self
    }

    pub fn validator(
        mut self,
        validator: impl Fn(&mut Value) -> Result<(), BoxError> + 'static,
    ) -> Self {
        self.flag.validator = Some(Box::new(validator));
        self
    }

    pub fn option_handler(
        mut self,
        handler: impl Fn(&str, &str) -> Result<Taken, BoxError> + 'static,
    ) -> Self {
        self.flag.handler = Box::new(handler);
        self
    }

    pub fn required(mut self) -> Self {
        self.flag.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.flag.hidden = true;
        self
    }

    pub fn build(self) -> (Flag, Handle<T>) {
        let handle = Handle::new(Rc::clone(&self.flag.value));
        (self.flag, handle)
    }
}

pub fn host_flag(default: &str) -> FlagBuilder<String> {
    Flag::string(default)
        .short("c")
        .long("cluster")
        .env("CB_CLUSTER")
        .desc("The hostname of the Couchbase cluster")
        .validator(host_validator)
}

pub fn username_flag(default: &str) -> FlagBuilder<String> {
    Flag::string(default)
        .short("u")
        .long("username")
        .env("CB_USERNAME")
        .desc("The username for the Couchbase cluster")
}

pub fn password_flag(default: &str) -> FlagBuilder<String> {
    Flag::string(default)
        .short("p")
        .long("password")
        .env("CB_PASSWORD")
        .desc("The password for the Couchbase cluster")
        .option_handler(password_option_handler)
}

pub fn ca_cert_flag(default: &str) -> FlagBuilder<String> {
    Flag::string(default).long("cacert").desc("Verifies the cluster identity with this certificate")
}

pub fn no_ssl_verify_flag() -> FlagBuilder<bool> {
    Flag::bool(false)
        .long("no-ssl-verify")
        .desc("Skips SSL verification of certificates against CA")
}
