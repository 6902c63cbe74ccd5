use std::{cell::RefCell, collections::BTreeMap, fmt, marker::PhantomData, rc::Rc, sync::OnceLock};

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("parsing {0:?}: invalid syntax")]
    InvalidSyntax(String),
    #[error("parsing {0:?}: value out of range")]
    OutOfRange(String),
    #[error("Mapping `{0}` should contain two parts")]
    MappingParts(String),
    #[error("Empty string in mapping `{0}`")]
    MappingEmpty(String),
    #[error("Not a list of integers")]
    NotIntList,
    #[error("No value specified")]
    NoRune,
    #[error("Only \\n, \\r, and \\t are accepted escaped characters")]
    BadEscape,
    #[error("Must contain a single character or escaped character")]
    NotRune,
}

/// The typed content of a flag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(isize),
    Int64(i64),
    Uint(usize),
    Uint64(u64),
    Float64(f64),
    String(String),
    StringMap(BTreeMap<String, String>),
    IntList(Vec<isize>),
    Rune(char),
}

impl Value {
    /// Parses `text` into this cell.
    ///
    /// Integer lists and string maps accumulate across calls, every other
    /// kind is replaced. On error the cell is left untouched.
    pub fn set(&mut self, text: &str) -> Result<(), ValueError> {
        match self {
            Value::Bool(it) => *it = parse_bool(text)?,
            Value::Int(it) => *it = narrow(text, parse_signed(text)?)?,
            Value::Int64(it) => *it = parse_signed(text)?,
            Value::Uint(it) => *it = narrow(text, parse_unsigned(text)?)?,
            Value::Uint64(it) => *it = parse_unsigned(text)?,
            Value::Float64(it) => {
                *it = text.parse().map_err(|_| ValueError::InvalidSyntax(text.to_string()))?
            }
            Value::String(it) => *it = text.to_string(),
            Value::StringMap(map) => map.extend(parse_mappings(text)?),
            Value::IntList(list) => list.extend(parse_int_list(text)?),
            Value::Rune(it) => *it = parse_rune(text)?,
        }
        Ok(())
    }

    /// Boolean cells are set by the presence of their flag alone.
    pub fn is_bool_flag(&self) -> bool {
        matches!(self, Value::Bool(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(it) => write!(f, "{it}"),
            Value::Int(it) => write!(f, "{it}"),
            Value::Int64(it) => write!(f, "{it}"),
            Value::Uint(it) => write!(f, "{it}"),
            Value::Uint64(it) => write!(f, "{it}"),
            Value::Float64(it) => write!(f, "{it}"),
            Value::String(it) => f.write_str(it),
            Value::StringMap(map) => {
                let mut sep = "";
                for (key, value) in map {
                    write!(f, "{sep}{key}={value}")?;
                    sep = ",";
                }
                Ok(())
            }
            Value::IntList(list) => {
                let mut sep = "";
                for it in list {
                    write!(f, "{sep}{it}")?;
                    sep = ",";
                }
                Ok(())
            }
            Value::Rune('\n') => f.write_str("\\n"),
            Value::Rune('\r') => f.write_str("\\r"),
            Value::Rune('\t') => f.write_str("\\t"),
            Value::Rune(it) => write!(f, "{it}"),
        }
    }
}

fn parse_bool(text: &str) -> Result<bool, ValueError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::InvalidSyntax(text.to_string())),
    }
}

fn parse_signed(text: &str) -> Result<i64, ValueError> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_unsigned(digits).map_err(|err| match err {
        ValueError::OutOfRange(_) => ValueError::OutOfRange(text.to_string()),
        _ => ValueError::InvalidSyntax(text.to_string()),
    })?;
    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return Err(ValueError::OutOfRange(text.to_string()));
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| ValueError::OutOfRange(text.to_string()))
    }
}

/// Parses an unsigned integer, picking the base from its prefix: `0x` hex,
/// `0o` or a bare leading `0` octal, `0b` binary, decimal otherwise.
fn parse_unsigned(text: &str) -> Result<u64, ValueError> {
    let syntax = || ValueError::InvalidSyntax(text.to_string());
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits, prefixed) = match lower.as_deref() {
        Some("0x") => (16, &text[2..], true),
        Some("0o") => (8, &text[2..], true),
        Some("0b") => (2, &text[2..], true),
        _ if text.len() > 1 && text.starts_with('0') => (8, &text[1..], true),
        _ => (10, text, false),
    };
    if digits.is_empty() || !underscores_ok(digits, prefixed) {
        return Err(syntax());
    }
    let mut acc: u64 = 0;
    for c in digits.chars().filter(|&c| c != '_') {
        let digit = c.to_digit(radix).ok_or_else(syntax)?;
        acc = acc
            .checked_mul(u64::from(radix))
            .and_then(|it| it.checked_add(u64::from(digit)))
            .ok_or_else(|| ValueError::OutOfRange(text.to_string()))?;
    }
    Ok(acc)
}

/// Underscores may only sit between digits, or right after a base prefix.
fn underscores_ok(digits: &str, prefixed: bool) -> bool {
    let mut prev_underscore = !prefixed;
    for c in digits.chars() {
        if c == '_' {
            if prev_underscore {
                return false;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
    }
    !prev_underscore
}

fn narrow<T, U: TryInto<T>>(text: &str, value: U) -> Result<T, ValueError> {
    value.try_into().map_err(|_| ValueError::OutOfRange(text.to_string()))
}

fn parse_mappings(text: &str) -> Result<Vec<(String, String)>, ValueError> {
    text.split(',')
        .map(|mapping| {
            let parts = mapping.split('=').collect::<Vec<_>>();
            match parts.as_slice() {
                [key, value] if !key.is_empty() && !value.is_empty() => {
                    Ok((key.to_string(), value.to_string()))
                }
                [_, _] => Err(ValueError::MappingEmpty(mapping.to_string())),
                _ => Err(ValueError::MappingParts(mapping.to_string())),
            }
        })
        .collect()
}

fn parse_int_list(text: &str) -> Result<Vec<isize>, ValueError> {
    static INT_LIST: OnceLock<Regex> = OnceLock::new();
    let re = INT_LIST.get_or_init(|| {
        Regex::new(r"^([0-9]+,)*[0-9]+$").unwrap_or_else(|err| panic!("{err}"))
    });
    if !re.is_match(text) {
        return Err(ValueError::NotIntList);
    }
    text.split(',')
        .map(|it| it.parse().map_err(|_| ValueError::OutOfRange(it.to_string())))
        .collect()
}

fn parse_rune(text: &str) -> Result<char, ValueError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (None, _, _) => Err(ValueError::NoRune),
        (Some(c), None, _) => Ok(c),
        (Some('\\'), Some(escape), None) => match escape {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            _ => Err(ValueError::BadEscape),
        },
        (Some(_), Some(_), None) => Err(ValueError::BadEscape),
        _ => Err(ValueError::NotRune),
    }
}

/// Rust types a [`Handle`] can read out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_value {
    ($($ty:ty => $variant:ident,)*) => {$(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(it) => Some(it.clone()),
                    _ => None,
                }
            }
        }
    )*};
}

from_value! {
    bool => Bool,
    isize => Int,
    i64 => Int64,
    usize => Uint,
    u64 => Uint64,
    f64 => Float64,
    String => String,
    BTreeMap<String, String> => StringMap,
    Vec<isize> => IntList,
    char => Rune,
}

/// Read access to the value of a flag, typically inspected by an action
/// once parsing has finished.
pub struct Handle<T> {
    cell: Rc<RefCell<Value>>,
    _ty: PhantomData<T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Handle { cell: Rc::clone(&self.cell), _ty: PhantomData }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.cell.borrow()).finish()
    }
}

impl<T: FromValue> Handle<T> {
    pub(crate) fn new(cell: Rc<RefCell<Value>>) -> Self {
        Handle { cell, _ty: PhantomData }
    }

    pub fn get(&self) -> T {
        let value = self.cell.borrow();
        match T::from_value(&value) {
            Some(it) => it,
            None => unreachable!("handle bound to a mismatched value: {value:?}"),
        }
    }

    /// The value rendered the way it would be written on the command line.
    pub fn text(&self) -> String {
        self.cell.borrow().to_string()
    }
}
