use url::{ParseError, Url};

use crate::{value::Value, BoxError};

const DEFAULT_PORT: u16 = 8091;
const DEFAULT_SECURE_PORT: u16 = 18091;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{kind}\n\nPlease specify a hostname using one of the following patterns:\n\n\
     * <addr>:<port>\n* http://<addr>:<port>\n* couchbase://<addr>"
)]
pub struct HostError {
    pub kind: HostErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostErrorKind {
    #[error("Host has path `{0}` specified, but paths are not allowed")]
    Path(String),
    #[error("Host has query `{0}` specified, but queries are not allowed")]
    Query(String),
    #[error("Host has credentials `{0}` specified, but credentials are not allowed")]
    Credentials(String),
    #[error("Port specified `{0}` is not a number")]
    PortNotNumber(String),
    #[error("Port specified `{0}` is too big")]
    PortTooBig(String),
    #[error("Invalid hostname, {0} is not an accepted scheme")]
    Scheme(String),
    #[error("Invalid hostname `{host}`, {reason}")]
    Malformed { host: String, reason: String },
}

impl From<HostErrorKind> for HostError {
    fn from(kind: HostErrorKind) -> Self {
        HostError { kind }
    }
}

/// Rewrites a cluster address into `http(s)://host:port` form.
///
/// Accepts `host`, `host:port`, `http(s)://host[:port]` and
/// `couchbase(s)://host[:port]`; missing ports default to 8091, or 18091 for
/// the secure schemes.
pub fn host_validator(value: &mut Value) -> Result<(), BoxError> {
    let host = normalize_host(&value.to_string())?;
    value.set(&host)?;
    Ok(())
}

pub(crate) fn normalize_host(input: &str) -> Result<String, HostError> {
    // `host:port` is not a URL, so it is recognised before URL parsing.
    if let Some((host, port)) = split_host_port(input) {
        if port.is_empty() {
            return Ok(format!("http://{}:{DEFAULT_PORT}", bracket(host)));
        }
        if port.bytes().all(|b| b.is_ascii_digit()) {
            check_port(port)?;
            return Ok(format!("http://{input}"));
        }
    }

    let (raw, parsed) = match Url::parse(input) {
        Err(ParseError::RelativeUrlWithoutBase) => {
            let raw = format!("http://{input}");
            let parsed = Url::parse(&raw);
            (raw, parsed)
        }
        parsed => (input.to_string(), parsed),
    };
    let raw_port = split_host_port(raw_authority(&raw)).map(|(_, port)| port);
    let url = match parsed {
        Ok(url) => url,
        Err(ParseError::InvalidPort) => {
            if let Some(port) = raw_port.filter(|it| it.bytes().all(|b| b.is_ascii_digit())) {
                check_port(port)?;
            }
            return Err(malformed(input, ParseError::InvalidPort));
        }
        Err(err) => return Err(malformed(input, err)),
    };

    // `http://host` and `http://host/` both carry the path `/`; only the
    // latter names one.
    let path = match url.path() {
        _ if url.cannot_be_a_base() => "",
        "/" if !has_path(&raw) => "",
        path => path,
    };
    if !path.is_empty() {
        return Err(HostErrorKind::Path(path.to_string()).into());
    }
    if let Some(query) = url.query().filter(|it| !it.is_empty()) {
        return Err(HostErrorKind::Query(query.to_string()).into());
    }
    if !url.username().is_empty() || url.password().is_some() {
        let user = match url.password() {
            Some(password) => format!("{}:{password}", url.username()),
            None => url.username().to_string(),
        };
        return Err(HostErrorKind::Credentials(user).into());
    }

    let (scheme, secure) = match url.scheme() {
        "http" => ("http", false),
        "https" => ("https", true),
        "couchbase" => ("http", false),
        "couchbases" => ("https", true),
        other => return Err(HostErrorKind::Scheme(other.to_string()).into()),
    };
    if url.cannot_be_a_base() {
        return Err(malformed(input, "missing `//`"));
    }
    let Some(host) = url.host_str().filter(|it| !it.is_empty()) else {
        return Err(malformed(input, ParseError::EmptyHost));
    };

    // Ports equal to the scheme default are dropped by `Url`, so the port is
    // taken as written.
    let mut res = match raw_port.filter(|it| !it.is_empty()) {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}:{}", default_port(secure)),
    };
    if let Some(fragment) = url.fragment() {
        res.push('#');
        res.push_str(fragment);
    }
    Ok(res)
}

fn malformed(host: &str, reason: impl ToString) -> HostError {
    HostErrorKind::Malformed { host: host.to_string(), reason: reason.to_string() }.into()
}

fn default_port(secure: bool) -> u16 {
    if secure {
        DEFAULT_SECURE_PORT
    } else {
        DEFAULT_PORT
    }
}

fn check_port(port: &str) -> Result<(), HostError> {
    let number = port
        .parse::<u64>()
        .map_err(|_| HostErrorKind::PortNotNumber(port.to_string()))?;
    if number > u64::from(u16::MAX) {
        return Err(HostErrorKind::PortTooBig(port.to_string()).into());
    }
    Ok(())
}

fn bracket(host: &str) -> String {
    if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

/// Splits `host:port` or `[v6host]:port`. `None` when there is no port
/// separator or the host part is itself malformed.
fn split_host_port(hostport: &str) -> Option<(&str, &str)> {
    if let Some(rest) = hostport.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;
        if host.contains('[') || port.contains('[') || port.contains(']') {
            return None;
        }
        return Some((host, port));
    }
    let (host, port) = hostport.rsplit_once(':')?;
    if host.contains(':') || host.contains('[') || host.contains(']') || port.contains(']') {
        return None;
    }
    Some((host, port))
}

/// The `host[:port]` part of `raw` as written, without credentials.
fn raw_authority(raw: &str) -> &str {
    let rest = raw.split_once("://").map_or("", |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

fn has_path(raw: &str) -> bool {
    let rest = raw.split_once("://").map_or("", |(_, rest)| rest);
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest[..end].contains('/')
}
