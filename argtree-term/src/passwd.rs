use std::io::{self, IsTerminal, Read, Write};

use crossterm::terminal;

/// Upper bound on bytes read for one password, line terminator and erased
/// bytes included. Stops a broken input from being read forever.
pub const MAX_LENGTH: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum PasswdError {
    #[error("interrupted")]
    Interrupted,
    #[error("maximum byte limit ({0}) exceeded")]
    LimitExceeded(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads a password from the terminal without echoing it.
///
/// The returned bytes don't include the line terminator.
pub fn get_passwd() -> Result<Vec<u8>, PasswdError> {
    from_terminal(false)
}

/// Reads a password from the terminal, echoing an asterisk per byte.
pub fn get_passwd_masked() -> Result<Vec<u8>, PasswdError> {
    from_terminal(true)
}

fn from_terminal(masked: bool) -> Result<Vec<u8>, PasswdError> {
    let stdin = io::stdin();
    let _raw = if stdin.is_terminal() { Some(RawMode::enable()?) } else { None };
    tracing::debug!(masked, "reading password");
    read_passwd(&mut stdin.lock(), &mut io::stdout(), masked)
}

/// Reads bytes from `input` up to a carriage return or newline.
///
/// Backspace and delete erase the last byte, NUL bytes are skipped and
/// Ctrl-C aborts. With `masked`, `*` is echoed for each byte kept and
/// `"\b \b"` for each byte erased.
pub fn read_passwd(
    input: &mut impl Read,
    echo: &mut impl Write,
    masked: bool,
) -> Result<Vec<u8>, PasswdError> {
    let (erase, mask): (&[u8], &[u8]) = if masked { (b"\x08 \x08", b"*") } else { (b"", b"") };

    let mut pass = Vec::new();
    let mut counter = 0;
    while counter <= MAX_LENGTH {
        match read_byte(input)? {
            b'\r' | b'\n' => break,
            8 | 127 => {
                if pass.pop().is_some() {
                    echo.write_all(erase)?;
                }
            }
            3 => return Err(PasswdError::Interrupted),
            0 => {}
            b => {
                pass.push(b);
                echo.write_all(mask)?;
            }
        }
        counter += 1;
    }
    echo.flush()?;

    if counter > MAX_LENGTH {
        return Err(PasswdError::LimitExceeded(MAX_LENGTH));
    }
    Ok(pass)
}

fn read_byte(input: &mut impl Read) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Keeps the terminal in raw mode while alive.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<RawMode> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        drop(terminal::disable_raw_mode());
        drop(writeln!(io::stdout()));
    }
}
