use std::io::{Cursor, Read};

use argtree_term::passwd::{read_passwd, PasswdError, MAX_LENGTH};

/// Runs the reader over `input`, returning the password, what was echoed
/// and how many bytes were left unread.
fn run(input: &[u8], masked: bool) -> (Result<Vec<u8>, PasswdError>, String, usize) {
    let mut input = Cursor::new(input.to_vec());
    let mut echo = Vec::new();
    let res = read_passwd(&mut input, &mut echo, masked);
    let mut rest = Vec::new();
    input.read_to_end(&mut rest).unwrap();
    (res, String::from_utf8(echo).unwrap(), rest.len())
}

#[test]
fn line_editing() {
    let cases: &[(&[u8], &str, &str, usize)] = &[
        (b"abc\n", "***", "abc", 0),
        (b"abc\r", "***", "abc", 0),
        (b"a\nbc\n", "*", "a", 3),
        (b"*!]|\n", "****", "*!]|", 0),
        (b"abc\r\n", "***", "abc", 1),
        (&[b'a', b'b', b'c', 8, b'\n'], "***\x08 \x08", "ab", 0),
        (&[b'a', b'b', 127, b'c', b'\n'], "**\x08 \x08*", "ac", 0),
        (&[b'a', b'b', 127, b'c', 8, 127, b'\n'], "**\x08 \x08*\x08 \x08\x08 \x08", "", 0),
        (&[8, 8, 8, b'\n'], "", "", 0),
        (&[8, 8, 8, b'a', b'b', b'c', b'\n'], "***", "abc", 0),
        (&[b'a', b'b', 0, b'c', b'\n'], "***", "abc", 0),
    ];

    for &(input, masked_echo, password, left) in cases {
        for masked in [true, false] {
            let (res, echo, rest) = run(input, masked);
            assert_eq!(res.unwrap(), password.as_bytes(), "{input:?}");
            assert_eq!(echo, if masked { masked_echo } else { "" }, "{input:?}");
            assert_eq!(rest, left, "{input:?}");
        }
    }
}

#[test]
fn ctrl_c_interrupts() {
    let (res, _, rest) = run(&[b'a', 3, b'b', b'\n'], true);
    assert!(matches!(res, Err(PasswdError::Interrupted)));
    assert_eq!(rest, 2);
}

#[test]
fn eof_is_an_error() {
    let (res, _, _) = run(b"abc", false);
    match res {
        Err(PasswdError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn byte_limit_counts_every_byte_read() {
    let mut input = vec![b'a'; MAX_LENGTH];
    input.push(b'\n');
    let (res, _, _) = run(&input, false);
    assert_eq!(res.unwrap().len(), MAX_LENGTH);

    let mut input = vec![b'a'; MAX_LENGTH + 1];
    input.push(b'\n');
    let (res, _, _) = run(&input, false);
    let err = res.unwrap_err();
    assert_eq!(err.to_string(), "maximum byte limit (512) exceeded");

    // Erased bytes still count towards the limit.
    let mut input = [b'a', 127].repeat(300);
    input.push(b'\n');
    let (res, _, _) = run(&input, false);
    assert!(matches!(res, Err(PasswdError::LimitExceeded(MAX_LENGTH))));
}
