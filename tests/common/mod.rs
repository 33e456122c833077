//! Shared helper for black-box integration tests: runs a program source
//! in-process against `Cursor` stdin/stdout buffers instead of spawning a
//! child process, since `tanager::interpret` is a library entry point, not
//! just a compiled binary.

use std::error::Error;
use std::io::Cursor;

pub struct Expected<'a> {
    pub stdout: &'a str,
}

/// Run `source` feeding it `stdin` and assert the captured stdout matches
/// `expected`.
pub fn check_run(source: &str, stdin: &str, expected: Expected) -> Result<(), Box<dyn Error>> {
    let mut stdout = Vec::new();
    let reader = Cursor::new(stdin.as_bytes().to_vec());
    tanager::interpret(source, reader, &mut stdout)?;

    assert_eq!(String::from_utf8(stdout)?, expected.stdout);
    Ok(())
}

/// Run `source` and assert it fails, without checking the exact diagnostic
/// text.
pub fn check_fails(source: &str, stdin: &str) {
    let mut stdout = Vec::new();
    let reader = Cursor::new(stdin.as_bytes().to_vec());
    let result = tanager::interpret(source, reader, &mut stdout);
    assert!(result.is_err(), "expected '{source}' to fail, but it ran to completion");
}
