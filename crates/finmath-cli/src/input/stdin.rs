use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Typed request piped on stdin, if any.
///
/// `None` when stdin is a terminal or the pipe carried only whitespace.
pub fn read_json<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}
