//! SMTP reply parsing and classification.

use crate::error::{ClientError, Result};

/// A complete SMTP reply, possibly spanning several continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The SMTP status code shared by every line of the reply.
    pub code: u16,
    /// The text of each line, without code or separator.
    pub lines: Vec<String>,
}

impl Reply {
    #[must_use]
    pub const fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// The reply text with continuation lines joined by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// `true` for 2xx replies.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// `true` for 4xx replies (transient failure).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.code >= 400 && self.code < 500
    }

    /// `true` for 5xx replies (permanent failure).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.code >= 500 && self.code < 600
    }

    /// Parses one complete reply from the front of `buffer`.
    ///
    /// Returns the reply and the number of bytes consumed, or `None` when
    /// the buffer does not yet hold a full CRLF-terminated reply.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Parse` when the buffered bytes cannot be an
    /// SMTP reply, and `ClientError::Utf8` when they are not UTF-8.
    pub(crate) fn parse(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let text = match std::str::from_utf8(buffer) {
            Ok(text) => text,
            // A multi-byte sequence cut off at the tail needs more data,
            // not an error.
            Err(error) if error.error_len().is_none() => {
                std::str::from_utf8(&buffer[..error.valid_up_to()])?
            }
            Err(error) => return Err(error.into()),
        };

        let mut lines = Vec::new();
        let mut consumed = 0;
        let mut code = None;
        let mut rest = text;

        loop {
            let Some(end) = rest.find("\r\n") else {
                // Incomplete line, the caller needs to read more.
                return Ok(None);
            };
            let line = &rest[..end];
            rest = &rest[end + 2..];
            consumed += end + 2;

            let (line_code, is_last, message) = parse_line(line)?;
            match code {
                None => code = Some(line_code),
                Some(expected) if expected != line_code => {
                    return Err(ClientError::Parse(format!(
                        "status code changed mid-reply: {expected} then {line_code}"
                    )));
                }
                Some(_) => {}
            }
            lines.push(message.to_string());

            if is_last {
                return Ok(Some((Self::new(line_code, lines), consumed)));
            }
        }
    }
}

/// Splits a reply line into (code, is-last-line, message text).
fn parse_line(line: &str) -> Result<(u16, bool, &str)> {
    let Some(code_text) = line.get(..3) else {
        return Err(ClientError::Parse(format!("reply line too short: {line:?}")));
    };
    let code = code_text
        .parse::<u16>()
        .map_err(|_| ClientError::Parse(format!("invalid status code in {line:?}")))?;

    match line.as_bytes().get(3) {
        None => Ok((code, true, "")),
        Some(b' ') => Ok((code, true, &line[4..])),
        Some(b'-') => Ok((code, false, &line[4..])),
        Some(other) => Err(ClientError::Parse(format!(
            "invalid separator {:?} after status code in {line:?}",
            char::from(*other)
        ))),
    }
}
