//! Minimal STOMP 1.2 frame codec.
//!
//! Only the client side of `CONNECT`, `SEND` and `DISCONNECT` is needed, plus
//! decoding of whatever the broker answers with.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::errors::UsersError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header. Repeated headers keep the first occurrence.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn escapes_headers(&self) -> bool {
        self.command != "CONNECT" && self.command != "CONNECTED"
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let escape = self.escapes_headers();
        let mut out = Vec::with_capacity(64 + self.body.len());
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');
        for (name, value) in &self.headers {
            if escape {
                out.extend_from_slice(escape_header(name).as_bytes());
                out.push(b':');
                out.extend_from_slice(escape_header(value).as_bytes());
            } else {
                out.extend_from_slice(name.as_bytes());
                out.push(b':');
                out.extend_from_slice(value.as_bytes());
            }
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }
}

fn malformed(reason: &str) -> UsersError {
    UsersError::UpstreamFailure(format!("malformed STOMP frame: {reason}"))
}

#[must_use]
pub fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

pub fn unescape_header(value: &str) -> Result<String, UsersError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => return Err(malformed(&format!("undefined escape \\{other:?}"))),
        }
    }
    Ok(out)
}

/// Upper bound on the size of one incoming frame, headers included.
pub const MAX_FRAME_BYTES: u64 = 1024 * 1024;

/// Reads up to and including the next `delim`, charging the bytes against
/// the frame budget.
async fn read_bounded<R>(
    reader: &mut R,
    delim: u8,
    buf: &mut Vec<u8>,
    budget: &mut u64,
) -> Result<usize, UsersError>
where
    R: AsyncBufRead + Unpin,
{
    let n = (&mut *reader).take(*budget).read_until(delim, buf).await?;
    *budget -= n as u64;
    if buf.last() != Some(&delim) && n > 0 && *budget == 0 {
        return Err(malformed("frame exceeds size limit"));
    }
    Ok(n)
}

fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn utf8(line: &[u8]) -> Result<&str, UsersError> {
    std::str::from_utf8(line).map_err(|e| malformed(&format!("header is not UTF-8: {e}")))
}

fn parse_header_line(line: &str, escape: bool) -> Result<(String, String), UsersError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| malformed(&format!("bad header line {line:?}")))?;
    if escape {
        Ok((unescape_header(name)?, unescape_header(value)?))
    } else {
        Ok((name.to_string(), value.to_string()))
    }
}

/// Reads the next frame from the stream, skipping heart-beat EOLs.
///
/// The body length comes from `content-length` when the header is present,
/// so bodies may contain NUL bytes; otherwise the body runs to the next NUL.
/// Returns `Ok(None)` if the peer closed the connection between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, UsersError>
where
    R: AsyncBufRead + Unpin,
{
    let mut budget = MAX_FRAME_BYTES;
    let mut line = Vec::new();

    let command = loop {
        line.clear();
        if read_bounded(reader, b'\n', &mut line, &mut budget).await? == 0 {
            return Ok(None);
        }
        if line.last() != Some(&b'\n') {
            if line.iter().all(|b| *b == b'\r') {
                return Ok(None);
            }
            return Err(malformed("connection closed mid-frame"));
        }
        let text = utf8(trim_eol(&line))?;
        if !text.is_empty() {
            break text.to_string();
        }
    };

    let mut frame = Frame::new(command);
    let escape = frame.escapes_headers();
    loop {
        line.clear();
        read_bounded(reader, b'\n', &mut line, &mut budget).await?;
        if line.last() != Some(&b'\n') {
            return Err(malformed("connection closed mid-frame"));
        }
        let text = utf8(trim_eol(&line))?;
        if text.is_empty() {
            break;
        }
        let header = parse_header_line(text, escape)?;
        frame.headers.push(header);
    }

    frame.body = match frame.get_header("content-length") {
        Some(raw) => {
            let len: u64 = raw
                .trim()
                .parse()
                .map_err(|e| malformed(&format!("bad content-length {raw:?}: {e}")))?;
            if len >= budget {
                return Err(malformed("frame exceeds size limit"));
            }
            let mut body = vec![0; usize::try_from(len).unwrap_or(usize::MAX)];
            reader.read_exact(&mut body).await?;
            if reader.read_u8().await? != 0 {
                return Err(malformed("missing NUL after body"));
            }
            body
        }
        None => {
            let mut body = Vec::new();
            read_bounded(reader, 0, &mut body, &mut budget).await?;
            if body.pop() != Some(0) {
                return Err(malformed("connection closed mid-frame"));
            }
            body
        }
    };
    Ok(Some(frame))
}
