//! STOMP 1.2 frame encoding and parsing.
//!
//! One WebSocket text message carries one frame. A message made only of
//! end-of-line characters is a heart-beat.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Disconnect => "DISCONNECT",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "CONNECT" => Command::Connect,
            "STOMP" => Command::Stomp,
            "CONNECTED" => Command::Connected,
            "SEND" => Command::Send,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "DISCONNECT" => Command::Disconnect,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            _ => return None,
        })
    }

    /// CONNECT and CONNECTED headers are sent without escaping.
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Stomp | Command::Connected)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("missing command line")]
    MissingCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),
    #[error("body is not NUL-terminated")]
    UnterminatedBody,
    #[error("content-length does not fall on a character boundary")]
    InvalidContentLength,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header. Repeated headers keep the first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(self.command.as_str());
        out.push('\n');
        for (k, v) in &self.headers {
            if escape {
                out.push_str(&escape_header(k));
                out.push(':');
                out.push_str(&escape_header(v));
            } else {
                out.push_str(k);
                out.push(':');
                out.push_str(v);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame. `Ok(None)` means the text was a heart-beat.
    pub fn parse(text: &str) -> Result<Option<Frame>, FrameError> {
        let text = text.trim_start_matches(|c: char| c == '\r' || c == '\n');
        if text.is_empty() {
            return Ok(None);
        }

        let (command_line, mut rest) = split_line(text).ok_or(FrameError::MissingCommand)?;
        let command = Command::parse(command_line)
            .ok_or_else(|| FrameError::UnknownCommand(command_line.to_string()))?;
        let unescape = command.escapes_headers();

        let mut headers = Vec::new();
        loop {
            let (line, next) = split_line(rest).ok_or(FrameError::UnterminatedBody)?;
            rest = next;
            if line.is_empty() {
                break;
            }
            let (k, v) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if unescape {
                headers.push((unescape_header(k)?, unescape_header(v)?));
            } else {
                headers.push((k.to_string(), v.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .and_then(|(_, v)| v.trim().parse::<usize>().ok());

        let body = match content_length {
            Some(len) => {
                if rest.len() < len || rest.as_bytes().get(len) != Some(&0) {
                    return Err(FrameError::UnterminatedBody);
                }
                rest.get(..len)
                    .ok_or(FrameError::InvalidContentLength)?
                    .to_string()
            }
            None => {
                let end = rest.find('\0').ok_or(FrameError::UnterminatedBody)?;
                rest[..end].to_string()
            }
        };

        Ok(Some(Frame {
            command,
            headers,
            body,
        }))
    }
}

/// Split at the first LF, dropping an optional preceding CR.
fn split_line(s: &str) -> Option<(&str, &str)> {
    let idx = s.find('\n')?;
    let line = &s[..idx];
    let line = line.strip_suffix('\r').unwrap_or(line);
    Some((line, &s[idx + 1..]))
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(s.to_string())),
        }
    }
    Ok(out)
}

/// A bare EOL, sent as a client heart-beat.
pub const HEARTBEAT: &str = "\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_send_frame() {
        let f = Frame::new(Command::Send)
            .header("destination", "/app/signal/r1")
            .header("content-type", "application/json")
            .body("{}");
        assert_eq!(
            f.encode(),
            "SEND\ndestination:/app/signal/r1\ncontent-type:application/json\ncontent-length:2\n\n{}\0"
        );
    }

    #[test]
    fn escaped_headers_survive_a_round_trip() {
        let f = Frame::new(Command::Message)
            .header("destination", "/topic/room/a:b")
            .header("note", "line1\nline2\\end\r")
            .body("hello");
        let parsed = Frame::parse(&f.encode()).unwrap().unwrap();
        assert_eq!(parsed.command, Command::Message);
        assert_eq!(parsed.get("destination"), Some("/topic/room/a:b"));
        assert_eq!(parsed.get("note"), Some("line1\nline2\\end\r"));
        assert_eq!(parsed.body, "hello");
    }

    #[test]
    fn connected_headers_are_not_unescaped() {
        let parsed = Frame::parse("CONNECTED\nversion:1.2\nserver:broker\\c1\n\n\0")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.command, Command::Connected);
        assert_eq!(parsed.get("server"), Some("broker\\c1"));
    }

    #[test]
    fn heartbeat_parses_to_none() {
        assert_eq!(Frame::parse("\n").unwrap(), None);
        assert_eq!(Frame::parse("\r\n\n").unwrap(), None);
    }

    #[test]
    fn leading_heartbeats_before_frame_are_skipped() {
        let parsed = Frame::parse("\n\nRECEIPT\nreceipt-id:7\n\n\0").unwrap().unwrap();
        assert_eq!(parsed.command, Command::Receipt);
        assert_eq!(parsed.get("receipt-id"), Some("7"));
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = Frame::parse("MESSAGE\r\ndestination:/t\r\n\r\nbody\0")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.get("destination"), Some("/t"));
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn content_length_allows_embedded_nul() {
        let parsed = Frame::parse("MESSAGE\ncontent-length:3\n\na\0b\0")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.body, "a\0b");
    }

    #[test]
    fn repeated_header_keeps_first() {
        let parsed = Frame::parse("MESSAGE\nfoo:1\nfoo:2\n\n\0").unwrap().unwrap();
        assert_eq!(parsed.get("foo"), Some("1"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            Frame::parse("HELLO\n\n\0"),
            Err(FrameError::UnknownCommand("HELLO".into()))
        );
        assert_eq!(
            Frame::parse("MESSAGE\nnocolon\n\n\0"),
            Err(FrameError::MalformedHeader("nocolon".into()))
        );
        assert_eq!(
            Frame::parse("MESSAGE\nk:v\\t\n\n\0"),
            Err(FrameError::InvalidEscape("v\\t".into()))
        );
        assert_eq!(
            Frame::parse("MESSAGE\n\nno terminator"),
            Err(FrameError::UnterminatedBody)
        );
        assert_eq!(Frame::parse("MESSAGE"), Err(FrameError::MissingCommand));
    }

    #[test]
    fn multibyte_body_length_is_in_bytes() {
        let f = Frame::new(Command::Send).body("héllo");
        let encoded = f.encode();
        assert!(encoded.contains("content-length:6"));
        let parsed = Frame::parse(&encoded).unwrap().unwrap();
        assert_eq!(parsed.body, "héllo");
    }
}
