//! Protocol types for client-daemon communication.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default TCP port of an MPD daemon.
pub const DEFAULT_PORT: u16 = 6600;

/// The decoded result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Command that produced this response. Diagnostic only.
    pub command: String,
    /// `key: value` lines. Later lines overwrite earlier ones.
    pub fields: HashMap<String, String>,
    /// Lines without a `": "` separator, in arrival order.
    pub unparsed: Vec<String>,
    /// Raw bytes from `binary: <n>` chunks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binary: Vec<u8>,
    /// Trimmed text after the terminating `OK`.
    pub status: String,
}

impl Response {
    /// Look up a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Quote a single command argument.
///
/// MPD splits arguments on whitespace unless they are double-quoted; inside
/// quotes, `"` and `\` must be backslash-escaped.
pub fn quote_arg(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Join a host and port into an address, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_field() {
        let mut response = Response::default();
        response.fields.insert("state".into(), "play".into());
        assert_eq!(response.get("state"), Some("play"));
        assert_eq!(response.get("volume"), None);
    }

    #[test]
    fn test_quote_plain_url() {
        assert_eq!(
            quote_arg("http://radio.example/stream"),
            "\"http://radio.example/stream\""
        );
    }

    #[test]
    fn test_quote_escapes_quotes_and_backslashes() {
        assert_eq!(quote_arg(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("localhost", 6600), "localhost:6600");
        assert_eq!(join_host_port("::1", 6600), "[::1]:6600");
        assert_eq!(join_host_port("[::1]", 6601), "[::1]:6601");
    }

    #[test]
    fn test_json_skips_empty_binary() {
        let response = Response {
            command: "status".into(),
            status: String::new(),
            ..Default::default()
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"command\":\"status\""));
        assert!(!json.contains("binary"));
    }
}
