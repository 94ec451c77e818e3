use crate::models::{LogLine, ParsedRecord};
use crate::timestamp::TimestampNormalizer;
use chrono_tz::Tz;
use regex::Regex;

// IPv4, full IPv6, compressed IPv6 - alternation order is the precedence order.
// Compressed forms ending in a dotted quad (`::ffff:10.0.0.1`) come before the
// plain compressed forms, which would otherwise stop at the first '.'.
const CLIENT_IP_PATTERN: &str = concat!(
    r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b",
    r"|\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
    r"|(?:\b[0-9a-fA-F]{1,4}(?::[0-9a-fA-F]{1,4}){0,5})?::(?:[0-9a-fA-F]{1,4}:){0,5}(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b",
    r"|\b[0-9a-fA-F]{1,4}(?::[0-9a-fA-F]{1,4}){0,6}::(?:[0-9a-fA-F]{1,4}(?::[0-9a-fA-F]{1,4}){0,6}\b)?",
    r"|::[0-9a-fA-F]{1,4}(?::[0-9a-fA-F]{1,4}){0,6}\b",
);

// "GET /path/to/endpoint HTTP/1.1"
const REQUEST_PATTERN: &str = r#""(?P<method>[A-Z]+) (?P<path>\S+) HTTP"#;

/// Where a user agent candidate is taken from. `ALL` is the order they are tried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UserAgentSource {
    /// Last quoted string on the line
    LastQuoted,
    /// `... "referer" "agent"` at end of line
    TrailingQuoted,
    /// Apache combined: quoted referer followed by quoted agent
    Combined,
    /// `"request" status size "agent"`
    CombinedWithSize,
    /// Unquoted scan starting at a known browser token
    BrowserToken,
}

impl UserAgentSource {
    pub(crate) const ALL: [UserAgentSource; 5] = [
        UserAgentSource::LastQuoted,
        UserAgentSource::TrailingQuoted,
        UserAgentSource::Combined,
        UserAgentSource::CombinedWithSize,
        UserAgentSource::BrowserToken,
    ];

    #[allow(dead_code)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            UserAgentSource::LastQuoted => "last-quoted",
            UserAgentSource::TrailingQuoted => "trailing-quoted",
            UserAgentSource::Combined => "combined",
            UserAgentSource::CombinedWithSize => "combined-with-size",
            UserAgentSource::BrowserToken => "browser-token",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            UserAgentSource::LastQuoted => r#""([^"]*)"[^"]*$"#,
            UserAgentSource::TrailingQuoted => r#"" "([^"]*)"$"#,
            UserAgentSource::Combined => r#""[^"]*" "([^"]*)"$"#,
            UserAgentSource::CombinedWithSize => r#""[^"]*" \d+ \d+ "([^"]*)"$"#,
            UserAgentSource::BrowserToken => r#"((?:Mozilla|Opera)[^"]*)"#,
        }
    }

    fn accepts(self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        match self {
            UserAgentSource::BrowserToken => true,
            _ => !candidate.chars().all(|c| c.is_numeric()) && candidate.chars().count() > 1,
        }
    }
}

/// One step of the user agent fallback chain
pub(crate) struct UserAgentExtractor {
    source: UserAgentSource,
    regex: Regex,
}

impl UserAgentExtractor {
    fn new(source: UserAgentSource) -> Self {
        Self {
            source,
            regex: Regex::new(source.pattern()).unwrap(),
        }
    }

    pub(crate) fn source(&self) -> UserAgentSource {
        self.source
    }

    pub(crate) fn extract(&self, line: &str) -> Option<String> {
        let captures = self.regex.captures(line)?;
        let candidate = captures.get(1)?.as_str().trim();

        if self.source.accepts(candidate) {
            Some(candidate.to_string())
        } else {
            None
        }
    }
}

/// Extracts client address, timestamp, request and user agent from a raw line.
///
/// Only the first address on a line is used. Lines carrying forwarded-for
/// chains report the left-most address found, not the originating client.
pub(crate) struct LogParser {
    client_ip_regex: Regex,
    request_regex: Regex,
    user_agent_chain: Vec<UserAgentExtractor>,
    timestamps: TimestampNormalizer,
}

impl LogParser {
    pub(crate) fn new(local_tz: Tz) -> Self {
        let client_ip_regex = Regex::new(CLIENT_IP_PATTERN).unwrap();
        let request_regex = Regex::new(REQUEST_PATTERN).unwrap();

        let user_agent_chain = UserAgentSource::ALL
            .iter()
            .map(|source| UserAgentExtractor::new(*source))
            .collect();

        Self {
            client_ip_regex,
            request_regex,
            user_agent_chain,
            timestamps: TimestampNormalizer::new(local_tz),
        }
    }

    pub(crate) fn parse_line(&self, line: LogLine<'_>) -> ParsedRecord {
        let text = line.text;
        let (method, path) = match self.extract_request(text) {
            Some((method, path)) => (Some(method), Some(path)),
            None => (None, None),
        };

        ParsedRecord {
            client_ip: self.extract_client_ip(text),
            timestamp: self.timestamps.normalize(text),
            method,
            path,
            user_agent: self.extract_user_agent(text),
            source_line: line.number,
        }
    }

    pub(crate) fn extract_client_ip(&self, line: &str) -> Option<String> {
        self.client_ip_regex
            .find(line)
            .map(|m| m.as_str().to_string())
    }

    pub(crate) fn extract_request(&self, line: &str) -> Option<(String, String)> {
        let captures = self.request_regex.captures(line)?;
        let method = captures.name("method")?.as_str().to_string();
        let path = captures.name("path")?.as_str().to_string();
        Some((method, path))
    }

    pub(crate) fn extract_user_agent(&self, line: &str) -> Option<String> {
        let user_agent = self
            .user_agent_chain
            .iter()
            .find_map(|extractor| extractor.extract(line))?;

        // "-" is the log placeholder for a missing header
        if user_agent == "-" {
            None
        } else {
            Some(user_agent)
        }
    }

    #[allow(dead_code)]
    pub(crate) fn user_agent_sources(&self) -> Vec<UserAgentSource> {
        self.user_agent_chain.iter().map(|e| e.source()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn parser() -> LogParser {
        LogParser::new(chrono_tz::UTC)
    }

    fn line(text: &str) -> LogLine<'_> {
        LogLine { number: 1, text }
    }

    #[test]
    fn test_parse_combined_log_line() {
        let parser = parser();
        let text = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 2326 "http://example.com/start" "Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0""#;

        let record = parser.parse_line(LogLine { number: 42, text });

        assert_eq!(record.client_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(
            record.timestamp,
            Some(NaiveDateTime::parse_from_str("2023-10-10 13:55:36", "%Y-%m-%d %H:%M:%S").unwrap())
        );
        assert_eq!(record.method.as_deref(), Some("GET"));
        assert_eq!(record.path.as_deref(), Some("/index.html"));
        assert_eq!(
            record.user_agent.as_deref(),
            Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0")
        );
        assert_eq!(record.source_line, 42);
    }

    #[test]
    fn test_lancache_line() {
        let parser = parser();
        let text = r#"[steam] 172.16.1.143 / - - - [29/Aug/2025:19:48:49 -0500] "GET /depot/2767031/chunk/115d1e0e HTTP/1.1" 200 414016 "-" "Valve/Steam HTTP Client 1.0" "MISS" "fastly.cdn.steampipe.steamcontent.com" "-""#;

        let record = parser.parse_line(line(text));

        assert_eq!(record.client_ip.as_deref(), Some("172.16.1.143"));
        assert_eq!(record.path.as_deref(), Some("/depot/2767031/chunk/115d1e0e"));
        // Last quoted field is "-", every quoted fallback ends on it, no browser token
        assert_eq!(record.user_agent, None);
    }

    #[test]
    fn test_only_first_address_is_used() {
        let parser = parser();
        let text = r#"10.1.1.1 forwarded-for 203.0.113.9 "GET / HTTP/1.1""#;
        assert_eq!(parser.extract_client_ip(text).as_deref(), Some("10.1.1.1"));
    }

    #[test]
    fn test_ipv6_addresses() {
        let parser = parser();

        let full = "2001:0db8:85a3:0000:0000:8a2e:0370:7334 - - [25/Dec/2023:10:15:30]";
        assert_eq!(
            parser.extract_client_ip(full).as_deref(),
            Some("2001:0db8:85a3:0000:0000:8a2e:0370:7334")
        );

        let compressed = "client=fe80::1ff:fe23:4567:890a GET /";
        assert_eq!(
            parser.extract_client_ip(compressed).as_deref(),
            Some("fe80::1ff:fe23:4567:890a")
        );

        let loopback = "::1 - - [25/Dec/2023:10:15:30] \"GET / HTTP/1.1\"";
        assert_eq!(parser.extract_client_ip(loopback).as_deref(), Some("::1"));

        // A path separator followed by a non-hex name is not an address
        assert_eq!(parser.extract_client_ip("panic in std::io at line 3"), None);

        // Known limitation: `::` followed by a hex-only name reads as compressed
        // IPv6 and wins over a later IPv4 on the same line
        assert_eq!(
            parser.extract_client_ip("error in Vec::add handler, client 10.0.0.9").as_deref(),
            Some("::add")
        );
    }

    #[test]
    fn test_ipv4_mapped_addresses_keep_their_dotted_quad() {
        let parser = parser();
        let first = parser.extract_client_ip("::ffff:10.0.0.1 - - [25/Dec/2023:10:15:30] \"GET / HTTP/1.1\"");
        let second = parser.extract_client_ip("::ffff:10.0.0.2 - - [25/Dec/2023:10:15:30] \"GET / HTTP/1.1\"");

        assert_eq!(first.as_deref(), Some("::ffff:10.0.0.1"));
        assert_eq!(second.as_deref(), Some("::ffff:10.0.0.2"));
        assert_ne!(first, second);

        let nat64 = "client=64:ff9b::192.0.2.33 GET /";
        assert_eq!(parser.extract_client_ip(nat64).as_deref(), Some("64:ff9b::192.0.2.33"));
    }

    #[test]
    fn test_ipv4_wins_over_later_ipv6() {
        let parser = parser();
        let text = "192.168.0.7 via fe80::1 2023-12-25 10:15:30";
        assert_eq!(parser.extract_client_ip(text).as_deref(), Some("192.168.0.7"));
    }

    #[test]
    fn test_no_address() {
        let parser = parser();
        let record = parser.parse_line(line("2023-12-25 10:15:30 server started"));
        assert_eq!(record.client_ip, None);
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_request_extraction() {
        let parser = parser();
        assert_eq!(
            parser.extract_request(r#"1.2.3.4 "POST /api/users?id=7 HTTP/2.0" 201"#),
            Some(("POST".to_string(), "/api/users?id=7".to_string()))
        );
        // Request token must be quoted
        assert_eq!(parser.extract_request("1.2.3.4 GET /api/users HTTP/1.1"), None);
        // Lowercase method is not a request token
        assert_eq!(parser.extract_request(r#""get /a HTTP/1.1""#), None);
    }

    #[test]
    fn test_user_agent_chain_order() {
        let parser = parser();
        assert_eq!(parser.user_agent_sources(), UserAgentSource::ALL.to_vec());
        assert_eq!(UserAgentSource::ALL[0].name(), "last-quoted");
        assert_eq!(UserAgentSource::ALL[4].name(), "browser-token");
    }

    #[test]
    fn test_numeric_quoted_field_falls_back_to_browser_token() {
        let parser = parser();
        let text = r#"10.0.0.1 "GET /a HTTP/1.1" "Mozilla/5.0 Chrome/120.0" "200""#;
        assert_eq!(
            parser.extract_user_agent(text).as_deref(),
            Some("Mozilla/5.0 Chrome/120.0")
        );
    }

    #[test]
    fn test_unquoted_user_agent_found_by_browser_token() {
        let parser = parser();
        let text = "2023-12-25 10:15:30 192.168.1.10 GET /api/users Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
        assert_eq!(
            parser.extract_user_agent(text).as_deref(),
            Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
        );
    }

    #[test]
    fn test_placeholder_user_agent_is_absent() {
        let parser = parser();
        let text = r#"10.0.0.1 - - [25/Dec/2023:10:15:30] "GET / HTTP/1.1" 200 12 "-" "-""#;
        assert_eq!(parser.extract_user_agent(text), None);
    }

    #[test]
    fn test_user_agent_is_trimmed() {
        let parser = parser();
        let text = r#"10.0.0.1 "GET / HTTP/1.1" 200 12 "-" "  curl/8.4.0  ""#;
        assert_eq!(parser.extract_user_agent(text).as_deref(), Some("curl/8.4.0"));
    }

    #[test]
    fn test_single_char_candidate_rejected() {
        let extractor = UserAgentExtractor::new(UserAgentSource::LastQuoted);
        assert_eq!(extractor.extract(r#"a "x" b"#), None);
        assert_eq!(extractor.extract(r#"a "12345" b"#), None);
        assert_eq!(extractor.extract(r#"a "" b"#), None);
        assert_eq!(extractor.extract(r#"a "ok" b"#).as_deref(), Some("ok"));
    }

    #[test]
    fn test_garbage_line_yields_empty_record() {
        let parser = parser();
        let record = parser.parse_line(LogLine { number: 7, text: "%%% not a log line %%%" });
        assert_eq!(
            record,
            ParsedRecord {
                source_line: 7,
                ..Default::default()
            }
        );
    }
}
