//! Cookie string codec and the session credential type.
//!
//! Cookies travel as a single `name=value; name=value` string, both in the
//! browser's `Cookie` header and in the credential we inject into requests.

use std::collections::BTreeMap;
use std::fmt;

/// Cookie names the web chat API needs for an authenticated session.
pub const REQUIRED_COOKIES: &[&str] = &[
    "SCF",
    "SUB",
    "SUBP",
    "ALF",
    "_s_tentry",
    "Apache",
    "SINAGLOBAL",
    "ULV",
];

const SEPARATOR: &str = "; ";

/// Parse a `Cookie` header style string into name/value pairs.
///
/// Entries are split on `;`, names and values are trimmed, and entries
/// without `=` or with an empty name are dropped. Later duplicates win.
pub fn parse_cookie_string(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|entry| {
            let (name, value) = entry.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Serialize cookies back into `name=value; name=value` form.
pub fn to_cookie_string(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Required cookie names absent from `cookies`.
pub fn missing_required(cookies: &BTreeMap<String, String>) -> Vec<&'static str> {
    REQUIRED_COOKIES
        .iter()
        .copied()
        .filter(|name| !cookies.contains_key(*name))
        .collect()
}

/// Opaque serialized cookie set. Injected verbatim as the `Cookie` header.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_cookies(cookies: &BTreeMap<String, String>) -> Self {
        Self(to_cookie_string(cookies))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

// Keep cookie values out of logs and panic messages.
impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCredential(<{} bytes>)", self.0.len())
    }
}

impl From<&str> for SessionCredential {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SessionCredential {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_cookie_string() {
        let cookies = parse_cookie_string("SCF=test1; SUB=test2; SUBP=test3");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["SCF"], "test1");
        assert_eq!(cookies["SUB"], "test2");
        assert_eq!(cookies["SUBP"], "test3");
    }

    #[test]
    fn trims_names_and_values() {
        let cookies = parse_cookie_string("  SCF =  a ;SUB=b  ");
        assert_eq!(cookies["SCF"], "a");
        assert_eq!(cookies["SUB"], "b");
    }

    #[test]
    fn splits_value_on_first_equals_only() {
        let cookies = parse_cookie_string("SUBP=abc==; ULV=1:2:3");
        assert_eq!(cookies["SUBP"], "abc==");
        assert_eq!(cookies["ULV"], "1:2:3");
    }

    #[test]
    fn drops_malformed_entries() {
        let cookies = parse_cookie_string("garbage; =novalue; ;;SUB=x");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies["SUB"], "x");
    }

    #[test]
    fn empty_input_yields_no_cookies() {
        assert!(parse_cookie_string("").is_empty());
        assert!(parse_cookie_string(" ; ").is_empty());
    }

    #[test]
    fn later_duplicates_win() {
        let cookies = parse_cookie_string("SUB=old; SUB=new");
        assert_eq!(cookies["SUB"], "new");
    }

    #[test]
    fn serializes_with_semicolon_space() {
        let mut cookies = BTreeMap::new();
        cookies.insert("SUB".to_string(), "b".to_string());
        cookies.insert("SCF".to_string(), "a".to_string());
        assert_eq!(to_cookie_string(&cookies), "SCF=a; SUB=b");
    }

    #[test]
    fn serialize_then_parse_keeps_pairs() {
        let original = parse_cookie_string("SCF=value1; SUB=value2; SUBP=value3");
        let reparsed = parse_cookie_string(&to_cookie_string(&original));
        assert_eq!(original, reparsed);
    }

    #[test]
    fn reports_missing_required_cookies() {
        let cookies = parse_cookie_string("SCF=a; SUB=b; SUBP=c; ALF=d");
        let missing = missing_required(&cookies);
        assert_eq!(missing, vec!["_s_tentry", "Apache", "SINAGLOBAL", "ULV"]);
    }

    #[test]
    fn credential_debug_hides_value() {
        let credential = SessionCredential::new("SUB=secret");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("10 bytes"));
    }

    #[test]
    fn credential_is_passed_through_unchanged() {
        let credential = SessionCredential::from("SCF=a; SUB=b");
        assert_eq!(credential.as_str(), "SCF=a; SUB=b");
        assert!(!credential.is_empty());
        assert!(SessionCredential::new("  ").is_empty());
    }
}
