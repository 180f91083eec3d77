//! Typed parameter values and the legacy wire encodings.
//!
//! Everything that crosses the ProcessQuery wire as text funnels through
//! this module: XML escaping for string literals, the two GUID renderings,
//! and the `/Date(ms)/` / `/Guid(...)/` decoders used on response fields.

use std::borrow::Cow;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{CsomError, Result};

// ─── Value ────────────────────────────────────────────────────────────────

/// A typed method parameter. The server binds parameters positionally, so
/// ordering is the caller's responsibility; each variant has exactly one
/// wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int32(i32),
    Boolean(bool),
    Guid(Uuid),
    Array(Vec<Value>),
}

impl Value {
    /// The `Type` attribute the server expects for this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Int32(_) => "Int32",
            Value::Boolean(_) => "Boolean",
            Value::Guid(_) => "Guid",
            Value::Array(_) => "Array",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Guid(u)
    }
}

// ─── XML escaping ─────────────────────────────────────────────────────────

/// Escape the three characters the ClientSVC endpoint requires escaped in
/// element text and attribute values: `&`, `<`, `>`.
///
/// Every string literal embedded in a request (parameter values, member
/// names, identity tokens, property keys and values) must pass through
/// here; an unescaped `<` or `&` corrupts the envelope, so this is a
/// correctness concern before it is a security one.
pub fn escape_xml_text(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

// ─── GUID renderings ──────────────────────────────────────────────────────

/// `{lowercase-hyphenated}` — the form used for `Type="Guid"` parameters
/// and `StaticMethod` `TypeId` attributes.
pub fn braced_guid(id: Uuid) -> String {
    format!("{{{}}}", id.hyphenated())
}

/// Lowercase hyphenated with no braces — the form used when a GUID is
/// embedded as a plain string literal.
pub fn bare_guid(id: Uuid) -> String {
    id.hyphenated().to_string()
}

// ─── Legacy value decoding ────────────────────────────────────────────────

/// Decode the legacy `/Date(<millis>)/` encoding into an absolute instant.
pub fn decode_legacy_date(raw: &str) -> Result<DateTime<Utc>> {
    let millis = raw
        .strip_prefix("/Date(")
        .and_then(|r| r.strip_suffix(")/"))
        .and_then(|r| r.parse::<i64>().ok())
        .ok_or_else(|| CsomError::Decode {
            kind: "date",
            raw: raw.to_owned(),
        })?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| CsomError::Decode {
            kind: "date",
            raw: raw.to_owned(),
        })
}

/// Decode the legacy `/Guid(<uuid>)/` encoding into a canonical UUID.
pub fn decode_legacy_guid(raw: &str) -> Result<Uuid> {
    raw.strip_prefix("/Guid(")
        .and_then(|r| r.strip_suffix(")/"))
        .and_then(|r| Uuid::parse_str(r).ok())
        .ok_or_else(|| CsomError::Decode {
            kind: "guid",
            raw: raw.to_owned(),
        })
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_reserved_characters() {
        assert_eq!(
            escape_xml_text("R&D <Internal>"),
            "R&amp;D &lt;Internal&gt;"
        );
    }

    #[test]
    fn escape_borrows_when_nothing_to_do() {
        assert!(matches!(escape_xml_text("People"), Cow::Borrowed(_)));
    }

    #[test]
    fn escape_leaves_quotes_alone() {
        // The endpoint only requires & < > escaped; quotes pass through.
        assert_eq!(escape_xml_text(r#"it's "fine""#), r#"it's "fine""#);
    }

    #[test]
    fn guid_renderings() {
        let id = Uuid::parse_str("47fdacfe-ff64-4a05-b611-e84e767f04de").unwrap();
        assert_eq!(braced_guid(id), "{47fdacfe-ff64-4a05-b611-e84e767f04de}");
        assert_eq!(bare_guid(id), "47fdacfe-ff64-4a05-b611-e84e767f04de");
    }

    #[test]
    fn decode_date_millis() {
        let ts = decode_legacy_date("/Date(1540235503669)/").unwrap();
        assert_eq!(ts.timestamp_millis(), 1_540_235_503_669);
        assert_eq!(ts.to_rfc3339(), "2018-10-22T19:11:43.669+00:00");
    }

    #[test]
    fn decode_date_rejects_garbage() {
        for raw in ["/Date()/", "/Date(abc)/", "1540235503669", "/Date(1)"] {
            let err = decode_legacy_date(raw).unwrap_err();
            assert!(matches!(err, CsomError::Decode { kind: "date", .. }));
            assert!(err.to_string().contains(raw));
        }
    }

    #[test]
    fn decode_guid_canonical() {
        let id = decode_legacy_guid("/Guid(47fdacfe-ff64-4a05-b611-e84e767f04de)/").unwrap();
        assert_eq!(id.to_string(), "47fdacfe-ff64-4a05-b611-e84e767f04de");
    }

    #[test]
    fn decode_guid_rejects_garbage() {
        let err = decode_legacy_guid("/Guid(not-a-guid)/").unwrap_err();
        assert!(matches!(err, CsomError::Decode { kind: "guid", .. }));
    }

    #[test]
    fn type_names_are_stable() {
        assert_eq!(Value::String("x".into()).type_name(), "String");
        assert_eq!(Value::Int32(1033).type_name(), "Int32");
        assert_eq!(Value::Boolean(true).type_name(), "Boolean");
        assert_eq!(Value::Guid(Uuid::nil()).type_name(), "Guid");
        assert_eq!(Value::Array(vec![]).type_name(), "Array");
    }
}
