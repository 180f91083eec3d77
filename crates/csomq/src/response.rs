//! Decoding of the flat ProcessQuery response array.
//!
//! The endpoint answers every batch with a JSON array: a header object in
//! slot 0, then `(id, payload)` pairs for every action that produced output.
//! This module decodes that array exactly once into typed entries indexed
//! by id; downstream code never re-inspects raw JSON or reasons about array
//! positions.
//!
//! The header's `ErrorInfo` is the only authoritative success signal for a
//! batch — an HTTP 200 with a populated `ErrorInfo` is a failed batch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::{CsomError, Result};
use crate::value::{decode_legacy_date, decode_legacy_guid};

/// Reserved field naming the server type of a materialized object.
pub const OBJECT_TYPE_FIELD: &str = "_ObjectType_";
/// Reserved field carrying the opaque identity token of an object.
pub const OBJECT_IDENTITY_FIELD: &str = "_ObjectIdentity_";

// ─── Header / ErrorInfo ───────────────────────────────────────────────────

/// Slot 0 of every response array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseHeader {
    pub schema_version: String,
    pub library_version: String,
    pub error_info: Option<ErrorInfo>,
    #[serde(default)]
    pub trace_correlation_id: String,
}

/// Server-reported batch failure. When present the whole batch failed,
/// whatever else the array contains.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorInfo {
    /// Preserved verbatim — frequently the only actionable detail.
    pub error_message: String,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_type_name: String,
    #[serde(default)]
    pub trace_correlation_id: String,
}

// ─── Identity ─────────────────────────────────────────────────────────────

/// An opaque server-issued token correlating a remote object across
/// request/response boundaries and across batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The response id this token was returned under in the producing batch.
    pub source_id: u32,
    /// The raw `_ObjectIdentity_` string, fed back verbatim into follow-up
    /// requests.
    pub token: String,
}

// ─── Payload ──────────────────────────────────────────────────────────────

/// One decoded result entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `{"IsNull": b}` — null-marker for a path step (`false` means the
    /// object exists).
    IsNull(bool),
    /// Identity-only result of an `ObjectIdentityQuery` action.
    IdentityRef(String),
    /// A materialized remote object; mapping the field set onto a specific
    /// domain type is the caller's job.
    Object(FieldMap),
}

impl Payload {
    fn from_json(value: Json) -> Result<Payload> {
        let Json::Object(map) = value else {
            return Err(CsomError::Malformed(format!(
                "result payload is not an object: {value}"
            )));
        };
        if map.len() == 1 {
            if let Some(Json::Bool(b)) = map.get("IsNull") {
                return Ok(Payload::IsNull(*b));
            }
            if let Some(Json::String(token)) = map.get(OBJECT_IDENTITY_FIELD) {
                return Ok(Payload::IdentityRef(token.clone()));
            }
        }
        Ok(Payload::Object(FieldMap(map)))
    }
}

// ─── FieldMap ─────────────────────────────────────────────────────────────

/// The raw field set of a materialized remote object, with typed accessors.
///
/// `date` and `guid` apply the legacy `/Date(ms)/` and `/Guid(...)/`
/// decoders: an absent field is `Ok(None)`, a present-but-malformed field
/// is a decode error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap(serde_json::Map<String, Json>);

impl FieldMap {
    pub fn raw(&self, name: &str) -> Option<&Json> {
        self.0.get(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.raw(name).and_then(Json::as_str)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.raw(name).and_then(Json::as_bool)
    }

    pub fn int32(&self, name: &str) -> Option<i32> {
        self.raw(name)
            .and_then(Json::as_i64)
            .and_then(|n| i32::try_from(n).ok())
    }

    pub fn date(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        match self.raw(name) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => decode_legacy_date(s).map(Some),
            Some(other) => Err(CsomError::Decode {
                kind: "date",
                raw: other.to_string(),
            }),
        }
    }

    pub fn guid(&self, name: &str) -> Result<Option<Uuid>> {
        match self.raw(name) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => decode_legacy_guid(s).map(Some),
            Some(other) => Err(CsomError::Decode {
                kind: "guid",
                raw: other.to_string(),
            }),
        }
    }

    /// The `_ObjectType_` reserved field, when the server included it.
    pub fn object_type(&self) -> Option<&str> {
        self.string(OBJECT_TYPE_FIELD)
    }

    /// The `_ObjectIdentity_` reserved field, when the server included it.
    pub fn identity_token(&self) -> Option<&str> {
        self.string(OBJECT_IDENTITY_FIELD)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ─── Correlation ──────────────────────────────────────────────────────────

/// Decoded response of one batch, indexed by id.
#[derive(Debug)]
pub struct ResponseMap {
    header: ResponseHeader,
    entries: BTreeMap<u32, Payload>,
}

impl ResponseMap {
    pub fn header(&self) -> &ResponseHeader {
        &self.header
    }

    /// Number of decoded `(id, payload)` entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids present in the response, ascending.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// The payload returned for `id`.
    ///
    /// The server omits ids that produced no separate payload, so an absent
    /// id returns `None` rather than erroring — callers that cannot proceed
    /// without a result should treat `None` as their own failure. Always
    /// select by the id of interest: the entry a caller wants is frequently
    /// not the last one in the array.
    pub fn payload(&self, id: u32) -> Option<&Payload> {
        self.entries.get(&id)
    }

    /// The identity token captured for `id`, from either an identity-only
    /// entry or the `_ObjectIdentity_` field of a materialized object.
    pub fn identity_for(&self, id: u32) -> Option<Identity> {
        let token = match self.payload(id)? {
            Payload::IdentityRef(token) => token.as_str(),
            Payload::Object(map) => map.identity_token()?,
            Payload::IsNull(_) => return None,
        };
        Some(Identity {
            source_id: id,
            token: token.to_owned(),
        })
    }

    /// The materialized object returned for `id`, if that entry is one.
    pub fn object_for(&self, id: u32) -> Option<&FieldMap> {
        match self.payload(id)? {
            Payload::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The null-marker returned for `id`, if that entry is one.
    pub fn is_null(&self, id: u32) -> Option<bool> {
        match self.payload(id)? {
            Payload::IsNull(b) => Some(*b),
            _ => None,
        }
    }
}

/// Parse a raw response body into a [`ResponseMap`].
///
/// A populated header `ErrorInfo` short-circuits to
/// [`CsomError::Remote`] without touching the remaining entries — their
/// shape is unreliable after a failure. Any envelope-shape violation is
/// [`CsomError::Malformed`].
pub fn correlate(raw: &str) -> Result<ResponseMap> {
    let parsed: Json = serde_json::from_str(raw)
        .map_err(|e| CsomError::Malformed(format!("response is not JSON: {e}")))?;
    let Json::Array(slots) = parsed else {
        return Err(CsomError::Malformed("response is not an array".into()));
    };

    let mut slots = slots.into_iter();
    let header_slot = slots
        .next()
        .ok_or_else(|| CsomError::Malformed("response array is empty".into()))?;
    let mut header: ResponseHeader = serde_json::from_value(header_slot)
        .map_err(|e| CsomError::Malformed(format!("bad response header: {e}")))?;

    if let Some(info) = header.error_info.take() {
        return Err(CsomError::Remote(info));
    }

    let mut entries = BTreeMap::new();
    while let Some(id_slot) = slots.next() {
        let id = id_slot
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                CsomError::Malformed(format!("expected numeric id slot, got {id_slot}"))
            })?;
        let payload_slot = slots
            .next()
            .ok_or_else(|| CsomError::Malformed(format!("id {id} has no result payload")))?;
        entries.insert(id, Payload::from_json(payload_slot)?);
    }

    Ok(ResponseMap { header, entries })
}

// ─── Tests ────────────────────────────────────────────────────────────────
