//! Coarse classification of server-reported batch failures.
//!
//! Classification only decides whether a caller may retry or how it frames
//! the failure; the raw `error_message` stays untouched on the
//! [`ErrorInfo`] and is what users should see.

use std::fmt;

use crate::response::ErrorInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The navigated object (group, set, term, …) does not exist.
    NotFound,
    /// The operation collides with existing state, e.g. a duplicate name.
    Conflict,
    PermissionDenied,
    /// Throttling or server-side congestion; the batch may be retried.
    Transient,
    Unknown,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Transient => "transient",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substring rules over `ErrorTypeName`; first match wins.
///
/// The endpoint raises `ArgumentOutOfRangeException` when a by-name or
/// by-id navigation step misses (missing term group, term set, …), which
/// is why it maps to `NotFound`.
const TYPE_RULES: &[(&str, ErrorKind)] = &[
    ("ArgumentOutOfRangeException", ErrorKind::NotFound),
    ("FileNotFoundException", ErrorKind::NotFound),
    ("ItemNotFoundException", ErrorKind::NotFound),
    ("ResourceNotFoundException", ErrorKind::NotFound),
    ("UnauthorizedAccessException", ErrorKind::PermissionDenied),
    ("AccessDeniedException", ErrorKind::PermissionDenied),
    ("ServerBusyException", ErrorKind::Transient),
    ("TimeoutException", ErrorKind::Transient),
];

/// Well-known HRESULTs, checked after the type rules.
const CODE_RULES: &[(i64, ErrorKind)] = &[
    // 0x80070005 E_ACCESSDENIED
    (-2147024891, ErrorKind::PermissionDenied),
];

/// Map a server-reported failure onto a coarse [`ErrorKind`].
pub fn classify(info: &ErrorInfo) -> ErrorKind {
    for (needle, kind) in TYPE_RULES {
        if info.error_type_name.contains(needle) {
            return *kind;
        }
    }
    for (code, kind) in CODE_RULES {
        if info.error_code == *code {
            return *kind;
        }
    }

    // Conflicts surface through operation exceptions whose type name says
    // nothing useful (e.g. TermStoreOperationException on a duplicate
    // default label), so they are matched on the message.
    let message = info.error_message.to_ascii_lowercase();
    if message.contains("already") && (message.contains("exist") || message.contains("same")) {
        return ErrorKind::Conflict;
    }
    if message.contains("does not exist") || message.contains("could not be found") {
        return ErrorKind::NotFound;
    }
    if message.contains("too many requests") || message.contains("try again") {
        return ErrorKind::Transient;
    }

    ErrorKind::Unknown
}

// ─── Tests ────────────────────────────────────────────────────────────────
