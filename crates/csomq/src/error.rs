use thiserror::Error;

use crate::response::ErrorInfo;

#[derive(Debug, Error)]
pub enum CsomError {
    /// The server executed the batch and reported a logical failure in the
    /// response header. The message is the server's, verbatim — it is
    /// usually the only actionable detail the caller has to show.
    #[error("{}", .0.error_message)]
    Remote(ErrorInfo),

    /// The response text does not match the expected envelope shape
    /// (non-array JSON, missing header, dangling id slot, …). Covers HTML
    /// error pages served with HTTP 200. Not retryable.
    #[error("malformed ProcessQuery response: {0}")]
    Malformed(String),

    /// A legacy-encoded value inside an otherwise well-formed response
    /// failed to decode. Carries the offending raw text.
    #[error("malformed legacy {kind} value: {raw:?}")]
    Decode { kind: &'static str, raw: String },

    /// The injected transport failed before a response body was available.
    #[error("transport error: {0}")]
    Transport(String),

    /// A chain step asked for an identity token no prior response produced.
    #[error("no identity captured for object path {0}")]
    MissingIdentity(u32),
}

pub type Result<T> = std::result::Result<T, CsomError>;
