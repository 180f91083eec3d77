//! `csomq` — action-graph client primitives for the legacy SharePoint
//! ClientSVC `ProcessQuery` endpoint.
//!
//! The endpoint accepts a batch of object-graph actions serialized as XML
//! and answers with a flat, position-correlated JSON array. This crate owns
//! the hard part of talking to it: building the action graph, serializing
//! it faithfully (escaping included), correlating the untyped response
//! array back into typed results by id, and threading identity tokens
//! through multi-round operations. Digest acquisition, retry policy, and
//! command-level concerns stay with the caller.
//!
//! # Architecture
//!
//! ```text
//! Graph           ← builder: static entry, method calls, property gets,
//!     │             identity anchors; per-graph id counter
//!     ▼
//! xml::serialize  ← deterministic <Request> envelope, centralized escaping
//!     │
//!     ▼
//! Transport       ← injected collaborator (HttpTransport = blocking POST
//!     │             with Content-Type: text/xml + X-RequestDigest)
//!     ▼
//! correlate       ← header check first (ErrorInfo = batch failed), then
//!     │             (id, payload) pairs indexed by id, never by position
//!     ▼
//! Runner          ← run_single / run_chained with identity threading
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use csomq::{Graph, HttpTransport, Runner, Select, Value};
//! use uuid::Uuid;
//!
//! let taxonomy: Uuid = "981cbc68-9edc-4f8d-872f-71146fcbb84f".parse()?;
//!
//! let mut g = Graph::new();
//! let session = g.add_static_entry(taxonomy, "GetTaxonomySession");
//! let store = g.add_method_call(session, "GetDefaultSiteCollectionTermStore", vec![]);
//! let groups = g.add_property_get(store, "Groups");
//! let group = g.add_method_call(groups, "GetByName", vec![Value::from("People")]);
//! let group_identity = g.add_identity_query(group);
//! let group_query = g.add_select_query(group, Select::All);
//!
//! let runner = Runner::new(HttpTransport::new(&site_url, &digest), "Contoso|Admin");
//! let response = runner.run_single(&g)?;
//! let name = response
//!     .object_for(group_query.into())
//!     .and_then(|o| o.string("Name"));
//! ```

pub mod classify;
pub mod error;
pub mod graph;
pub mod response;
pub mod runner;
pub mod transport;
pub mod value;
pub mod xml;

pub use classify::{classify, ErrorKind};
pub use error::{CsomError, Result};
pub use graph::{Graph, NodeId, Select};
pub use response::{
    correlate, ErrorInfo, FieldMap, Identity, Payload, ResponseHeader, ResponseMap,
};
pub use runner::{ChainResult, Identities, Runner, Step};
pub use transport::{HttpTransport, Transport, PROCESS_QUERY_PATH};
pub use value::Value;
