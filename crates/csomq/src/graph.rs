//! In-memory action graph: object-path nodes plus the ordered action list
//! that will be submitted in one ProcessQuery batch.
//!
//! Each `Graph` owns its own id counter — ids are assigned in call order
//! starting at [`Graph::BASE_ID`], and every id-consuming builder call
//! takes the next one. Adding a path node also records its `ObjectPath`
//! marker action (so a node costs two ids), which reproduces the id layout
//! the server-side context streaming expects.
//!
//! Parent references are validated eagerly; passing a [`NodeId`] from a
//! different graph is a programmer error and panics.

use uuid::Uuid;

use crate::response::Identity;
use crate::value::Value;

// ─── NodeId ───────────────────────────────────────────────────────────────

/// Batch-local identifier of an object-path node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> u32 {
        id.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ─── Node / Action ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) id: u32,
    pub(crate) kind: PathKind,
}

#[derive(Debug, Clone)]
pub(crate) enum PathKind {
    /// Static entry point — the graph root. Carries the server type id.
    StaticMethod { type_id: Uuid, name: String },
    /// Instance method invoked on a parent path.
    Method {
        parent: u32,
        name: String,
        params: Vec<Value>,
    },
    /// Property navigation on a parent path.
    Property { parent: u32, name: String },
    /// Path anchored at a server-issued `_ObjectIdentity_` token captured
    /// from an earlier batch.
    Identity { token: String },
}

#[derive(Debug, Clone)]
pub(crate) enum Action {
    /// No-op path marker — tells the server to materialize the path.
    ObjectPath { id: u32, path: u32 },
    /// Ask the server to return the path's `_ObjectIdentity_` token.
    IdentityQuery { id: u32, path: u32 },
    /// Ask the server to return the path's property set.
    Query { id: u32, path: u32, select: Select },
    /// Side-effect method call against a path (no new path node).
    Method {
        id: u32,
        path: u32,
        name: String,
        params: Vec<Value>,
    },
}

/// Which properties a `Query` action requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Select {
    All,
    Fields(Vec<String>),
}

// ─── Graph ────────────────────────────────────────────────────────────────

/// A dependency chain of object-path operations, built fresh per logical
/// operation, serialized once, and discarded after its response is
/// correlated.
#[derive(Debug)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) actions: Vec<Action>,
    next_id: u32,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// First id handed out by a fresh graph.
    pub const BASE_ID: u32 = 3;

    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            actions: Vec::new(),
            next_id: Self::BASE_ID,
        }
    }

    /// Seed the graph root: a static method on a server type.
    pub fn add_static_entry(&mut self, type_id: Uuid, name: &str) -> NodeId {
        self.add_path(PathKind::StaticMethod {
            type_id,
            name: name.to_owned(),
        })
    }

    /// Invoke `name` on `parent` as a new path node. Parameter order is
    /// significant — the server binds positionally.
    pub fn add_method_call(&mut self, parent: NodeId, name: &str, params: Vec<Value>) -> NodeId {
        self.assert_path(parent);
        self.add_path(PathKind::Method {
            parent: parent.0,
            name: name.to_owned(),
            params,
        })
    }

    /// Navigate property `name` on `parent` as a new path node.
    pub fn add_property_get(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.assert_path(parent);
        self.add_path(PathKind::Property {
            parent: parent.0,
            name: name.to_owned(),
        })
    }

    /// Anchor a path at an identity token captured from an earlier batch.
    /// Unlike the other path nodes this emits no `ObjectPath` marker — the
    /// server resolves the token directly.
    pub fn add_identity(&mut self, identity: &Identity) -> NodeId {
        let id = self.take_id();
        self.nodes.push(Node {
            id,
            kind: PathKind::Identity {
                token: identity.token.clone(),
            },
        });
        NodeId(id)
    }

    /// Ask the response to carry `node`'s `_ObjectIdentity_` token. Call on
    /// every node a later batch may need to reference. Returns the query's
    /// own id — the response keys the captured token under it.
    pub fn add_identity_query(&mut self, node: NodeId) -> NodeId {
        self.assert_path(node);
        let id = self.take_id();
        self.actions.push(Action::IdentityQuery { id, path: node.0 });
        NodeId(id)
    }

    /// Ask the response to carry `node`'s property set. Returns the query's
    /// own id — the response keys the materialized object under it.
    pub fn add_select_query(&mut self, node: NodeId, select: Select) -> NodeId {
        self.assert_path(node);
        let id = self.take_id();
        self.actions.push(Action::Query {
            id,
            path: node.0,
            select,
        });
        NodeId(id)
    }

    /// Invoke `name` on `target` for its side effect, without creating a
    /// new path node (the form used for `SetDescription`, `CommitAll`, …
    /// against identity anchors). Returns the action's id so the caller can
    /// look up a per-action result if the server emits one.
    pub fn invoke_method(&mut self, target: NodeId, name: &str, params: Vec<Value>) -> NodeId {
        self.assert_path(target);
        let id = self.take_id();
        self.actions.push(Action::Method {
            id,
            path: target.0,
            name: name.to_owned(),
            params,
        });
        NodeId(id)
    }

    /// Number of actions recorded so far.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Number of object-path nodes recorded so far.
    pub fn path_count(&self) -> usize {
        self.nodes.len()
    }

    fn add_path(&mut self, kind: PathKind) -> NodeId {
        let id = self.take_id();
        self.nodes.push(Node { id, kind });
        let action_id = self.take_id();
        self.actions.push(Action::ObjectPath {
            id: action_id,
            path: id,
        });
        NodeId(id)
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn assert_path(&self, node: NodeId) {
        assert!(
            self.nodes.iter().any(|n| n.id == node.0),
            "object path {node} does not belong to this graph"
        );
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
