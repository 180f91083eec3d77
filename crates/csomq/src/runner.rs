//! Batch execution: serialize, send, correlate — once, or as an ordered
//! chain of dependent batches threading identity tokens.

use std::collections::BTreeMap;

use crate::error::{CsomError, Result};
use crate::graph::Graph;
use crate::response::{correlate, Identity, ResponseMap};
use crate::transport::Transport;
use crate::xml;

// ─── Identities ───────────────────────────────────────────────────────────

/// Identity tokens captured so far in one chain, keyed by the response id
/// they were returned under. Owned by the orchestration for the lifetime of
/// one command invocation; never persisted.
#[derive(Debug, Default)]
pub struct Identities(BTreeMap<u32, Identity>);

impl Identities {
    pub fn get(&self, id: u32) -> Option<&Identity> {
        self.0.get(&id)
    }

    /// Like [`get`](Self::get), but a missing token is a typed error — use
    /// this in a step that cannot build its graph without the token.
    pub fn require(&self, id: u32) -> Result<&Identity> {
        self.0.get(&id).ok_or(CsomError::MissingIdentity(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn absorb(&mut self, response: &ResponseMap) {
        for id in response.ids() {
            if let Some(identity) = response.identity_for(id) {
                self.0.insert(id, identity);
            }
        }
    }
}

// ─── Steps / ChainResult ──────────────────────────────────────────────────

/// One round of a chained execution: builds the batch graph from the
/// identities captured by the prior rounds.
pub type Step<'a> = Box<dyn Fn(&Identities) -> Result<Graph> + 'a>;

/// Everything a completed chain produced.
#[derive(Debug)]
pub struct ChainResult {
    /// One correlated response per executed step, in execution order.
    pub responses: Vec<ResponseMap>,
    /// All identities captured across the chain.
    pub identities: Identities,
}

impl ChainResult {
    /// The final step's response. `None` only for an empty chain.
    pub fn last(&self) -> Option<&ResponseMap> {
        self.responses.last()
    }
}

// ─── Runner ───────────────────────────────────────────────────────────────

/// Executes action graphs against an injected transport.
///
/// A `Runner` holds no per-batch state: independent chains may run
/// concurrently through a shared `&Runner`, because every graph, response
/// map, and identity set is owned exclusively by its originating call.
pub struct Runner<T: Transport> {
    transport: T,
    application_name: String,
}

impl<T: Transport> Runner<T> {
    /// `application_name` is stamped into every request envelope.
    pub fn new(transport: T, application_name: impl Into<String>) -> Self {
        Self {
            transport,
            application_name: application_name.into(),
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Serialize `graph`, send it, and correlate the response.
    pub fn run_single(&self, graph: &Graph) -> Result<ResponseMap> {
        let request = xml::serialize(graph, &self.application_name);
        tracing::debug!(
            paths = graph.path_count(),
            actions = graph.action_count(),
            bytes = request.len(),
            "sending ProcessQuery batch"
        );
        let raw = self.transport.send(&request)?;
        let response = correlate(&raw)?;
        tracing::debug!(
            trace = %response.header().trace_correlation_id,
            results = response.len(),
            "batch correlated"
        );
        Ok(response)
    }

    /// Run `steps` strictly in order, feeding each step the identities
    /// captured by the ones before it.
    ///
    /// Step *n+1* is not even serialized until step *n*'s response has
    /// correlated successfully — its graph literally embeds tokens from
    /// that response. The first failing step aborts the chain, and no
    /// rollback is attempted: the backend has no cross-batch
    /// transactionality, so remote objects mutated by earlier steps stay
    /// mutated.
    pub fn run_chained(&self, steps: &[Step<'_>]) -> Result<ChainResult> {
        let mut identities = Identities::default();
        let mut responses = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            tracing::debug!(step = index + 1, total = steps.len(), "running chained batch");
            let graph = step(&identities)?;
            let response = self.run_single(&graph)?;
            identities.absorb(&response);
            responses.push(response);
        }

        Ok(ChainResult {
            responses,
            identities,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
