//! Round-robin backend selection
//!
//! A `BackendPool` holds the fixed set of adapters built for one provider and
//! hands one out per request. The adapter list is read-only after
//! construction; the rotation cursor is the only mutable state and is advanced
//! with a single `fetch_add`, whose returned value alone determines the index.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub mod error;

pub use error::PoolError;

use crate::agent::CompletionAgent;

/// Fixed set of adapters for one provider plus a rotation cursor.
pub struct BackendPool {
    /// Provider name, for logs
    provider: String,

    /// Adapters in rotation order
    agents: Vec<Arc<dyn CompletionAgent>>,

    /// Round-robin counter; wraps via modulo
    cursor: AtomicU64,
}

impl std::fmt::Debug for BackendPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendPool")
            .field("provider", &self.provider)
            .field("agents", &self.agents.iter().map(|a| a.id()).collect::<Vec<_>>())
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}

impl BackendPool {
    /// Create a pool. An empty adapter list is rejected here so that
    /// `select` can never fail at request time.
    pub fn new(
        provider: impl Into<String>,
        agents: Vec<Arc<dyn CompletionAgent>>,
    ) -> Result<Self, PoolError> {
        let provider = provider.into();
        if agents.is_empty() {
            return Err(PoolError::Empty { provider });
        }
        Ok(Self {
            provider,
            agents,
            cursor: AtomicU64::new(0),
        })
    }

    /// Next adapter in rotation order.
    pub fn select(&self) -> Arc<dyn CompletionAgent> {
        let ticket = self.cursor.fetch_add(1, Ordering::Relaxed);
        let index = (ticket % self.agents.len() as u64) as usize;
        Arc::clone(&self.agents[index])
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
