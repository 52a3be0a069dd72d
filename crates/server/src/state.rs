use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::store::memory::{
    MemoryAudit, MemoryDirectory, MemoryEvidence, MemoryNotifications, MemoryStore,
};
use crate::store::postgres::{PgAudit, PgDirectory, PgEvidence, PgNotifications, PgStore};
use crate::store::{AuditRecorder, CaseStore, EvidenceStore, NotificationSink, UserDirectory};

/// Shared handles injected into every handler. Everything is behind a
/// trait object so tests can run against the in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    pub cases: Arc<dyn CaseStore>,
    pub users: Arc<dyn UserDirectory>,
    pub evidence: Arc<dyn EvidenceStore>,
    pub audit: Arc<dyn AuditRecorder>,
    pub notifications: Arc<dyn NotificationSink>,
}

impl AppState {
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        AppState {
            cases: Arc::new(PgStore::new(pool.clone())),
            users: Arc::new(PgDirectory::new(pool.clone())),
            evidence: Arc::new(PgEvidence::new(pool.clone())),
            audit: Arc::new(PgAudit::new(pool.clone())),
            notifications: Arc::new(PgNotifications::new(pool)),
        }
    }

    /// Fully in-memory state for tests and local development.
    pub fn in_memory() -> Self {
        AppState {
            cases: Arc::new(MemoryStore::new()),
            users: Arc::new(MemoryDirectory::new()),
            evidence: Arc::new(MemoryEvidence::new()),
            audit: Arc::new(MemoryAudit::new()),
            notifications: Arc::new(MemoryNotifications::new()),
        }
    }
}
