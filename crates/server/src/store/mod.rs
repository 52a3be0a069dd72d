//! Storage seams. Every collaborator the handlers talk to sits behind
//! one of these narrow traits so the whole REST surface can run against
//! the in-memory adapters in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_types::{
    AppError, Case, CaseFamily, CaseStatus, CaseType, UserRole, UserSummary,
};

/// Filters for the case list. All members optional and AND-combined.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub case_type: Option<CaseType>,
    pub assigned_to: Option<Uuid>,
    pub unassigned: bool,
}

#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn create(&self, case: Case) -> Result<Case, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Case>, AppError>;

    /// Commit an updated case. Fails with `Conflict` when the stored
    /// version no longer matches `expected_version`; on success the
    /// stored version is bumped past it.
    async fn update(&self, expected_version: i64, case: Case) -> Result<Case, AppError>;

    /// Atomically claim an unassigned case for `user`. `Conflict` when
    /// somebody else got there first.
    async fn self_assign(&self, id: Uuid, user: &UserSummary) -> Result<Case, AppError>;

    /// List newest-first.
    async fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, AppError>;

    /// Cases in the given families whose normalized VRM matches,
    /// newest-first, excluding `exclude` when set.
    async fn find_by_vrm(
        &self,
        vrm: &str,
        families: &[CaseFamily],
        exclude: Option<Uuid>,
    ) -> Result<Vec<Case>, AppError>;

    /// Next value of the per-prefix reference counter.
    async fn next_sequence(&self, prefix: &str, year: i32) -> Result<u64, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>, AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<UserSummary>, AppError>;
}

/// Evidence lives in its own subsystem; the case workflow only needs
/// to know whether any exists.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn count_for_case(&self, case_id: Uuid) -> Result<u64, AppError>;
}

/// One audit trail line.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub case_id: Uuid,
    pub action: String,
    pub details: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub at: DateTime<Utc>,
}

/// Fire-and-forget audit sink. Failures are logged by the caller and
/// never fail the primary operation.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(
        &self,
        case_id: Uuid,
        action: &str,
        details: &str,
        actor: &UserSummary,
    ) -> Result<(), AppError>;
}

/// Best-effort in-app notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        case_id: Option<Uuid>,
    ) -> Result<(), AppError>;
}
