//! In-memory adapters used by the integration tests and local dev.
//! Semantics (CAS, conflict behavior, ordering) mirror the Postgres
//! adapters exactly; tests against these are tests of the contract.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use shared_types::{AppError, Case, CaseFamily, CaseStatus, UserRole, UserSummary};

use crate::duplicates::case_vrm;

use super::{AuditEntry, AuditRecorder, CaseFilter, CaseStore, EvidenceStore, NotificationSink, UserDirectory};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::internal("store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::internal("store lock poisoned"))
}

#[derive(Default)]
pub struct MemoryStore {
    cases: RwLock<HashMap<Uuid, Case>>,
    counters: RwLock<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(case: &Case, filter: &CaseFilter) -> bool {
    if let Some(status) = filter.status {
        if case.status != status {
            return false;
        }
    }
    if let Some(case_type) = filter.case_type {
        if case.case_type != case_type {
            return false;
        }
    }
    if let Some(assigned_to) = filter.assigned_to {
        if case.assigned_to != Some(assigned_to) {
            return false;
        }
    }
    if filter.unassigned && case.assigned_to.is_some() {
        return false;
    }
    true
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn create(&self, case: Case) -> Result<Case, AppError> {
        let mut cases = write(&self.cases)?;
        if cases.contains_key(&case.id) {
            return Err(AppError::conflict("case id already exists"));
        }
        cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Case>, AppError> {
        Ok(read(&self.cases)?.get(&id).cloned())
    }

    async fn update(&self, expected_version: i64, mut case: Case) -> Result<Case, AppError> {
        let mut cases = write(&self.cases)?;
        let stored = cases
            .get(&case.id)
            .ok_or_else(|| AppError::not_found("case not found"))?;
        if stored.version != expected_version {
            return Err(AppError::conflict(
                "the case was changed by someone else; reload and try again",
            ));
        }
        case.version = expected_version + 1;
        cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn self_assign(&self, id: Uuid, user: &UserSummary) -> Result<Case, AppError> {
        let mut cases = write(&self.cases)?;
        let case = cases
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("case not found"))?;
        if case.status == CaseStatus::Closed {
            return Err(AppError::invalid_transition("cannot assign a closed case"));
        }
        if case.assigned_to.is_some() {
            return Err(AppError::conflict("case is already assigned"));
        }
        case.assigned_to = Some(user.id);
        case.assigned_to_name = Some(user.name.clone());
        if case.status == CaseStatus::New {
            case.status = CaseStatus::Assigned;
        }
        case.updated_at = Utc::now();
        case.version += 1;
        Ok(case.clone())
    }

    async fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, AppError> {
        let cases = read(&self.cases)?;
        let mut out: Vec<Case> = cases.values().filter(|c| matches(c, filter)).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn find_by_vrm(
        &self,
        vrm: &str,
        families: &[CaseFamily],
        exclude: Option<Uuid>,
    ) -> Result<Vec<Case>, AppError> {
        let cases = read(&self.cases)?;
        let mut out: Vec<Case> = cases
            .values()
            .filter(|c| Some(c.id) != exclude)
            .filter(|c| families.contains(&c.case_type.family()))
            .filter(|c| case_vrm(c).as_deref() == Some(vrm))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn next_sequence(&self, prefix: &str, year: i32) -> Result<u64, AppError> {
        let mut counters = write(&self.counters)?;
        let counter = counters.entry(format!("{prefix}-{year}")).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(read(&self.cases)?.len() as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<Uuid, UserSummary>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user; returns the same summary for harness convenience.
    pub fn add_user(&self, user: UserSummary) -> UserSummary {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id, user.clone());
        }
        user
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>, AppError> {
        let users = read(&self.users)?;
        let mut out: Vec<UserSummary> = users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserSummary>, AppError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryEvidence {
    counts: RwLock<HashMap<Uuid, u64>>,
}

impl MemoryEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self, case_id: Uuid, count: u64) {
        if let Ok(mut counts) = self.counts.write() {
            counts.insert(case_id, count);
        }
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidence {
    async fn count_for_case(&self, case_id: Uuid) -> Result<u64, AppError> {
        Ok(read(&self.counts)?.get(&case_id).copied().unwrap_or(0))
    }
}

#[derive(Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditRecorder for MemoryAudit {
    async fn record(
        &self,
        case_id: Uuid,
        action: &str,
        details: &str,
        actor: &UserSummary,
    ) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::internal("audit lock poisoned"))?;
        entries.push(AuditEntry {
            case_id,
            action: action.to_string(),
            details: details.to_string(),
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            at: Utc::now(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub case_id: Option<Uuid>,
}

#[derive(Default)]
pub struct MemoryNotifications {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifications {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        case_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| AppError::internal("notification lock poisoned"))?;
        sent.push(Notification {
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            case_id,
        });
        Ok(())
    }
}
