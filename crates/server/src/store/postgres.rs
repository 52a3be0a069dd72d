//! Postgres adapters. Cases are stored as one JSONB document per row
//! with a few extracted columns for filtering; `version` backs the
//! optimistic-concurrency check.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use shared_types::{AppError, Case, CaseFamily, CaseStatus, CaseType, UserRole, UserSummary};

use crate::duplicates::case_vrm;
use crate::error_convert::SqlxErrorExt;

use super::{AuditRecorder, CaseFilter, CaseStore, EvidenceStore, NotificationSink, UserDirectory};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS cases (
        id UUID PRIMARY KEY,
        reference_number TEXT NOT NULL UNIQUE,
        case_type TEXT NOT NULL,
        status TEXT NOT NULL,
        assigned_to UUID,
        vrm TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        version BIGINT NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_cases_status ON cases (status)",
    "CREATE INDEX IF NOT EXISTS idx_cases_vrm ON cases (vrm) WHERE vrm IS NOT NULL",
    "CREATE TABLE IF NOT EXISTS reference_counters (
        prefix TEXT NOT NULL,
        year INT NOT NULL,
        value BIGINT NOT NULL,
        PRIMARY KEY (prefix, year)
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        team_types TEXT[] NOT NULL DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS case_audit (
        id BIGSERIAL PRIMARY KEY,
        case_id UUID NOT NULL,
        action TEXT NOT NULL,
        details TEXT NOT NULL,
        actor_id UUID NOT NULL,
        actor_name TEXT NOT NULL,
        at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id BIGSERIAL PRIMARY KEY,
        user_id UUID NOT NULL,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        case_id UUID,
        read BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS evidence_items (
        id UUID PRIMARY KEY,
        case_id UUID NOT NULL,
        file_name TEXT NOT NULL,
        uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

/// Create tables on startup if they do not exist yet.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), AppError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| e.into_app_error())?;
    }
    Ok(())
}

fn decode_case(doc: Value) -> Result<Case, AppError> {
    serde_json::from_value(doc)
        .map_err(|e| AppError::internal(format!("stored case document is corrupt: {e}")))
}

fn encode_case(case: &Case) -> Result<Value, AppError> {
    serde_json::to_value(case)
        .map_err(|e| AppError::internal(format!("failed to serialize case: {e}")))
}

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl CaseStore for PgStore {
    async fn create(&self, case: Case) -> Result<Case, AppError> {
        let doc = encode_case(&case)?;
        sqlx::query(
            "INSERT INTO cases
                (id, reference_number, case_type, status, assigned_to, vrm, created_at, version, doc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(case.id)
        .bind(&case.reference_number)
        .bind(case.case_type.as_str())
        .bind(case.status.as_str())
        .bind(case.assigned_to)
        .bind(case_vrm(&case))
        .bind(case.created_at)
        .bind(case.version)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;
        Ok(case)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Case>, AppError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM cases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_app_error())?;
        doc.map(decode_case).transpose()
    }

    async fn update(&self, expected_version: i64, mut case: Case) -> Result<Case, AppError> {
        case.version = expected_version + 1;
        let doc = encode_case(&case)?;
        let result = sqlx::query(
            "UPDATE cases
                SET doc = $1, status = $2, assigned_to = $3, vrm = $4, version = $5
              WHERE id = $6 AND version = $7",
        )
        .bind(doc)
        .bind(case.status.as_str())
        .bind(case.assigned_to)
        .bind(case_vrm(&case))
        .bind(case.version)
        .bind(case.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;

        if result.rows_affected() == 1 {
            return Ok(case);
        }
        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM cases WHERE id = $1")
            .bind(case.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_app_error())?;
        if exists.is_some() {
            Err(AppError::conflict(
                "the case was changed by someone else; reload and try again",
            ))
        } else {
            Err(AppError::not_found("case not found"))
        }
    }

    async fn self_assign(&self, id: Uuid, user: &UserSummary) -> Result<Case, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| e.into_app_error())?;
        let doc: Option<Value> =
            sqlx::query_scalar("SELECT doc FROM cases WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| e.into_app_error())?;
        let mut case = decode_case(doc.ok_or_else(|| AppError::not_found("case not found"))?)?;

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
        case.updated_at = chrono::Utc::now();
        case.version += 1;

        let doc = encode_case(&case)?;
        sqlx::query(
            "UPDATE cases SET doc = $1, status = $2, assigned_to = $3, version = $4 WHERE id = $5",
        )
        .bind(doc)
        .bind(case.status.as_str())
        .bind(case.assigned_to)
        .bind(case.version)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.into_app_error())?;
        tx.commit().await.map_err(|e| e.into_app_error())?;
        Ok(case)
    }

    async fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, AppError> {
        let mut builder = QueryBuilder::new("SELECT doc FROM cases WHERE TRUE");
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(case_type) = filter.case_type {
            builder.push(" AND case_type = ").push_bind(case_type.as_str());
        }
        if let Some(assigned_to) = filter.assigned_to {
            builder.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if filter.unassigned {
            builder.push(" AND assigned_to IS NULL");
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_app_error())?;
        rows.into_iter()
            .map(|row| decode_case(row.try_get("doc").map_err(|e| e.into_app_error())?))
            .collect()
    }

    async fn find_by_vrm(
        &self,
        vrm: &str,
        families: &[CaseFamily],
        exclude: Option<Uuid>,
    ) -> Result<Vec<Case>, AppError> {
        let type_names: Vec<String> = CaseType::ALL
            .iter()
            .filter(|t| families.contains(&t.family()))
            .map(|t| t.as_str().to_string())
            .collect();
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM cases
              WHERE vrm = $1
                AND case_type = ANY($2)
                AND ($3::uuid IS NULL OR id <> $3)
              ORDER BY created_at DESC",
        )
        .bind(vrm)
        .bind(&type_names)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;
        docs.into_iter().map(decode_case).collect()
    }

    async fn next_sequence(&self, prefix: &str, year: i32) -> Result<u64, AppError> {
        let value: i64 = sqlx::query_scalar(
            "INSERT INTO reference_counters (prefix, year, value) VALUES ($1, $2, 1)
             ON CONFLICT (prefix, year)
             DO UPDATE SET value = reference_counters.value + 1
             RETURNING value",
        )
        .bind(prefix)
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;
        Ok(value as u64)
    }

    async fn count(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cases")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_app_error())?;
        Ok(count as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_app_error())?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    role: String,
    team_types: Vec<String>,
}

impl UserRow {
    fn into_summary(self) -> Result<UserSummary, AppError> {
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| AppError::internal(format!("unknown stored role '{}'", self.role)))?;
        Ok(UserSummary {
            id: self.id,
            name: self.name,
            role,
            team_types: self
                .team_types
                .iter()
                .filter_map(|t| shared_types::TeamType::parse(t))
                .collect(),
        })
    }
}

pub struct PgDirectory {
    pool: Pool<Postgres>,
}

impl PgDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgDirectory { pool }
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>, AppError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, role, team_types FROM users
              WHERE $1::text IS NULL OR role = $1
              ORDER BY name",
        )
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;
        rows.into_iter().map(UserRow::into_summary).collect()
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserSummary>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, role, team_types FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| e.into_app_error())?;
        row.map(UserRow::into_summary).transpose()
    }
}

pub struct PgEvidence {
    pool: Pool<Postgres>,
}

impl PgEvidence {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgEvidence { pool }
    }
}

#[async_trait]
impl EvidenceStore for PgEvidence {
    async fn count_for_case(&self, case_id: Uuid) -> Result<u64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM evidence_items WHERE case_id = $1")
                .bind(case_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| e.into_app_error())?;
        Ok(count as u64)
    }
}

pub struct PgAudit {
    pool: Pool<Postgres>,
}

impl PgAudit {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgAudit { pool }
    }
}

#[async_trait]
impl AuditRecorder for PgAudit {
    async fn record(
        &self,
        case_id: Uuid,
        action: &str,
        details: &str,
        actor: &UserSummary,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO case_audit (case_id, action, details, actor_id, actor_name)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(case_id)
        .bind(action)
        .bind(details)
        .bind(actor.id)
        .bind(&actor.name)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;
        Ok(())
    }
}

pub struct PgNotifications {
    pool: Pool<Postgres>,
}

impl PgNotifications {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgNotifications { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotifications {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        case_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (user_id, title, message, case_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(case_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_app_error())?;
        Ok(())
    }
}
