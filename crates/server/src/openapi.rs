use axum::Json;
use utoipa::OpenApi;

use shared_types::{
    AppError, AppErrorKind, Case, CaseDetailResponse, CaseStatus, CaseType, CaseUpdateRequest,
    ClosureReason, CreateCaseRequest, DuplicateCase, DuplicateCheckResponse, FieldViolation,
    FpnDetails, Location, LocationHistoryEntry, PublicReportRequest, PublicReportResponse,
    ReportingSource, TeamType, UserRole, UserSummary,
};

use crate::health::HealthResponse;
use crate::rest::cases::CaseTypeTeams;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Environmental Enforcement Case Management API",
        description = "Case intake, workflow, and duplicate detection for council environmental enforcement teams."
    ),
    paths(
        crate::rest::cases::create_case,
        crate::rest::cases::list_cases,
        crate::rest::cases::get_case,
        crate::rest::cases::update_case,
        crate::rest::cases::update_location,
        crate::rest::cases::self_assign,
        crate::rest::cases::reopen_case,
        crate::rest::cases::check_duplicate_vrm,
        crate::rest::cases::case_type_teams,
        crate::rest::fpn::get_fpn,
        crate::rest::fpn::update_fpn,
        crate::rest::public::submit_public_report,
        crate::health::health_check,
    ),
    components(schemas(
        AppError,
        AppErrorKind,
        Case,
        CaseDetailResponse,
        CaseStatus,
        CaseType,
        CaseTypeTeams,
        CaseUpdateRequest,
        ClosureReason,
        CreateCaseRequest,
        DuplicateCase,
        DuplicateCheckResponse,
        FieldViolation,
        FpnDetails,
        HealthResponse,
        Location,
        LocationHistoryEntry,
        PublicReportRequest,
        PublicReportResponse,
        ReportingSource,
        TeamType,
        UserRole,
        UserSummary,
    )),
    tags(
        (name = "cases", description = "Case lifecycle and workflow"),
        (name = "fpn", description = "Fixed Penalty Notice sub-records"),
        (name = "public", description = "Unauthenticated public intake"),
        (name = "reference", description = "Reference data"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// GET /api/openapi.json
pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
