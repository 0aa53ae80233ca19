use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::cascade::RemovalSummary;
use super::domain::{
    Department, DepartmentId, InterviewScore, OrgId, Student, StudentId, TeamId,
};
use super::service::{
    CheckpointUpdate, InterviewUpsert, NewDepartment, NewStudent, NewTeam, StudentFilter,
    StudentPatch, TeamInterviewEntry, TeamPatch, TeamProgressFilter, TrackerError, TrackerService,
};
use super::store::{StoreError, TrackerStore};
use super::views::{
    DepartmentBreakdownEntry, DepartmentInterviewReport, OrgInterviewOverview, OrgSnapshot,
    TeamDetailView, TeamInterviewReport, TeamProgressEntry,
};

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            TrackerError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TrackerError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            TrackerError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            TrackerError::DuplicateRegistration(_) => {
                (StatusCode::CONFLICT, "duplicate_registration")
            }
            TrackerError::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, "not_found"),
            TrackerError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = Json(json!({ "error": self.to_string(), "code": code }));
        (status, body).into_response()
    }
}

/// Bulk-delete request body for students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentBulkDelete {
    pub ids: Vec<StudentId>,
}

/// Bulk-delete request body for teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamBulkDelete {
    pub ids: Vec<TeamId>,
}

/// Body for a single checkpoint toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckpointFlag {
    pub completed: bool,
}

/// Router builder exposing the tracker surface. The organization segment is
/// structural: every operation is scoped by it, never by an optional filter.
pub fn tracker_router<S>(service: Arc<TrackerService<S>>) -> Router
where
    S: TrackerStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/orgs/:org/departments",
            post(create_department::<S>).get(list_departments::<S>),
        )
        .route(
            "/api/v1/orgs/:org/departments/:department_id",
            delete(delete_department::<S>),
        )
        .route(
            "/api/v1/orgs/:org/students",
            post(create_student::<S>).get(list_students::<S>),
        )
        .route(
            "/api/v1/orgs/:org/students/bulk-delete",
            post(bulk_delete_students::<S>),
        )
        .route(
            "/api/v1/orgs/:org/students/:student_id",
            get(get_student::<S>)
                .patch(patch_student::<S>)
                .delete(delete_student::<S>),
        )
        .route(
            "/api/v1/orgs/:org/teams",
            post(create_team::<S>).get(list_teams::<S>),
        )
        .route(
            "/api/v1/orgs/:org/teams/bulk-delete",
            post(bulk_delete_teams::<S>),
        )
        .route(
            "/api/v1/orgs/:org/teams/:team_id",
            get(get_team::<S>).patch(patch_team::<S>).delete(delete_team::<S>),
        )
        .route(
            "/api/v1/orgs/:org/teams/:team_id/checkpoints",
            patch(patch_checkpoints::<S>),
        )
        .route(
            "/api/v1/orgs/:org/teams/:team_id/checkpoints/:index",
            patch(patch_checkpoint::<S>),
        )
        .route(
            "/api/v1/orgs/:org/interviews",
            post(upsert_interview::<S>).get(list_interviews::<S>),
        )
        .route(
            "/api/v1/orgs/:org/interviews/overview",
            get(interview_overview::<S>),
        )
        .route(
            "/api/v1/orgs/:org/interviews/student/:student_id",
            get(student_interview::<S>),
        )
        .route(
            "/api/v1/orgs/:org/interviews/team/:team_id",
            post(upsert_team_interviews::<S>).get(team_interviews::<S>),
        )
        .route(
            "/api/v1/orgs/:org/interviews/department/:department_id",
            get(department_interviews::<S>),
        )
        .route("/api/v1/orgs/:org/statistics", get(statistics::<S>))
        .route(
            "/api/v1/orgs/:org/statistics/departments",
            get(department_breakdown::<S>),
        )
        .route(
            "/api/v1/orgs/:org/statistics/teams",
            get(team_progress::<S>),
        )
        .with_state(service)
}

// ---- departments ----

async fn create_department<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Json(input): Json<NewDepartment>,
) -> Result<(StatusCode, Json<Department>), TrackerError> {
    let department = service.create_department(&OrgId(org), input)?;
    Ok((StatusCode::CREATED, Json(department)))
}

async fn list_departments<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<Vec<Department>>, TrackerError> {
    Ok(Json(service.departments(&OrgId(org))?))
}

async fn delete_department<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, department_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, TrackerError> {
    service.remove_department(&OrgId(org), &DepartmentId(department_id))?;
    Ok(Json(json!({ "deleted": true })))
}

// ---- students ----

async fn create_student<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Json(input): Json<NewStudent>,
) -> Result<(StatusCode, Json<Student>), TrackerError> {
    let student = service.create_student(&OrgId(org), input)?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn list_students<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Query(filter): Query<StudentFilter>,
) -> Result<Json<Vec<Student>>, TrackerError> {
    Ok(Json(service.students(&OrgId(org), &filter)?))
}

async fn get_student<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, student_id)): Path<(String, String)>,
) -> Result<Json<Student>, TrackerError> {
    Ok(Json(service.student(&OrgId(org), &StudentId(student_id))?))
}

async fn patch_student<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, student_id)): Path<(String, String)>,
    Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, TrackerError> {
    Ok(Json(service.update_student(
        &OrgId(org),
        &StudentId(student_id),
        patch,
    )?))
}

async fn delete_student<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, student_id)): Path<(String, String)>,
) -> Result<Json<RemovalSummary>, TrackerError> {
    Ok(Json(
        service.remove_student(&OrgId(org), &StudentId(student_id))?,
    ))
}

async fn bulk_delete_students<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Json(request): Json<StudentBulkDelete>,
) -> Result<Json<RemovalSummary>, TrackerError> {
    Ok(Json(service.remove_students(&OrgId(org), &request.ids)?))
}

// ---- teams ----

async fn create_team<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Json(input): Json<NewTeam>,
) -> Result<(StatusCode, Json<TeamDetailView>), TrackerError> {
    let team = service.create_team(&OrgId(org), input)?;
    Ok((StatusCode::CREATED, Json(team)))
}

async fn list_teams<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<Vec<TeamDetailView>>, TrackerError> {
    Ok(Json(service.teams(&OrgId(org))?))
}

async fn get_team<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id)): Path<(String, String)>,
) -> Result<Json<TeamDetailView>, TrackerError> {
    Ok(Json(service.team(&OrgId(org), &TeamId(team_id))?))
}

async fn patch_team<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id)): Path<(String, String)>,
    Json(patch): Json<TeamPatch>,
) -> Result<Json<TeamDetailView>, TrackerError> {
    Ok(Json(service.update_team(
        &OrgId(org),
        &TeamId(team_id),
        patch,
    )?))
}

async fn delete_team<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id)): Path<(String, String)>,
) -> Result<Json<RemovalSummary>, TrackerError> {
    Ok(Json(service.remove_team(&OrgId(org), &TeamId(team_id))?))
}

async fn bulk_delete_teams<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Json(request): Json<TeamBulkDelete>,
) -> Result<Json<RemovalSummary>, TrackerError> {
    Ok(Json(service.remove_teams(&OrgId(org), &request.ids)?))
}

async fn patch_checkpoint<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id, index)): Path<(String, String, usize)>,
    Json(flag): Json<CheckpointFlag>,
) -> Result<Json<TeamDetailView>, TrackerError> {
    Ok(Json(service.set_checkpoint(
        &OrgId(org),
        &TeamId(team_id),
        index,
        flag.completed,
    )?))
}

async fn patch_checkpoints<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id)): Path<(String, String)>,
    Json(updates): Json<Vec<CheckpointUpdate>>,
) -> Result<Json<TeamDetailView>, TrackerError> {
    Ok(Json(service.set_checkpoints(
        &OrgId(org),
        &TeamId(team_id),
        &updates,
    )?))
}

// ---- interviews ----

async fn upsert_interview<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Json(input): Json<InterviewUpsert>,
) -> Result<Json<InterviewScore>, TrackerError> {
    Ok(Json(service.upsert_interview(&OrgId(org), input)?))
}

async fn list_interviews<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<Vec<InterviewScore>>, TrackerError> {
    Ok(Json(service.interviews(&OrgId(org))?))
}

async fn interview_overview<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<OrgInterviewOverview>, TrackerError> {
    Ok(Json(service.interview_overview(&OrgId(org))?))
}

async fn student_interview<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, student_id)): Path<(String, String)>,
) -> Result<Json<InterviewScore>, TrackerError> {
    Ok(Json(
        service.student_interview(&OrgId(org), &StudentId(student_id))?,
    ))
}

async fn upsert_team_interviews<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id)): Path<(String, String)>,
    Json(entries): Json<Vec<TeamInterviewEntry>>,
) -> Result<Json<Vec<InterviewScore>>, TrackerError> {
    Ok(Json(service.upsert_team_interviews(
        &OrgId(org),
        &TeamId(team_id),
        entries,
    )?))
}

async fn team_interviews<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, team_id)): Path<(String, String)>,
) -> Result<Json<TeamInterviewReport>, TrackerError> {
    Ok(Json(service.team_interviews(&OrgId(org), &TeamId(team_id))?))
}

async fn department_interviews<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path((org, department_id)): Path<(String, String)>,
) -> Result<Json<DepartmentInterviewReport>, TrackerError> {
    Ok(Json(service.department_interviews(
        &OrgId(org),
        &DepartmentId(department_id),
    )?))
}

// ---- statistics ----

async fn statistics<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<OrgSnapshot>, TrackerError> {
    Ok(Json(service.statistics(&OrgId(org))?))
}

async fn department_breakdown<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<Vec<DepartmentBreakdownEntry>>, TrackerError> {
    Ok(Json(service.department_breakdown(&OrgId(org))?))
}

async fn team_progress<S: TrackerStore + 'static>(
    State(service): State<Arc<TrackerService<S>>>,
    Path(org): Path<String>,
    Query(filter): Query<TeamProgressFilter>,
) -> Result<Json<Vec<TeamProgressEntry>>, TrackerError> {
    Ok(Json(service.team_progress(&OrgId(org), &filter)?))
}
