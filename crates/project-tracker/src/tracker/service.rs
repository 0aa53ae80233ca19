use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::cascade::{self, RemovalSummary};
use super::domain::{
    default_checkpoints, Checkpoint, Department, DepartmentId, InterviewId, InterviewScore,
    MetricKind, OrgId, Student, StudentId, Team, TeamId, METRIC_MAX, METRIC_MIN,
};
use super::scoring;
use super::stats;
use super::store::{StoreError, TrackerStore};
use super::views::{
    DepartmentBreakdownEntry, DepartmentInterviewReport, OrgInterviewOverview, OrgSnapshot,
    TeamDetailView, TeamInterviewReport, TeamProgressEntry, TopPerformerView,
};

/// Service composing the entity store with the scoring, cascade, and
/// statistics engines. All mutation flows through here; derived fields are
/// recomputed before every save rather than trusted from callers.
pub struct TrackerService<S> {
    store: Arc<S>,
}

static DEPARTMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static STUDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TEAM_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_department_id() -> DepartmentId {
    let id = DEPARTMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DepartmentId(format!("department-{id:06}"))
}

fn next_student_id() -> StudentId {
    let id = STUDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    StudentId(format!("student-{id:06}"))
}

fn next_team_id() -> TeamId {
    let id = TEAM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TeamId(format!("team-{id:06}"))
}

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("interview-{id:06}"))
}

/// New department payload. The name is informational and unenforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDepartment {
    #[serde(default)]
    pub name: String,
}

/// New student payload, standalone or embedded in a team creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub resume_url: String,
    #[serde(default)]
    pub registered_number: Option<String>,
}

/// Partial student update; omitted fields are left untouched. An empty
/// `registered_number` clears the stored value. Team membership is owned by
/// the cascade engine and team creation and cannot be patched here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub resume_url: Option<String>,
    pub department: Option<DepartmentId>,
    pub registered_number: Option<String>,
}

/// Listing filter for students.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentFilter {
    /// Case-insensitive substring match on name or registration number.
    pub search: Option<String>,
    pub department: Option<DepartmentId>,
}

/// New team payload. Members are always created fresh, never adopted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTeam {
    #[serde(default)]
    pub team_number: Option<u32>,
    #[serde(default)]
    pub project_title: String,
    #[serde(default)]
    pub project_description: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub hosted_url: String,
    #[serde(default)]
    pub students: Vec<NewStudent>,
    /// Replaces the default four-stage sequence when supplied.
    #[serde(default)]
    pub checkpoints: Option<Vec<Checkpoint>>,
}

/// Partial team update; checkpoint state has its own operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamPatch {
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub domain: Option<String>,
    pub github_url: Option<String>,
    pub hosted_url: Option<String>,
}

/// One entry of a bulk checkpoint update. Unknown indexes are skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckpointUpdate {
    pub index: usize,
    pub completed: bool,
}

/// Listing filter for the progress view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamProgressFilter {
    pub department: Option<DepartmentId>,
    pub completed: Option<bool>,
}

/// Interview upsert payload for a single student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewUpsert {
    pub student_id: StudentId,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub metrics: BTreeMap<MetricKind, u8>,
}

/// One student's metrics within a team-wide interview submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInterviewEntry {
    pub student_id: StudentId,
    #[serde(default)]
    pub metrics: BTreeMap<MetricKind, u8>,
}

/// Entities addressable by the service, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Department,
    Student,
    Team,
    Interview,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Department => "department",
            EntityKind::Student => "student",
            EntityKind::Team => "team",
            EntityKind::Interview => "interview",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error raised by the tracker service.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("registration number '{0}' is already in use")]
    DuplicateRegistration(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackerError {
    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        TrackerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Student writes surface registration collisions as their own variant
    /// so the UI can show a specific message.
    fn from_student_store(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateRegistration(number) => {
                TrackerError::DuplicateRegistration(number)
            }
            other => TrackerError::Store(other),
        }
    }
}

fn normalize_registration(raw: Option<String>) -> Option<String> {
    raw.and_then(|value| {
        let trimmed = value.trim().to_lowercase();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn validate_metric_values(metrics: &BTreeMap<MetricKind, u8>) -> Result<(), TrackerError> {
    for (kind, value) in metrics {
        if !(METRIC_MIN..=METRIC_MAX).contains(value) {
            return Err(TrackerError::Validation(format!(
                "metric '{}' must be between {} and {}",
                kind.label(),
                METRIC_MIN,
                METRIC_MAX
            )));
        }
    }
    Ok(())
}

impl<S> TrackerService<S>
where
    S: TrackerStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ---- departments ----

    pub fn create_department(
        &self,
        org: &OrgId,
        input: NewDepartment,
    ) -> Result<Department, TrackerError> {
        let department = Department {
            id: next_department_id(),
            name: input.name.trim().to_string(),
            organization: org.clone(),
        };
        Ok(self.store.insert_department(department)?)
    }

    pub fn departments(&self, org: &OrgId) -> Result<Vec<Department>, TrackerError> {
        Ok(self.store.departments(org)?)
    }

    pub fn remove_department(
        &self,
        org: &OrgId,
        department_id: &DepartmentId,
    ) -> Result<(), TrackerError> {
        cascade::remove_department(self.store.as_ref(), org, department_id)
    }

    // ---- students ----

    pub fn create_student(&self, org: &OrgId, input: NewStudent) -> Result<Student, TrackerError> {
        let student = self.build_student(org, input, None)?;
        self.store
            .insert_student(student)
            .map_err(TrackerError::from_student_store)
    }

    fn build_student(
        &self,
        org: &OrgId,
        input: NewStudent,
        team_id: Option<TeamId>,
    ) -> Result<Student, TrackerError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TrackerError::Validation(
                "student name must not be empty".to_string(),
            ));
        }
        if let Some(department) = &input.department {
            self.ensure_department(org, department)?;
        }
        Ok(Student {
            id: next_student_id(),
            name,
            department: input.department,
            role: input.role,
            resume_url: input.resume_url,
            team_id,
            organization: org.clone(),
            registered_number: normalize_registration(input.registered_number),
        })
    }

    pub fn students(
        &self,
        org: &OrgId,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, TrackerError> {
        let needle = filter
            .search
            .as_ref()
            .map(|search| search.trim().to_lowercase())
            .filter(|search| !search.is_empty());

        let mut students = self.store.students(org)?;
        students.retain(|student| {
            let search_hit = needle.as_ref().map_or(true, |needle| {
                student.name.to_lowercase().contains(needle)
                    || student
                        .registered_number
                        .as_deref()
                        .map_or(false, |number| number.contains(needle))
            });
            let department_hit = filter
                .department
                .as_ref()
                .map_or(true, |wanted| student.department.as_ref() == Some(wanted));
            search_hit && department_hit
        });
        Ok(students)
    }

    pub fn student(&self, org: &OrgId, student_id: &StudentId) -> Result<Student, TrackerError> {
        self.store
            .student(org, student_id)?
            .ok_or_else(|| TrackerError::not_found(EntityKind::Student, &student_id.0))
    }

    pub fn update_student(
        &self,
        org: &OrgId,
        student_id: &StudentId,
        patch: StudentPatch,
    ) -> Result<Student, TrackerError> {
        let mut student = self.student(org, student_id)?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(TrackerError::Validation(
                    "student name must not be empty".to_string(),
                ));
            }
            student.name = name;
        }
        if let Some(role) = patch.role {
            student.role = role;
        }
        if let Some(resume_url) = patch.resume_url {
            student.resume_url = resume_url;
        }
        if let Some(department) = patch.department {
            self.ensure_department(org, &department)?;
            student.department = Some(department);
        }
        if let Some(registered_number) = patch.registered_number {
            student.registered_number = normalize_registration(Some(registered_number));
        }

        self.store
            .update_student(student.clone())
            .map_err(TrackerError::from_student_store)?;
        Ok(student)
    }

    pub fn remove_student(
        &self,
        org: &OrgId,
        student_id: &StudentId,
    ) -> Result<RemovalSummary, TrackerError> {
        cascade::remove_student(self.store.as_ref(), org, student_id)
    }

    pub fn remove_students(
        &self,
        org: &OrgId,
        student_ids: &[StudentId],
    ) -> Result<RemovalSummary, TrackerError> {
        cascade::remove_students(self.store.as_ref(), org, student_ids)
    }

    // ---- teams ----

    pub fn create_team(&self, org: &OrgId, input: NewTeam) -> Result<TeamDetailView, TrackerError> {
        let team_id = next_team_id();
        let team_number = match input.team_number {
            Some(number) => number,
            None => self.store.max_team_number(org)? + 1,
        };

        let mut members = Vec::with_capacity(input.students.len());
        for member in input.students {
            let student = self.build_student(org, member, Some(team_id.clone()))?;
            let stored = self
                .store
                .insert_student(student)
                .map_err(TrackerError::from_student_store)?;
            members.push(stored);
        }

        let mut team = Team {
            id: team_id,
            team_number,
            project_title: input.project_title,
            project_description: input.project_description,
            domain: input.domain,
            students: members.iter().map(|student| student.id.clone()).collect(),
            completed: false,
            github_url: input.github_url,
            hosted_url: input.hosted_url,
            checkpoints: input.checkpoints.unwrap_or_else(default_checkpoints),
            organization: org.clone(),
        };
        team.recompute_completed();

        let stored = self.store.insert_team(team)?;
        Ok(TeamDetailView::from_team(stored, members))
    }

    pub fn teams(&self, org: &OrgId) -> Result<Vec<TeamDetailView>, TrackerError> {
        let teams = self.store.teams(org)?;
        teams
            .into_iter()
            .map(|team| self.team_view(org, team))
            .collect()
    }

    pub fn team(&self, org: &OrgId, team_id: &TeamId) -> Result<TeamDetailView, TrackerError> {
        let team = self.load_team(org, team_id)?;
        self.team_view(org, team)
    }

    pub fn update_team(
        &self,
        org: &OrgId,
        team_id: &TeamId,
        patch: TeamPatch,
    ) -> Result<TeamDetailView, TrackerError> {
        let mut team = self.load_team(org, team_id)?;

        if let Some(project_title) = patch.project_title {
            team.project_title = project_title;
        }
        if let Some(project_description) = patch.project_description {
            team.project_description = project_description;
        }
        if let Some(domain) = patch.domain {
            team.domain = domain;
        }
        if let Some(github_url) = patch.github_url {
            team.github_url = github_url;
        }
        if let Some(hosted_url) = patch.hosted_url {
            team.hosted_url = hosted_url;
        }

        self.store.update_team(team.clone())?;
        self.team_view(org, team)
    }

    pub fn set_checkpoint(
        &self,
        org: &OrgId,
        team_id: &TeamId,
        index: usize,
        completed: bool,
    ) -> Result<TeamDetailView, TrackerError> {
        let mut team = self.load_team(org, team_id)?;
        match team.checkpoints.get_mut(index) {
            Some(checkpoint) => checkpoint.completed = completed,
            None => {
                return Err(TrackerError::Validation(format!(
                    "checkpoint index {} is out of range (team has {})",
                    index,
                    team.checkpoints.len()
                )))
            }
        }
        team.recompute_completed();
        self.store.update_team(team.clone())?;
        self.team_view(org, team)
    }

    /// Apply updates in the order given; entries addressing an index the
    /// team does not have are skipped without error.
    pub fn set_checkpoints(
        &self,
        org: &OrgId,
        team_id: &TeamId,
        updates: &[CheckpointUpdate],
    ) -> Result<TeamDetailView, TrackerError> {
        let mut team = self.load_team(org, team_id)?;
        for update in updates {
            if let Some(checkpoint) = team.checkpoints.get_mut(update.index) {
                checkpoint.completed = update.completed;
            }
        }
        team.recompute_completed();
        self.store.update_team(team.clone())?;
        self.team_view(org, team)
    }

    pub fn remove_team(
        &self,
        org: &OrgId,
        team_id: &TeamId,
    ) -> Result<RemovalSummary, TrackerError> {
        cascade::remove_team(self.store.as_ref(), org, team_id)
    }

    pub fn remove_teams(
        &self,
        org: &OrgId,
        team_ids: &[TeamId],
    ) -> Result<RemovalSummary, TrackerError> {
        let mut summary = RemovalSummary::default();
        for team_id in team_ids {
            let removed = cascade::remove_team(self.store.as_ref(), org, team_id)?;
            summary.students_removed += removed.students_removed;
            summary.teams_removed += removed.teams_removed;
            summary.interviews_removed += removed.interviews_removed;
        }
        Ok(summary)
    }

    fn load_team(&self, org: &OrgId, team_id: &TeamId) -> Result<Team, TrackerError> {
        self.store
            .team(org, team_id)?
            .ok_or_else(|| TrackerError::not_found(EntityKind::Team, &team_id.0))
    }

    fn team_view(&self, org: &OrgId, team: Team) -> Result<TeamDetailView, TrackerError> {
        let mut members = Vec::with_capacity(team.students.len());
        for member in &team.students {
            if let Some(student) = self.store.student(org, member)? {
                members.push(student);
            }
        }
        Ok(TeamDetailView::from_team(team, members))
    }

    fn ensure_department(
        &self,
        org: &OrgId,
        department_id: &DepartmentId,
    ) -> Result<(), TrackerError> {
        self.store
            .department(org, department_id)?
            .map(|_| ())
            .ok_or_else(|| TrackerError::not_found(EntityKind::Department, &department_id.0))
    }

    // ---- interviews ----

    /// Upsert the one interview record per `(student, organization)`:
    /// incoming metrics overwrite key-wise, keys absent from the submission
    /// are preserved, and a supplied team overwrites the stored one. The
    /// team reference is not validated here; team-scoped callers validate
    /// before dispatching.
    pub fn upsert_interview(
        &self,
        org: &OrgId,
        input: InterviewUpsert,
    ) -> Result<InterviewScore, TrackerError> {
        validate_metric_values(&input.metrics)?;
        if self.store.student(org, &input.student_id)?.is_none() {
            return Err(TrackerError::not_found(
                EntityKind::Student,
                &input.student_id.0,
            ));
        }

        match self.store.interview_for_student(org, &input.student_id)? {
            Some(mut existing) => {
                existing.metrics.extend(input.metrics);
                if input.team_id.is_some() {
                    existing.team_id = input.team_id;
                }
                existing.updated_at = Utc::now();
                scoring::recompute(&mut existing);
                self.store.update_interview(existing.clone())?;
                Ok(existing)
            }
            None => {
                let now = Utc::now();
                let mut record = InterviewScore {
                    id: next_interview_id(),
                    student_id: input.student_id,
                    team_id: input.team_id,
                    organization: org.clone(),
                    metrics: input.metrics,
                    total_score: 0,
                    average_score: 0.0,
                    created_at: now,
                    updated_at: now,
                };
                scoring::recompute(&mut record);
                Ok(self.store.insert_interview(record)?)
            }
        }
    }

    pub fn upsert_team_interviews(
        &self,
        org: &OrgId,
        team_id: &TeamId,
        entries: Vec<TeamInterviewEntry>,
    ) -> Result<Vec<InterviewScore>, TrackerError> {
        self.load_team(org, team_id)?;
        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            stored.push(self.upsert_interview(
                org,
                InterviewUpsert {
                    student_id: entry.student_id,
                    team_id: Some(team_id.clone()),
                    metrics: entry.metrics,
                },
            )?);
        }
        Ok(stored)
    }

    pub fn student_interview(
        &self,
        org: &OrgId,
        student_id: &StudentId,
    ) -> Result<InterviewScore, TrackerError> {
        self.store
            .interview_for_student(org, student_id)?
            .ok_or_else(|| TrackerError::not_found(EntityKind::Interview, &student_id.0))
    }

    pub fn interviews(&self, org: &OrgId) -> Result<Vec<InterviewScore>, TrackerError> {
        Ok(self.store.interviews(org)?)
    }

    pub fn team_interviews(
        &self,
        org: &OrgId,
        team_id: &TeamId,
    ) -> Result<TeamInterviewReport, TrackerError> {
        let team = self.load_team(org, team_id)?;
        let interviews = self.store.interviews_for_team(org, team_id)?;
        let scores = scoring::aggregate_scores(&interviews);
        Ok(TeamInterviewReport {
            team_id: team.id,
            team_number: team.team_number,
            project_title: team.project_title,
            total_students: interviews.len(),
            scores,
            interviews,
        })
    }

    pub fn department_interviews(
        &self,
        org: &OrgId,
        department_id: &DepartmentId,
    ) -> Result<DepartmentInterviewReport, TrackerError> {
        let department = self
            .store
            .department(org, department_id)?
            .ok_or_else(|| TrackerError::not_found(EntityKind::Department, &department_id.0))?;

        let member_ids: BTreeSet<StudentId> = self
            .store
            .students(org)?
            .into_iter()
            .filter(|student| student.department.as_ref() == Some(department_id))
            .map(|student| student.id)
            .collect();

        let scores: Vec<InterviewScore> = self
            .store
            .interviews(org)?
            .into_iter()
            .filter(|interview| member_ids.contains(&interview.student_id))
            .collect();

        Ok(DepartmentInterviewReport {
            department_id: department.id,
            department_name: department.name,
            total_students: scores.len(),
            scores: scoring::aggregate_scores(&scores),
        })
    }

    pub fn interview_overview(&self, org: &OrgId) -> Result<OrgInterviewOverview, TrackerError> {
        let scores = self.store.interviews(org)?;
        let students = self.store.students(org)?;
        let departments = self.store.departments(org)?;

        let department_names: HashMap<DepartmentId, String> = departments
            .into_iter()
            .map(|department| (department.id, department.name))
            .collect();
        let department_by_student: HashMap<StudentId, String> = students
            .iter()
            .filter_map(|student| {
                student
                    .department
                    .as_ref()
                    .and_then(|id| department_names.get(id))
                    .map(|name| (student.id.clone(), name.clone()))
            })
            .collect();
        let student_names: HashMap<StudentId, String> = students
            .into_iter()
            .map(|student| (student.id, student.name))
            .collect();

        let top_performers = scoring::top_performers(&scores, 5)
            .into_iter()
            .map(|score| TopPerformerView {
                student_name: student_names
                    .get(&score.student_id)
                    .cloned()
                    .unwrap_or_else(|| score.student_id.0.clone()),
                student_id: score.student_id,
                team_id: score.team_id,
                total_score: score.total_score,
                average_score: score.average_score,
            })
            .collect();

        Ok(OrgInterviewOverview {
            total_interviews: scores.len(),
            scores: scoring::aggregate_scores(&scores),
            top_performers,
            departments: scoring::department_rollup(&scores, &department_by_student),
        })
    }

    // ---- statistics ----

    pub fn statistics(&self, org: &OrgId) -> Result<OrgSnapshot, TrackerError> {
        let students = self.store.students(org)?;
        let teams = self.store.teams(org)?;
        let departments = self.store.departments(org)?;
        let (completed_teams, incomplete_teams) = stats::completion_split(&teams);

        Ok(OrgSnapshot {
            total_students: students.len(),
            total_teams: teams.len(),
            total_departments: departments.len(),
            completed_teams,
            incomplete_teams,
            students_per_domain: stats::students_per_domain(&teams),
        })
    }

    pub fn department_breakdown(
        &self,
        org: &OrgId,
    ) -> Result<Vec<DepartmentBreakdownEntry>, TrackerError> {
        let departments = self.store.departments(org)?;
        let teams = self.store.teams(org)?;
        let students = self.store.students(org)?;
        Ok(stats::department_breakdown(&departments, &teams, &students))
    }

    pub fn team_progress(
        &self,
        org: &OrgId,
        filter: &TeamProgressFilter,
    ) -> Result<Vec<TeamProgressEntry>, TrackerError> {
        let teams = self.store.teams(org)?;
        let students = self.store.students(org)?;
        Ok(stats::progress_listing(
            &teams,
            &students,
            filter.department.as_ref(),
            filter.completed,
        ))
    }
}
