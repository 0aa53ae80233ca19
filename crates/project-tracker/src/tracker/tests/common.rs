use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::tracker::domain::{
    Department, DepartmentId, InterviewId, InterviewScore, MetricKind, OrgId, Student, StudentId,
    Team, TeamId,
};
use crate::tracker::scoring;
use crate::tracker::service::{NewDepartment, NewStudent, NewTeam, TrackerService};
use crate::tracker::store::{MemoryTrackerStore, StoreError, TrackerStore};

pub(super) fn org() -> OrgId {
    OrgId("acme-institute".to_string())
}

pub(super) fn other_org() -> OrgId {
    OrgId("rival-institute".to_string())
}

pub(super) fn build_service() -> (TrackerService<MemoryTrackerStore>, Arc<MemoryTrackerStore>) {
    let store = Arc::new(MemoryTrackerStore::default());
    let service = TrackerService::new(store.clone());
    (service, store)
}

pub(super) fn metric_map(entries: &[(MetricKind, u8)]) -> BTreeMap<MetricKind, u8> {
    entries.iter().copied().collect()
}

pub(super) fn new_student(name: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        department: None,
        role: "developer".to_string(),
        resume_url: String::new(),
        registered_number: None,
    }
}

pub(super) fn new_student_in(name: &str, department: &DepartmentId) -> NewStudent {
    NewStudent {
        department: Some(department.clone()),
        ..new_student(name)
    }
}

pub(super) fn new_team(title: &str, domain: &str, students: Vec<NewStudent>) -> NewTeam {
    NewTeam {
        team_number: None,
        project_title: title.to_string(),
        project_description: format!("{title} description"),
        domain: domain.to_string(),
        github_url: String::new(),
        hosted_url: String::new(),
        students,
        checkpoints: None,
    }
}

pub(super) fn create_department(
    service: &TrackerService<MemoryTrackerStore>,
    org: &OrgId,
    name: &str,
) -> Department {
    service
        .create_department(
            org,
            NewDepartment {
                name: name.to_string(),
            },
        )
        .expect("department creates")
}

/// Bare interview record for exercising the aggregation functions directly.
pub(super) fn score_record(student: &str, metrics: &[(MetricKind, u8)]) -> InterviewScore {
    let now = Utc::now();
    let mut record = InterviewScore {
        id: InterviewId(format!("interview-fixture-{student}")),
        student_id: StudentId(student.to_string()),
        team_id: None,
        organization: org(),
        metrics: metric_map(metrics),
        total_score: 0,
        average_score: 0.0,
        created_at: now,
        updated_at: now,
    };
    scoring::recompute(&mut record);
    record
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store stub whose every operation fails, for internal-error propagation.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl TrackerStore for UnavailableStore {
    fn insert_department(&self, _department: Department) -> Result<Department, StoreError> {
        offline()
    }

    fn department(
        &self,
        _org: &OrgId,
        _id: &DepartmentId,
    ) -> Result<Option<Department>, StoreError> {
        offline()
    }

    fn departments(&self, _org: &OrgId) -> Result<Vec<Department>, StoreError> {
        offline()
    }

    fn delete_department(&self, _org: &OrgId, _id: &DepartmentId) -> Result<(), StoreError> {
        offline()
    }

    fn insert_student(&self, _student: Student) -> Result<Student, StoreError> {
        offline()
    }

    fn update_student(&self, _student: Student) -> Result<(), StoreError> {
        offline()
    }

    fn student(&self, _org: &OrgId, _id: &StudentId) -> Result<Option<Student>, StoreError> {
        offline()
    }

    fn students(&self, _org: &OrgId) -> Result<Vec<Student>, StoreError> {
        offline()
    }

    fn delete_students(&self, _org: &OrgId, _ids: &[StudentId]) -> Result<usize, StoreError> {
        offline()
    }

    fn insert_team(&self, _team: Team) -> Result<Team, StoreError> {
        offline()
    }

    fn update_team(&self, _team: Team) -> Result<(), StoreError> {
        offline()
    }

    fn team(&self, _org: &OrgId, _id: &TeamId) -> Result<Option<Team>, StoreError> {
        offline()
    }

    fn teams(&self, _org: &OrgId) -> Result<Vec<Team>, StoreError> {
        offline()
    }

    fn delete_team(&self, _org: &OrgId, _id: &TeamId) -> Result<(), StoreError> {
        offline()
    }

    fn max_team_number(&self, _org: &OrgId) -> Result<u32, StoreError> {
        offline()
    }

    fn insert_interview(&self, _interview: InterviewScore) -> Result<InterviewScore, StoreError> {
        offline()
    }

    fn update_interview(&self, _interview: InterviewScore) -> Result<(), StoreError> {
        offline()
    }

    fn interview_for_student(
        &self,
        _org: &OrgId,
        _student: &StudentId,
    ) -> Result<Option<InterviewScore>, StoreError> {
        offline()
    }

    fn interviews(&self, _org: &OrgId) -> Result<Vec<InterviewScore>, StoreError> {
        offline()
    }

    fn interviews_for_team(
        &self,
        _org: &OrgId,
        _team: &TeamId,
    ) -> Result<Vec<InterviewScore>, StoreError> {
        offline()
    }

    fn delete_interviews_for_student(
        &self,
        _org: &OrgId,
        _student: &StudentId,
    ) -> Result<usize, StoreError> {
        offline()
    }

    fn delete_interviews_for_team(
        &self,
        _org: &OrgId,
        _team: &TeamId,
    ) -> Result<usize, StoreError> {
        offline()
    }
}
