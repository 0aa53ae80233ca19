//! Referential-integrity engine.
//!
//! Students, teams, and interview scores form an ownership graph with
//! bidirectional student/team links that no storage layer enforces. This
//! module is the sole writer of those links on the delete paths. Steps run
//! sequentially without a transaction; ordering puts score cleanup before
//! the membership and record deletes so a midway failure cannot leave score
//! records pointing at entities that are already gone.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{DepartmentId, OrgId, StudentId, TeamId};
use super::service::{EntityKind, TrackerError};
use super::store::TrackerStore;

/// What a cascade removed, reported back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovalSummary {
    pub students_removed: usize,
    pub teams_removed: usize,
    pub interviews_removed: usize,
}

/// Remove one student: their interview records first, then their team
/// membership (deleting the team outright when they were its last member),
/// then the student record itself.
pub(crate) fn remove_student<S: TrackerStore>(
    store: &S,
    org: &OrgId,
    student_id: &StudentId,
) -> Result<RemovalSummary, TrackerError> {
    let student = store
        .student(org, student_id)?
        .ok_or_else(|| TrackerError::not_found(EntityKind::Student, &student_id.0))?;

    let mut summary = RemovalSummary::default();
    summary.interviews_removed += store.delete_interviews_for_student(org, student_id)?;

    if let Some(team_id) = &student.team_id {
        if let Some(mut team) = store.team(org, team_id)? {
            team.students.retain(|member| member != student_id);
            if team.students.is_empty() {
                summary.interviews_removed += store.delete_interviews_for_team(org, team_id)?;
                store.delete_team(org, team_id)?;
                summary.teams_removed += 1;
            } else {
                store.update_team(team)?;
            }
        }
    }

    summary.students_removed += store.delete_students(org, std::slice::from_ref(student_id))?;
    Ok(summary)
}

/// Bulk variant of [`remove_student`]: same net effect, but input ids are
/// grouped by team first so each affected team is read and written once.
pub(crate) fn remove_students<S: TrackerStore>(
    store: &S,
    org: &OrgId,
    student_ids: &[StudentId],
) -> Result<RemovalSummary, TrackerError> {
    let mut summary = RemovalSummary::default();
    let mut by_team: BTreeMap<TeamId, Vec<StudentId>> = BTreeMap::new();
    let mut targets: Vec<StudentId> = Vec::new();

    for student_id in student_ids {
        if targets.contains(student_id) {
            continue;
        }
        let student = store
            .student(org, student_id)?
            .ok_or_else(|| TrackerError::not_found(EntityKind::Student, &student_id.0))?;
        summary.interviews_removed += store.delete_interviews_for_student(org, student_id)?;
        if let Some(team_id) = student.team_id {
            by_team.entry(team_id).or_default().push(student_id.clone());
        }
        targets.push(student_id.clone());
    }

    for (team_id, departing) in by_team {
        let Some(mut team) = store.team(org, &team_id)? else {
            continue;
        };
        team.students.retain(|member| !departing.contains(member));
        if team.students.is_empty() {
            summary.interviews_removed += store.delete_interviews_for_team(org, &team_id)?;
            store.delete_team(org, &team_id)?;
            summary.teams_removed += 1;
        } else {
            store.update_team(team)?;
        }
    }

    summary.students_removed += store.delete_students(org, &targets)?;
    Ok(summary)
}

/// Remove a team along with its member students and every interview record
/// referencing the team or one of those students.
pub(crate) fn remove_team<S: TrackerStore>(
    store: &S,
    org: &OrgId,
    team_id: &TeamId,
) -> Result<RemovalSummary, TrackerError> {
    let team = store
        .team(org, team_id)?
        .ok_or_else(|| TrackerError::not_found(EntityKind::Team, &team_id.0))?;

    let mut summary = RemovalSummary::default();
    summary.interviews_removed += store.delete_interviews_for_team(org, team_id)?;
    for member in &team.students {
        summary.interviews_removed += store.delete_interviews_for_student(org, member)?;
    }
    summary.students_removed += store.delete_students(org, &team.students)?;
    store.delete_team(org, team_id)?;
    summary.teams_removed += 1;
    Ok(summary)
}

/// Departments are a classification, not an ownership relationship: deletion
/// is refused while students still reference the department.
pub(crate) fn remove_department<S: TrackerStore>(
    store: &S,
    org: &OrgId,
    department_id: &DepartmentId,
) -> Result<(), TrackerError> {
    let department = store
        .department(org, department_id)?
        .ok_or_else(|| TrackerError::not_found(EntityKind::Department, &department_id.0))?;

    let referencing = store
        .students(org)?
        .iter()
        .filter(|student| student.department.as_ref() == Some(department_id))
        .count();
    if referencing > 0 {
        return Err(TrackerError::Conflict(format!(
            "cannot delete department '{}': {} student(s) still assigned",
            department.name, referencing
        )));
    }

    store.delete_department(org, department_id)?;
    Ok(())
}
