use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{
    Checkpoint, DepartmentId, InterviewScore, Student, StudentId, Team, TeamId,
};
use super::scoring::{DepartmentRollupEntry, ScoreAggregate};

/// Team representation with member records resolved, as the dashboard
/// consumes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDetailView {
    pub id: TeamId,
    pub team_number: u32,
    pub project_title: String,
    pub project_description: String,
    pub domain: String,
    pub completed: bool,
    pub github_url: String,
    pub hosted_url: String,
    pub checkpoints: Vec<Checkpoint>,
    pub ticked: usize,
    pub students: Vec<Student>,
}

impl TeamDetailView {
    pub fn from_team(team: Team, students: Vec<Student>) -> Self {
        let ticked = team.ticked();
        Self {
            id: team.id,
            team_number: team.team_number,
            project_title: team.project_title,
            project_description: team.project_description,
            domain: team.domain,
            completed: team.completed,
            github_url: team.github_url,
            hosted_url: team.hosted_url,
            checkpoints: team.checkpoints,
            ticked,
            students,
        }
    }
}

/// Per-team interview report: the aggregate plus the underlying records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamInterviewReport {
    pub team_id: TeamId,
    pub team_number: u32,
    pub project_title: String,
    pub total_students: usize,
    pub scores: ScoreAggregate,
    pub interviews: Vec<InterviewScore>,
}

/// Per-department interview report over the scores of its students.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentInterviewReport {
    pub department_id: DepartmentId,
    pub department_name: String,
    /// Count of students in the department that have an interview record.
    pub total_students: usize,
    pub scores: ScoreAggregate,
}

/// Ranked entry in the organization-wide overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformerView {
    pub student_id: StudentId,
    pub student_name: String,
    pub team_id: Option<TeamId>,
    pub total_score: u32,
    pub average_score: f64,
}

/// Organization-wide interview overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgInterviewOverview {
    pub total_interviews: usize,
    pub scores: ScoreAggregate,
    pub top_performers: Vec<TopPerformerView>,
    pub departments: Vec<DepartmentRollupEntry>,
}

/// Dashboard counters for one organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgSnapshot {
    pub total_students: usize,
    pub total_teams: usize,
    pub total_departments: usize,
    pub completed_teams: usize,
    pub incomplete_teams: usize,
    /// (team, student) pairs grouped by the team's domain.
    pub students_per_domain: BTreeMap<String, usize>,
}

/// Per-department completion/participation entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentBreakdownEntry {
    pub department_id: DepartmentId,
    pub department_name: String,
    /// Distinct teams with at least one member in the department. A team
    /// spanning several departments is counted once per department.
    pub team_count: usize,
    /// (team, student)-in-department pairs.
    pub member_count: usize,
}

/// Progress listing entry, annotated with the completed-checkpoint count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProgressEntry {
    pub team_id: TeamId,
    pub team_number: u32,
    pub project_title: String,
    pub domain: String,
    pub completed: bool,
    pub ticked: usize,
    pub total_checkpoints: usize,
}
