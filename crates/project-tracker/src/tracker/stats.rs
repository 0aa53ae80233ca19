//! Read-only aggregation over the team/student/department collections for
//! dashboard reporting. No function here mutates anything.

use std::collections::{BTreeMap, HashMap};

use super::domain::{Department, DepartmentId, Student, StudentId, Team};
use super::views::{DepartmentBreakdownEntry, TeamProgressEntry};

/// Domain bucket for teams with no domain set.
pub const UNASSIGNED_DOMAIN: &str = "unassigned";

/// (completed, incomplete) team counts.
pub(crate) fn completion_split(teams: &[Team]) -> (usize, usize) {
    let completed = teams.iter().filter(|team| team.completed).count();
    (completed, teams.len() - completed)
}

/// (team, student) pairs grouped by the team's domain: a team with N members
/// contributes N to its domain's tally.
pub(crate) fn students_per_domain(teams: &[Team]) -> BTreeMap<String, usize> {
    let mut buckets = BTreeMap::new();
    for team in teams {
        let key = if team.domain.trim().is_empty() {
            UNASSIGNED_DOMAIN.to_string()
        } else {
            team.domain.clone()
        };
        *buckets.entry(key).or_insert(0) += team.students.len();
    }
    buckets
}

/// Per-department participation: distinct teams touched and member pairs.
pub(crate) fn department_breakdown(
    departments: &[Department],
    teams: &[Team],
    students: &[Student],
) -> Vec<DepartmentBreakdownEntry> {
    let department_of: HashMap<&StudentId, &DepartmentId> = students
        .iter()
        .filter_map(|student| student.department.as_ref().map(|dept| (&student.id, dept)))
        .collect();

    departments
        .iter()
        .map(|department| {
            let mut team_count = 0;
            let mut member_count = 0;
            for team in teams {
                let members_here = team
                    .students
                    .iter()
                    .filter(|member| department_of.get(member) == Some(&&department.id))
                    .count();
                if members_here > 0 {
                    team_count += 1;
                    member_count += members_here;
                }
            }
            DepartmentBreakdownEntry {
                department_id: department.id.clone(),
                department_name: department.name.clone(),
                team_count,
                member_count,
            }
        })
        .collect()
}

/// Teams annotated with completed-checkpoint counts, optionally filtered by
/// department membership (any member qualifies) and completion state,
/// stable-sorted descending by `ticked`.
pub(crate) fn progress_listing(
    teams: &[Team],
    students: &[Student],
    department: Option<&DepartmentId>,
    completed: Option<bool>,
) -> Vec<TeamProgressEntry> {
    let department_of: HashMap<&StudentId, Option<&DepartmentId>> = students
        .iter()
        .map(|student| (&student.id, student.department.as_ref()))
        .collect();

    let mut entries: Vec<TeamProgressEntry> = teams
        .iter()
        .filter(|team| completed.map_or(true, |wanted| team.completed == wanted))
        .filter(|team| {
            department.map_or(true, |wanted| {
                team.students
                    .iter()
                    .any(|member| department_of.get(member) == Some(&Some(wanted)))
            })
        })
        .map(|team| TeamProgressEntry {
            team_id: team.id.clone(),
            team_number: team.team_number,
            project_title: team.project_title.clone(),
            domain: team.domain.clone(),
            completed: team.completed,
            ticked: team.ticked(),
            total_checkpoints: team.checkpoints.len(),
        })
        .collect();

    entries.sort_by(|a, b| b.ticked.cmp(&a.ticked));
    entries
}
