use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    Department, DepartmentId, InterviewId, InterviewScore, OrgId, Student, StudentId, Team, TeamId,
};

/// Storage abstraction so the service and cascade engines can be exercised in
/// isolation. Every operation is scoped by the caller's organization; the
/// store must never leak records across tenants.
pub trait TrackerStore: Send + Sync {
    fn insert_department(&self, department: Department) -> Result<Department, StoreError>;
    fn department(&self, org: &OrgId, id: &DepartmentId)
        -> Result<Option<Department>, StoreError>;
    fn departments(&self, org: &OrgId) -> Result<Vec<Department>, StoreError>;
    fn delete_department(&self, org: &OrgId, id: &DepartmentId) -> Result<(), StoreError>;

    /// Insert fails with [`StoreError::DuplicateRegistration`] when another
    /// student in the same organization holds the same registration number.
    fn insert_student(&self, student: Student) -> Result<Student, StoreError>;
    fn update_student(&self, student: Student) -> Result<(), StoreError>;
    fn student(&self, org: &OrgId, id: &StudentId) -> Result<Option<Student>, StoreError>;
    fn students(&self, org: &OrgId) -> Result<Vec<Student>, StoreError>;
    fn delete_students(&self, org: &OrgId, ids: &[StudentId]) -> Result<usize, StoreError>;

    fn insert_team(&self, team: Team) -> Result<Team, StoreError>;
    fn update_team(&self, team: Team) -> Result<(), StoreError>;
    fn team(&self, org: &OrgId, id: &TeamId) -> Result<Option<Team>, StoreError>;
    fn teams(&self, org: &OrgId) -> Result<Vec<Team>, StoreError>;
    fn delete_team(&self, org: &OrgId, id: &TeamId) -> Result<(), StoreError>;
    /// Highest team number currently assigned in the organization, 0 when none.
    fn max_team_number(&self, org: &OrgId) -> Result<u32, StoreError>;

    fn insert_interview(&self, interview: InterviewScore) -> Result<InterviewScore, StoreError>;
    fn update_interview(&self, interview: InterviewScore) -> Result<(), StoreError>;
    fn interview_for_student(
        &self,
        org: &OrgId,
        student: &StudentId,
    ) -> Result<Option<InterviewScore>, StoreError>;
    fn interviews(&self, org: &OrgId) -> Result<Vec<InterviewScore>, StoreError>;
    fn interviews_for_team(
        &self,
        org: &OrgId,
        team: &TeamId,
    ) -> Result<Vec<InterviewScore>, StoreError>;
    fn delete_interviews_for_student(
        &self,
        org: &OrgId,
        student: &StudentId,
    ) -> Result<usize, StoreError>;
    fn delete_interviews_for_team(&self, org: &OrgId, team: &TeamId)
        -> Result<usize, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("registration number '{0}' already in use")]
    DuplicateRegistration(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct MemoryState {
    departments: BTreeMap<DepartmentId, Department>,
    students: BTreeMap<StudentId, Student>,
    teams: BTreeMap<TeamId, Team>,
    interviews: BTreeMap<InterviewId, InterviewScore>,
}

/// In-memory store used by the service binary, the demo command, and tests.
/// BTreeMap keys over zero-padded sequential ids keep listings in creation
/// order, which the stable-sort aggregations rely on.
#[derive(Default, Clone)]
pub struct MemoryTrackerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTrackerStore {
    fn locked<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        f(&mut guard)
    }

    fn registration_taken(state: &MemoryState, candidate: &Student) -> bool {
        let Some(number) = candidate.registered_number.as_deref() else {
            return false;
        };
        state.students.values().any(|existing| {
            existing.id != candidate.id
                && existing.organization == candidate.organization
                && existing.registered_number.as_deref() == Some(number)
        })
    }
}

impl TrackerStore for MemoryTrackerStore {
    fn insert_department(&self, department: Department) -> Result<Department, StoreError> {
        self.locked(|state| {
            if state.departments.contains_key(&department.id) {
                return Err(StoreError::Conflict);
            }
            state
                .departments
                .insert(department.id.clone(), department.clone());
            Ok(department)
        })
    }

    fn department(
        &self,
        org: &OrgId,
        id: &DepartmentId,
    ) -> Result<Option<Department>, StoreError> {
        self.locked(|state| {
            Ok(state
                .departments
                .get(id)
                .filter(|department| &department.organization == org)
                .cloned())
        })
    }

    fn departments(&self, org: &OrgId) -> Result<Vec<Department>, StoreError> {
        self.locked(|state| {
            Ok(state
                .departments
                .values()
                .filter(|department| &department.organization == org)
                .cloned()
                .collect())
        })
    }

    fn delete_department(&self, org: &OrgId, id: &DepartmentId) -> Result<(), StoreError> {
        self.locked(|state| {
            let matches = state
                .departments
                .get(id)
                .is_some_and(|department| &department.organization == org);
            if !matches {
                return Err(StoreError::NotFound);
            }
            state.departments.remove(id);
            Ok(())
        })
    }

    fn insert_student(&self, student: Student) -> Result<Student, StoreError> {
        self.locked(|state| {
            if state.students.contains_key(&student.id) {
                return Err(StoreError::Conflict);
            }
            if Self::registration_taken(state, &student) {
                let number = student.registered_number.clone().unwrap_or_default();
                return Err(StoreError::DuplicateRegistration(number));
            }
            state.students.insert(student.id.clone(), student.clone());
            Ok(student)
        })
    }

    fn update_student(&self, student: Student) -> Result<(), StoreError> {
        self.locked(|state| {
            if !state.students.contains_key(&student.id) {
                return Err(StoreError::NotFound);
            }
            if Self::registration_taken(state, &student) {
                let number = student.registered_number.clone().unwrap_or_default();
                return Err(StoreError::DuplicateRegistration(number));
            }
            state.students.insert(student.id.clone(), student);
            Ok(())
        })
    }

    fn student(&self, org: &OrgId, id: &StudentId) -> Result<Option<Student>, StoreError> {
        self.locked(|state| {
            Ok(state
                .students
                .get(id)
                .filter(|student| &student.organization == org)
                .cloned())
        })
    }

    fn students(&self, org: &OrgId) -> Result<Vec<Student>, StoreError> {
        self.locked(|state| {
            Ok(state
                .students
                .values()
                .filter(|student| &student.organization == org)
                .cloned()
                .collect())
        })
    }

    fn delete_students(&self, org: &OrgId, ids: &[StudentId]) -> Result<usize, StoreError> {
        self.locked(|state| {
            let mut removed = 0;
            for id in ids {
                let matches = state
                    .students
                    .get(id)
                    .is_some_and(|student| &student.organization == org);
                if matches {
                    state.students.remove(id);
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn insert_team(&self, team: Team) -> Result<Team, StoreError> {
        self.locked(|state| {
            if state.teams.contains_key(&team.id) {
                return Err(StoreError::Conflict);
            }
            state.teams.insert(team.id.clone(), team.clone());
            Ok(team)
        })
    }

    fn update_team(&self, team: Team) -> Result<(), StoreError> {
        self.locked(|state| {
            if !state.teams.contains_key(&team.id) {
                return Err(StoreError::NotFound);
            }
            state.teams.insert(team.id.clone(), team);
            Ok(())
        })
    }

    fn team(&self, org: &OrgId, id: &TeamId) -> Result<Option<Team>, StoreError> {
        self.locked(|state| {
            Ok(state
                .teams
                .get(id)
                .filter(|team| &team.organization == org)
                .cloned())
        })
    }

    fn teams(&self, org: &OrgId) -> Result<Vec<Team>, StoreError> {
        self.locked(|state| {
            Ok(state
                .teams
                .values()
                .filter(|team| &team.organization == org)
                .cloned()
                .collect())
        })
    }

    fn delete_team(&self, org: &OrgId, id: &TeamId) -> Result<(), StoreError> {
        self.locked(|state| {
            let matches = state
                .teams
                .get(id)
                .is_some_and(|team| &team.organization == org);
            if !matches {
                return Err(StoreError::NotFound);
            }
            state.teams.remove(id);
            Ok(())
        })
    }

    fn max_team_number(&self, org: &OrgId) -> Result<u32, StoreError> {
        self.locked(|state| {
            Ok(state
                .teams
                .values()
                .filter(|team| &team.organization == org)
                .map(|team| team.team_number)
                .max()
                .unwrap_or(0))
        })
    }

    fn insert_interview(&self, interview: InterviewScore) -> Result<InterviewScore, StoreError> {
        self.locked(|state| {
            if state.interviews.contains_key(&interview.id) {
                return Err(StoreError::Conflict);
            }
            state
                .interviews
                .insert(interview.id.clone(), interview.clone());
            Ok(interview)
        })
    }

    fn update_interview(&self, interview: InterviewScore) -> Result<(), StoreError> {
        self.locked(|state| {
            if !state.interviews.contains_key(&interview.id) {
                return Err(StoreError::NotFound);
            }
            state.interviews.insert(interview.id.clone(), interview);
            Ok(())
        })
    }

    fn interview_for_student(
        &self,
        org: &OrgId,
        student: &StudentId,
    ) -> Result<Option<InterviewScore>, StoreError> {
        self.locked(|state| {
            Ok(state
                .interviews
                .values()
                .find(|interview| {
                    &interview.organization == org && &interview.student_id == student
                })
                .cloned())
        })
    }

    fn interviews(&self, org: &OrgId) -> Result<Vec<InterviewScore>, StoreError> {
        self.locked(|state| {
            Ok(state
                .interviews
                .values()
                .filter(|interview| &interview.organization == org)
                .cloned()
                .collect())
        })
    }

    fn interviews_for_team(
        &self,
        org: &OrgId,
        team: &TeamId,
    ) -> Result<Vec<InterviewScore>, StoreError> {
        self.locked(|state| {
            Ok(state
                .interviews
                .values()
                .filter(|interview| {
                    &interview.organization == org && interview.team_id.as_ref() == Some(team)
                })
                .cloned()
                .collect())
        })
    }

    fn delete_interviews_for_student(
        &self,
        org: &OrgId,
        student: &StudentId,
    ) -> Result<usize, StoreError> {
        self.locked(|state| {
            let before = state.interviews.len();
            state.interviews.retain(|_, interview| {
                !(&interview.organization == org && &interview.student_id == student)
            });
            Ok(before - state.interviews.len())
        })
    }

    fn delete_interviews_for_team(
        &self,
        org: &OrgId,
        team: &TeamId,
    ) -> Result<usize, StoreError> {
        self.locked(|state| {
            let before = state.interviews.len();
            state.interviews.retain(|_, interview| {
                !(&interview.organization == org && interview.team_id.as_ref() == Some(team))
            });
            Ok(before - state.interviews.len())
        })
    }
}
