use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant identifier scoping every other entity. Supplied by the
/// authentication layer; the tracker only threads it through.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrgId(pub String);

/// Identifier wrapper for departments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepartmentId(pub String);

/// Identifier wrapper for students.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for teams.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

/// Identifier wrapper for interview score records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterviewId(pub String);

/// Low-cardinality classification for students. Departments are referenced,
/// never owned, so deleting one is guarded rather than cascaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub organization: OrgId,
}

/// A student, optionally classified under a department and linked to at most
/// one team. The `team_id` side of the student/team link is written only by
/// the cascade engine and team creation, never patched directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub department: Option<DepartmentId>,
    pub role: String,
    pub resume_url: String,
    pub team_id: Option<TeamId>,
    pub organization: OrgId,
    /// Unique per organization, case-insensitively; stored trimmed and lowercased.
    pub registered_number: Option<String>,
}

/// One stage of a team's delivery pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    pub completed: bool,
}

impl Checkpoint {
    fn open(name: &str) -> Self {
        Self {
            name: name.to_string(),
            completed: false,
        }
    }
}

/// The default four-stage checkpoint sequence assigned at team creation.
pub fn default_checkpoints() -> Vec<Checkpoint> {
    vec![
        Checkpoint::open("Ideation"),
        Checkpoint::open("Work Split"),
        Checkpoint::open("Local Done"),
        Checkpoint::open("Hosted"),
    ]
}

/// A project team with its ordered member list and checkpoint pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Auto-assigned as `max + 1` within the organization when not supplied.
    pub team_number: u32,
    pub project_title: String,
    pub project_description: String,
    pub domain: String,
    pub students: Vec<StudentId>,
    /// Derived: true iff every checkpoint is completed. Never set directly.
    pub completed: bool,
    pub github_url: String,
    pub hosted_url: String,
    pub checkpoints: Vec<Checkpoint>,
    pub organization: OrgId,
}

impl Team {
    /// AND-fold over the checkpoint flags. An empty checkpoint list is
    /// vacuously complete; the default sequence keeps that unreachable
    /// through the normal create path.
    pub fn recompute_completed(&mut self) {
        self.completed = self.checkpoints.iter().all(|checkpoint| checkpoint.completed);
    }

    /// Number of completed checkpoints.
    pub fn ticked(&self) -> usize {
        self.checkpoints
            .iter()
            .filter(|checkpoint| checkpoint.completed)
            .count()
    }
}

/// The fixed interview rubric. Each metric is scored 1..=10 or left absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    SelfIntro,
    Communication,
    Confidence,
    Dsa,
    ProblemSolving,
    ProjectUnderstanding,
    TechStack,
    RoleExplanation,
    Teamwork,
    Adaptability,
}

impl MetricKind {
    pub const fn label(self) -> &'static str {
        match self {
            MetricKind::SelfIntro => "self_intro",
            MetricKind::Communication => "communication",
            MetricKind::Confidence => "confidence",
            MetricKind::Dsa => "dsa",
            MetricKind::ProblemSolving => "problem_solving",
            MetricKind::ProjectUnderstanding => "project_understanding",
            MetricKind::TechStack => "tech_stack",
            MetricKind::RoleExplanation => "role_explanation",
            MetricKind::Teamwork => "teamwork",
            MetricKind::Adaptability => "adaptability",
        }
    }

    pub fn ordered() -> [MetricKind; 10] {
        [
            MetricKind::SelfIntro,
            MetricKind::Communication,
            MetricKind::Confidence,
            MetricKind::Dsa,
            MetricKind::ProblemSolving,
            MetricKind::ProjectUnderstanding,
            MetricKind::TechStack,
            MetricKind::RoleExplanation,
            MetricKind::Teamwork,
            MetricKind::Adaptability,
        ]
    }
}

/// Inclusive bounds for a single metric value.
pub const METRIC_MIN: u8 = 1;
pub const METRIC_MAX: u8 = 10;

/// One interview record per `(student, organization)`. Derived fields are
/// recomputed by the scoring engine on every save, never caller-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewScore {
    pub id: InterviewId,
    pub student_id: StudentId,
    pub team_id: Option<TeamId>,
    pub organization: OrgId,
    pub metrics: BTreeMap<MetricKind, u8>,
    pub total_score: u32,
    pub average_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
