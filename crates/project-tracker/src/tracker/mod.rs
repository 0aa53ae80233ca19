//! Completion tracking, interview scoring, and referential integrity for
//! academic project teams.
//!
//! The store trait abstracts persistence so the engines can be exercised in
//! isolation; the service composes the engines and is the only mutation
//! path; the router exposes the service over HTTP with the organization
//! scope baked into every path.

pub mod cascade;
pub mod domain;
pub mod router;
pub mod scoring;
pub mod service;
pub mod stats;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use cascade::RemovalSummary;
pub use domain::{
    default_checkpoints, Checkpoint, Department, DepartmentId, InterviewId, InterviewScore,
    MetricKind, OrgId, Student, StudentId, Team, TeamId, METRIC_MAX, METRIC_MIN,
};
pub use router::{tracker_router, CheckpointFlag, StudentBulkDelete, TeamBulkDelete};
pub use scoring::{DepartmentRollupEntry, ScoreAggregate};
pub use service::{
    CheckpointUpdate, EntityKind, InterviewUpsert, NewDepartment, NewStudent, NewTeam,
    StudentFilter, StudentPatch, TeamInterviewEntry, TeamPatch, TeamProgressFilter, TrackerError,
    TrackerService,
};
pub use store::{MemoryTrackerStore, StoreError, TrackerStore};
pub use views::{
    DepartmentBreakdownEntry, DepartmentInterviewReport, OrgInterviewOverview, OrgSnapshot,
    TeamDetailView, TeamInterviewReport, TeamProgressEntry, TopPerformerView,
};
