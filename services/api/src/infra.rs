use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use project_tracker::tracker::{
    CheckpointUpdate, DepartmentId, InterviewUpsert, MetricKind, NewDepartment, NewStudent,
    NewTeam, OrgId, TeamInterviewEntry, TrackerError, TrackerService, TrackerStore,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn demo_org() -> OrgId {
    OrgId("demo-university".to_string())
}

fn seed_member(
    name: &str,
    department: &DepartmentId,
    role: &str,
    registered_number: &str,
) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        department: Some(department.clone()),
        role: role.to_string(),
        resume_url: String::new(),
        registered_number: Some(registered_number.to_string()),
    }
}

/// Populate an organization with enough data to make the dashboard, reports,
/// and cascade paths worth looking at.
pub(crate) fn seed_demo_data<S>(
    service: &TrackerService<S>,
    org: &OrgId,
) -> Result<(), TrackerError>
where
    S: TrackerStore + 'static,
{
    let cse = service.create_department(
        org,
        NewDepartment {
            name: "CSE".to_string(),
        },
    )?;
    let ece = service.create_department(
        org,
        NewDepartment {
            name: "ECE".to_string(),
        },
    )?;

    let attendance = service.create_team(
        org,
        NewTeam {
            project_title: "Attendance Portal".to_string(),
            project_description: "QR-based attendance with weekly summaries".to_string(),
            domain: "web".to_string(),
            github_url: "https://github.com/demo-university/attendance-portal".to_string(),
            students: vec![
                seed_member("Asha Rao", &cse.id, "frontend", "REG2101"),
                seed_member("Bela Iyer", &cse.id, "backend", "REG2102"),
                seed_member("Chirag Shah", &ece.id, "integrations", "REG2103"),
            ],
            ..NewTeam::default()
        },
    )?;

    let robotics = service.create_team(
        org,
        NewTeam {
            project_title: "Warehouse Robotics".to_string(),
            project_description: "Pick-path planning on a tabletop rig".to_string(),
            domain: "embedded".to_string(),
            students: vec![
                seed_member("Devi Nair", &ece.id, "firmware", "REG2104"),
                seed_member("Eshan Kulkarni", &ece.id, "controls", "REG2105"),
            ],
            ..NewTeam::default()
        },
    )?;

    service.set_checkpoints(
        org,
        &attendance.id,
        &[
            CheckpointUpdate {
                index: 0,
                completed: true,
            },
            CheckpointUpdate {
                index: 1,
                completed: true,
            },
            CheckpointUpdate {
                index: 2,
                completed: true,
            },
        ],
    )?;
    service.set_checkpoints(
        org,
        &robotics.id,
        &(0..4)
            .map(|index| CheckpointUpdate {
                index,
                completed: true,
            })
            .collect::<Vec<_>>(),
    )?;

    service.upsert_team_interviews(
        org,
        &attendance.id,
        vec![
            TeamInterviewEntry {
                student_id: attendance.students[0].id.clone(),
                metrics: [
                    (MetricKind::SelfIntro, 8),
                    (MetricKind::Communication, 7),
                    (MetricKind::Dsa, 6),
                ]
                .into_iter()
                .collect(),
            },
            TeamInterviewEntry {
                student_id: attendance.students[1].id.clone(),
                metrics: [
                    (MetricKind::SelfIntro, 6),
                    (MetricKind::ProblemSolving, 8),
                ]
                .into_iter()
                .collect(),
            },
        ],
    )?;
    service.upsert_interview(
        org,
        InterviewUpsert {
            student_id: robotics.students[0].id.clone(),
            team_id: Some(robotics.id.clone()),
            metrics: [(MetricKind::TechStack, 9), (MetricKind::Teamwork, 8)]
                .into_iter()
                .collect(),
        },
    )?;

    Ok(())
}
