use crate::infra::seed_demo_data;
use clap::Args;
use project_tracker::error::AppError;
use project_tracker::tracker::{
    MemoryTrackerStore, OrgId, TeamProgressFilter, TrackerService,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Organization to seed and report on
    #[arg(long, default_value = "demo-university")]
    pub(crate) org: String,
    /// Include the full team progress listing in the output
    #[arg(long)]
    pub(crate) list_teams: bool,
    /// Skip the cascade walkthrough at the end of the demo
    #[arg(long)]
    pub(crate) skip_cascade: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        org,
        list_teams,
        skip_cascade,
    } = args;

    let store = Arc::new(MemoryTrackerStore::default());
    let service = TrackerService::new(store);
    let org = OrgId(org);
    seed_demo_data(&service, &org)?;

    println!("Completion tracker demo ({})", org.0);

    let snapshot = service.statistics(&org)?;
    println!("\nOrganization snapshot");
    println!(
        "- {} students | {} teams | {} departments",
        snapshot.total_students, snapshot.total_teams, snapshot.total_departments
    );
    println!(
        "- {} team(s) completed, {} in progress",
        snapshot.completed_teams, snapshot.incomplete_teams
    );
    println!("Students per domain:");
    for (domain, students) in &snapshot.students_per_domain {
        println!("  - {domain}: {students}");
    }

    println!("\nDepartment breakdown");
    for entry in service.department_breakdown(&org)? {
        println!(
            "- {}: {} team(s), {} member(s)",
            entry.department_name, entry.team_count, entry.member_count
        );
    }

    let overview = service.interview_overview(&org)?;
    println!("\nInterview overview ({} record(s))", overview.total_interviews);
    println!(
        "- average total {:.2} | average of averages {:.2} | best {} | lowest {}",
        overview.scores.average_total_score,
        overview.scores.average_average_score,
        overview.scores.highest_score,
        overview.scores.lowest_score
    );
    println!("Metric averages:");
    for (metric, average) in &overview.scores.metric_averages {
        println!("  - {}: {:.2}", metric.label(), average);
    }
    println!("Top performers:");
    for performer in &overview.top_performers {
        println!(
            "  - {} ({}): total {}, average {:.2}",
            performer.student_name, performer.student_id.0, performer.total_score,
            performer.average_score
        );
    }
    if !overview.departments.is_empty() {
        println!("Department roll-up:");
        for entry in &overview.departments {
            println!(
                "  - {}: {} student(s), avg total {:.2}, avg of averages {:.2}",
                entry.department, entry.total_students, entry.average_total_score,
                entry.average_average_score
            );
        }
    }

    if list_teams {
        println!("\nTeam progress");
        for entry in service.team_progress(&org, &TeamProgressFilter::default())? {
            let completion_note = if entry.completed { " (completed)" } else { "" };
            println!(
                "- #{} {} [{}] {}/{} checkpoints{}",
                entry.team_number,
                entry.project_title,
                entry.domain,
                entry.ticked,
                entry.total_checkpoints,
                completion_note
            );
        }
    }

    if skip_cascade {
        return Ok(());
    }

    println!("\nCascade walkthrough");
    let teams = service.teams(&org)?;
    let Some(team) = teams.iter().find(|team| team.students.len() > 1) else {
        println!("- no multi-member team available to demonstrate on");
        return Ok(());
    };
    let departing = &team.students[0];
    println!(
        "- removing {} from '{}' ({} members)",
        departing.name,
        team.project_title,
        team.students.len()
    );
    let summary = service.remove_student(&org, &departing.id)?;
    println!(
        "- removed {} student(s), {} team(s), {} interview record(s)",
        summary.students_removed, summary.teams_removed, summary.interviews_removed
    );
    let surviving = service.team(&org, &team.id)?;
    println!(
        "- '{}' continues with {} member(s)",
        surviving.project_title,
        surviving.students.len()
    );

    Ok(())
}
