use super::common::*;
use crate::tracker::domain::MetricKind;
use crate::tracker::router::tracker_router;
use crate::tracker::service::{InterviewUpsert, NewStudent};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    match body {
        Some(value) => builder
            .body(Body::from(
                serde_json::to_vec(&value).expect("serialize body"),
            ))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

#[tokio::test]
async fn post_team_returns_created_view() {
    let (service, _) = build_service();
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/orgs/acme-institute/teams",
            Some(json!({
                "project_title": "Attendance Portal",
                "project_description": "QR-based attendance",
                "domain": "web",
                "students": [
                    { "name": "Asha", "role": "frontend" },
                    { "name": "Bela", "role": "backend" }
                ]
            })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["team_number"].as_u64(), Some(1));
    assert_eq!(payload["students"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["checkpoints"].as_array().map(Vec::len), Some(4));
    assert_eq!(payload["completed"].as_bool(), Some(false));
}

#[tokio::test]
async fn duplicate_registration_is_conflict_with_specific_code() {
    let (service, _) = build_service();
    service
        .create_student(
            &org(),
            NewStudent {
                registered_number: Some("REG001".to_string()),
                ..new_student("Asha")
            },
        )
        .expect("first student");
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/orgs/acme-institute/students",
            Some(json!({ "name": "Bela", "registered_number": "reg001" })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["code"].as_str(),
        Some("duplicate_registration"),
        "the UI keys a specific message off this code"
    );
}

#[tokio::test]
async fn checkpoint_index_out_of_range_is_bad_request() {
    let (service, _) = build_service();
    let org = org();
    let team = service
        .create_team(&org, new_team("Alpha", "web", vec![]))
        .expect("team creates");
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/orgs/acme-institute/teams/{}/checkpoints/9", team.id.0),
            Some(json!({ "completed": true })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"].as_str(), Some("validation"));
}

#[tokio::test]
async fn guarded_department_delete_is_conflict() {
    let (service, _) = build_service();
    let org = org();
    let department = create_department(&service, &org, "CSE");
    service
        .create_student(&org, new_student_in("Asha", &department.id))
        .expect("student creates");
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "DELETE",
            &format!(
                "/api/v1/orgs/acme-institute/departments/{}",
                department.id.0
            ),
            None,
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("student"));
}

#[tokio::test]
async fn interview_upsert_feeds_the_overview() {
    let (service, _) = build_service();
    let org = org();
    let team = service
        .create_team(&org, new_team("Alpha", "web", vec![new_student("Asha")]))
        .expect("team creates");
    let member = team.students[0].id.clone();
    let router = tracker_router(Arc::new(service));

    let upsert = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/orgs/acme-institute/interviews",
            Some(json!({
                "student_id": member.0,
                "team_id": team.id.0,
                "metrics": { "self_intro": 8, "communication": 6 }
            })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(upsert.status(), StatusCode::OK);
    let record = read_json_body(upsert).await;
    assert_eq!(record["total_score"].as_u64(), Some(14));
    assert_eq!(record["average_score"].as_f64(), Some(7.0));

    let overview = router
        .oneshot(request(
            "GET",
            "/api/v1/orgs/acme-institute/interviews/overview",
            None,
        ))
        .await
        .expect("router dispatch");
    assert_eq!(overview.status(), StatusCode::OK);
    let payload = read_json_body(overview).await;
    assert_eq!(payload["total_interviews"].as_u64(), Some(1));
    assert_eq!(
        payload["scores"]["metric_averages"]
            .as_object()
            .map(|map| map.len()),
        Some(10)
    );
    assert_eq!(
        payload["top_performers"][0]["student_name"].as_str(),
        Some("Asha")
    );
}

#[tokio::test]
async fn statistics_endpoint_reports_counts() {
    let (service, _) = build_service();
    let org = org();
    create_department(&service, &org, "CSE");
    service
        .create_team(&org, new_team("Alpha", "web", vec![new_student("Asha")]))
        .expect("team creates");
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/orgs/acme-institute/statistics",
            None,
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total_students"].as_u64(), Some(1));
    assert_eq!(payload["total_teams"].as_u64(), Some(1));
    assert_eq!(payload["total_departments"].as_u64(), Some(1));
    assert_eq!(payload["students_per_domain"]["web"].as_u64(), Some(1));
}

#[tokio::test]
async fn missing_student_lookup_is_not_found() {
    let (service, _) = build_service();
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/orgs/acme-institute/students/student-unknown",
            None,
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"].as_str(), Some("not_found"));
}

#[tokio::test]
async fn organization_scope_is_structural() {
    let (service, _) = build_service();
    service
        .upsert_interview(
            &org(),
            InterviewUpsert {
                student_id: service
                    .create_student(&org(), new_student("Asha"))
                    .expect("student creates")
                    .id,
                team_id: None,
                metrics: metric_map(&[(MetricKind::SelfIntro, 9)]),
            },
        )
        .expect("interview upserts");
    let router = tracker_router(Arc::new(service));

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/orgs/rival-institute/interviews",
            None,
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(0));
}
