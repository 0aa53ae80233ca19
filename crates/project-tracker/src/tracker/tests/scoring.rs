use super::common::*;
use crate::tracker::domain::MetricKind;
use crate::tracker::scoring::{
    aggregate_scores, department_rollup, derived_score, round2, top_performers,
    UNKNOWN_DEPARTMENT,
};
use std::collections::HashMap;

#[test]
fn derived_score_of_empty_metrics_is_zero() {
    let metrics = metric_map(&[]);
    assert_eq!(derived_score(&metrics), (0, 0.0));
}

#[test]
fn derived_score_sums_present_metrics_only() {
    let metrics = metric_map(&[
        (MetricKind::SelfIntro, 8),
        (MetricKind::Communication, 6),
        (MetricKind::Dsa, 7),
    ]);
    let (total, average) = derived_score(&metrics);
    assert_eq!(total, 21);
    assert_eq!(average, 7.0);
}

#[test]
fn derived_score_rounds_to_two_decimals() {
    let metrics = metric_map(&[
        (MetricKind::SelfIntro, 5),
        (MetricKind::Communication, 4),
        (MetricKind::Confidence, 4),
    ]);
    let (total, average) = derived_score(&metrics);
    assert_eq!(total, 13);
    assert_eq!(average, 4.33);
}

#[test]
fn round2_behaves_at_boundaries() {
    assert_eq!(round2(4.336), 4.34);
    assert_eq!(round2(4.334), 4.33);
    assert_eq!(round2(0.0), 0.0);
    assert_eq!(round2(9.999), 10.0);
}

#[test]
fn aggregate_of_empty_list_is_all_zeros() {
    let aggregate = aggregate_scores(&[]);
    assert_eq!(aggregate.average_total_score, 0.0);
    assert_eq!(aggregate.average_average_score, 0.0);
    assert_eq!(aggregate.highest_score, 0);
    assert_eq!(aggregate.lowest_score, 0);
    assert_eq!(aggregate.metric_averages.len(), 10);
    assert!(aggregate.metric_averages.values().all(|avg| *avg == 0.0));
}

#[test]
fn aggregate_computes_bounds_and_means() {
    let scores = vec![
        score_record("s1", &[(MetricKind::SelfIntro, 8), (MetricKind::Dsa, 6)]),
        score_record("s2", &[(MetricKind::SelfIntro, 4)]),
    ];
    let aggregate = aggregate_scores(&scores);
    // totals 14 and 4; averages 7.0 and 4.0
    assert_eq!(aggregate.average_total_score, 9.0);
    assert_eq!(aggregate.average_average_score, 5.5);
    assert_eq!(aggregate.highest_score, 14);
    assert_eq!(aggregate.lowest_score, 4);
}

#[test]
fn metric_averages_skip_absent_values() {
    let scores = vec![
        score_record("s1", &[(MetricKind::SelfIntro, 8), (MetricKind::Dsa, 6)]),
        score_record("s2", &[(MetricKind::SelfIntro, 4)]),
    ];
    let aggregate = aggregate_scores(&scores);
    assert_eq!(aggregate.metric_averages[&MetricKind::SelfIntro], 6.0);
    // only one record carries dsa; the absent one is excluded, not zeroed
    assert_eq!(aggregate.metric_averages[&MetricKind::Dsa], 6.0);
    assert_eq!(aggregate.metric_averages[&MetricKind::Teamwork], 0.0);
    assert_eq!(aggregate.metric_averages.len(), 10);
}

#[test]
fn top_performers_sorts_descending_and_keeps_tie_order() {
    let scores = vec![
        score_record("low", &[(MetricKind::SelfIntro, 5)]),
        score_record("tie-first", &[(MetricKind::SelfIntro, 10)]),
        score_record("tie-second", &[(MetricKind::Communication, 10)]),
    ];
    let ranked = top_performers(&scores, 5);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].student_id.0, "tie-first");
    assert_eq!(ranked[1].student_id.0, "tie-second");
    assert_eq!(ranked[2].student_id.0, "low");
}

#[test]
fn top_performers_truncates_to_limit() {
    let scores: Vec<_> = (1..=8)
        .map(|n| score_record(&format!("s{n}"), &[(MetricKind::SelfIntro, n)]))
        .collect();
    let ranked = top_performers(&scores, 5);
    assert_eq!(ranked.len(), 5);
    assert_eq!(ranked[0].total_score, 8);
    assert_eq!(ranked[4].total_score, 4);
}

#[test]
fn department_rollup_groups_by_name_with_unknown_fallback() {
    let scores = vec![
        score_record("s1", &[(MetricKind::SelfIntro, 8), (MetricKind::Dsa, 6)]),
        score_record("s2", &[(MetricKind::SelfIntro, 4)]),
        score_record("s3", &[(MetricKind::Communication, 9)]),
    ];
    let mut departments = HashMap::new();
    departments.insert(scores[0].student_id.clone(), "CSE".to_string());
    departments.insert(scores[1].student_id.clone(), "CSE".to_string());

    let rollup = department_rollup(&scores, &departments);
    assert_eq!(rollup.len(), 2);

    let cse = rollup
        .iter()
        .find(|entry| entry.department == "CSE")
        .expect("cse bucket");
    assert_eq!(cse.total_students, 2);
    assert_eq!(cse.average_total_score, 9.0);
    assert_eq!(cse.average_average_score, 5.5);

    let unknown = rollup
        .iter()
        .find(|entry| entry.department == UNKNOWN_DEPARTMENT)
        .expect("unknown bucket");
    assert_eq!(unknown.total_students, 1);
    assert_eq!(unknown.average_total_score, 9.0);
}
