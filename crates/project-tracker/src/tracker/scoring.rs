//! Derived-score recomputation and cross-interview aggregation.
//!
//! Derived fields are produced by pure functions called explicitly by every
//! mutating operation, so the arithmetic stays visible and unit-testable
//! instead of hiding behind a persistence hook.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::domain::{InterviewScore, MetricKind, StudentId};

/// Department bucket for interviews whose student has no department.
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Round to two decimal places, the precision every stored average uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Total and average over the metrics present in the map. Absent metrics are
/// excluded, never treated as zero; an empty map yields `(0, 0.0)`.
pub fn derived_score(metrics: &BTreeMap<MetricKind, u8>) -> (u32, f64) {
    if metrics.is_empty() {
        return (0, 0.0);
    }
    let total: u32 = metrics.values().map(|value| u32::from(*value)).sum();
    let average = round2(f64::from(total) / metrics.len() as f64);
    (total, average)
}

/// Refresh the derived fields on a record. Runs immediately before every
/// save, on create and on every metric update.
pub fn recompute(score: &mut InterviewScore) {
    let (total, average) = derived_score(&score.metrics);
    score.total_score = total;
    score.average_score = average;
}

/// Aggregate statistics over a set of interview records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAggregate {
    pub average_total_score: f64,
    pub average_average_score: f64,
    pub highest_score: u32,
    pub lowest_score: u32,
    /// One entry per rubric metric, averaging only records where the metric
    /// is present; metrics absent everywhere yield 0.
    pub metric_averages: BTreeMap<MetricKind, f64>,
}

/// Summarize a score list. An empty list yields all zeros rather than an
/// error; max/min are never taken over an empty sequence.
pub fn aggregate_scores(scores: &[InterviewScore]) -> ScoreAggregate {
    let mut metric_averages = BTreeMap::new();
    for kind in MetricKind::ordered() {
        let mut sum: u32 = 0;
        let mut present = 0usize;
        for score in scores {
            if let Some(value) = score.metrics.get(&kind) {
                sum += u32::from(*value);
                present += 1;
            }
        }
        let average = if present == 0 {
            0.0
        } else {
            round2(f64::from(sum) / present as f64)
        };
        metric_averages.insert(kind, average);
    }

    if scores.is_empty() {
        return ScoreAggregate {
            average_total_score: 0.0,
            average_average_score: 0.0,
            highest_score: 0,
            lowest_score: 0,
            metric_averages,
        };
    }

    let count = scores.len() as f64;
    let total_sum: u32 = scores.iter().map(|score| score.total_score).sum();
    let average_sum: f64 = scores.iter().map(|score| score.average_score).sum();

    ScoreAggregate {
        average_total_score: round2(f64::from(total_sum) / count),
        average_average_score: round2(average_sum / count),
        highest_score: scores.iter().map(|s| s.total_score).max().unwrap_or(0),
        lowest_score: scores.iter().map(|s| s.total_score).min().unwrap_or(0),
        metric_averages,
    }
}

/// The `limit` best records by total score. The sort is stable, so ties keep
/// their original relative order; fewer records than `limit` returns all.
pub fn top_performers(scores: &[InterviewScore], limit: usize) -> Vec<InterviewScore> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    ranked.truncate(limit);
    ranked
}

/// Per-department interview roll-up for the organization-wide overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentRollupEntry {
    pub department: String,
    pub total_students: usize,
    pub average_total_score: f64,
    /// Sum-then-divide of the already-rounded per-record averages; this
    /// compounds rounding error but matches the established reporting.
    pub average_average_score: f64,
}

/// Group scores by the owning student's department name, falling back to
/// [`UNKNOWN_DEPARTMENT`] when no department is assigned.
pub fn department_rollup(
    scores: &[InterviewScore],
    department_by_student: &HashMap<StudentId, String>,
) -> Vec<DepartmentRollupEntry> {
    let mut groups: BTreeMap<String, (usize, u32, f64)> = BTreeMap::new();
    for score in scores {
        let department = department_by_student
            .get(&score.student_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_DEPARTMENT.to_string());
        let entry = groups.entry(department).or_insert((0, 0, 0.0));
        entry.0 += 1;
        entry.1 += score.total_score;
        entry.2 += score.average_score;
    }

    groups
        .into_iter()
        .map(
            |(department, (count, total_sum, average_sum))| DepartmentRollupEntry {
                department,
                total_students: count,
                average_total_score: round2(f64::from(total_sum) / count as f64),
                average_average_score: round2(average_sum / count as f64),
            },
        )
        .collect()
}
