use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::flatfile::{Assignment, Gradebook};

/// Course total the overall grade is measured against.
pub const DEFAULT_TOTAL_POINTS: u32 = 1000;

/// Histogram bin edges in percent. Bins are `[lo, hi)` except the last, which is closed.
pub const HISTOGRAM_EDGES: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Student not found")]
    StudentNotFound,
    #[error("Assignment not found")]
    AssignmentNotFound,
    /// Reported to users with the same wording as an unknown assignment.
    #[error("Assignment not found")]
    NoSubmissions,
    #[error("Assignment has no point value")]
    ZeroPoints,
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::StudentNotFound => "student_not_found",
            QueryError::AssignmentNotFound => "assignment_not_found",
            QueryError::NoSubmissions => "no_submissions",
            QueryError::ZeroPoints => "zero_points",
        }
    }
}

/// Nearest integer, ties to even.
pub fn round_percent(x: f64) -> i64 {
    x.round_ties_even() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGrade {
    pub student_id: String,
    pub student: String,
    pub total_score: f64,
    pub grade: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub assignment_id: String,
    pub assignment: String,
    pub points: i64,
    pub count: usize,
    pub min: i64,
    pub avg: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub assignment_id: String,
    pub assignment: String,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn title(&self) -> String {
        format!("{} Score Distribution", self.assignment)
    }
}

/// Sum of fraction x points over every assignment; missing submissions count as zero.
fn total_score_for(book: &Gradebook, student_id: &str) -> f64 {
    let mut total = 0.0;
    for a in book.assignments.iter() {
        let fraction = book.submissions.get(student_id, &a.id).unwrap_or(0.0);
        total += fraction * a.points as f64;
    }
    total
}

fn grade_from_total(total_score: f64, total_points: u32) -> i64 {
    round_percent(total_score / total_points as f64 * 100.0)
}

pub fn student_grade(
    book: &Gradebook,
    student_name: &str,
    total_points: u32,
) -> Result<StudentGrade, QueryError> {
    let student = book
        .roster
        .find_by_name(student_name)
        .ok_or(QueryError::StudentNotFound)?;

    let total_score = total_score_for(book, &student.id);
    let grade = grade_from_total(total_score, total_points);
    debug!(student_id = %student.id, total_score, grade, "computed student grade");

    Ok(StudentGrade {
        student_id: student.id.clone(),
        student: student.name.clone(),
        total_score,
        grade,
    })
}

fn find_assignment<'a>(book: &'a Gradebook, name: &str) -> Result<&'a Assignment, QueryError> {
    book.assignments
        .find_by_name(name)
        .ok_or(QueryError::AssignmentNotFound)
}

/// Fractions for students on the roster who submitted, in roster order.
/// Students without a submission are left out rather than counted as zero.
fn submitted_fractions(book: &Gradebook, assignment_id: &str) -> Vec<f64> {
    book.roster
        .iter()
        .filter_map(|s| book.submissions.get(&s.id, assignment_id))
        .collect()
}

fn stats_for(book: &Gradebook, a: &Assignment) -> Result<AssignmentStats, QueryError> {
    let points = a.points as f64;
    let scores: Vec<f64> = submitted_fractions(book, &a.id)
        .into_iter()
        .map(|f| f * points)
        .collect();
    if scores.is_empty() {
        return Err(QueryError::NoSubmissions);
    }
    if a.points == 0 {
        return Err(QueryError::ZeroPoints);
    }

    let percentages: Vec<i64> = scores
        .iter()
        .map(|score| round_percent(score / points * 100.0))
        .collect();
    let count = percentages.len();
    // Rounded percents saturate at the i64 bounds, so the sum needs headroom.
    let sum: i128 = percentages.iter().map(|&p| i128::from(p)).sum();
    let min = percentages.iter().copied().min().unwrap_or(0);
    let max = percentages.iter().copied().max().unwrap_or(0);

    Ok(AssignmentStats {
        assignment_id: a.id.clone(),
        assignment: a.name.clone(),
        points: a.points,
        count,
        min,
        avg: sum.div_euclid(count as i128) as i64,
        max,
    })
}

pub fn assignment_stats(
    book: &Gradebook,
    assignment_name: &str,
) -> Result<AssignmentStats, QueryError> {
    let a = find_assignment(book, assignment_name)?;
    let stats = stats_for(book, a)?;
    debug!(assignment_id = %a.id, count = stats.count, "computed assignment stats");
    Ok(stats)
}

/// Counts values into `edges.len() - 1` bins. The last bin includes its upper edge;
/// values outside the outer edges are not counted.
pub fn bin_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let nbins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; nbins];
    if nbins == 0 {
        return counts;
    }
    let last = edges[nbins];
    for &v in values {
        if !(v >= edges[0] && v <= last) {
            continue;
        }
        let bin = if v == last {
            nbins - 1
        } else {
            edges[1..].iter().position(|&hi| v < hi).unwrap_or(nbins - 1)
        };
        counts[bin] += 1;
    }
    counts
}

fn histogram_for(book: &Gradebook, a: &Assignment) -> Result<Histogram, QueryError> {
    let scores: Vec<f64> = submitted_fractions(book, &a.id)
        .into_iter()
        .map(|f| f * 100.0)
        .collect();
    if scores.is_empty() {
        return Err(QueryError::NoSubmissions);
    }

    Ok(Histogram {
        assignment_id: a.id.clone(),
        assignment: a.name.clone(),
        edges: HISTOGRAM_EDGES.to_vec(),
        counts: bin_counts(&scores, &HISTOGRAM_EDGES),
    })
}

pub fn assignment_histogram(
    book: &Gradebook,
    assignment_name: &str,
) -> Result<Histogram, QueryError> {
    let a = find_assignment(book, assignment_name)?;
    let hist = histogram_for(book, a)?;
    debug!(assignment_id = %a.id, counts = ?hist.counts, "binned assignment scores");
    Ok(hist)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub student_id: String,
    pub display_name: String,
    pub total_score: f64,
    pub grade: i64,
    pub submitted_count: usize,
    pub missing_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub assignment_id: String,
    pub name: String,
    pub points: i64,
    pub submission_count: usize,
    pub min: Option<i64>,
    pub avg: Option<i64>,
    pub max: Option<i64>,
    pub histogram: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub total_points: u32,
    #[serde(rename = "perStudent")]
    pub per_student: Vec<StudentRow>,
    #[serde(rename = "perAssignment")]
    pub per_assignment: Vec<AssignmentRow>,
}

pub fn compute_class_summary(book: &Gradebook, total_points: u32) -> ClassSummary {
    let assignment_count = book.assignments.len();

    let per_student: Vec<StudentRow> = book
        .roster
        .iter()
        .map(|s| {
            let submitted_count = book
                .assignments
                .iter()
                .filter(|a| book.submissions.get(&s.id, &a.id).is_some())
                .count();
            let total_score = total_score_for(book, &s.id);
            StudentRow {
                student_id: s.id.clone(),
                display_name: s.name.clone(),
                total_score,
                grade: grade_from_total(total_score, total_points),
                submitted_count,
                missing_count: assignment_count - submitted_count,
            }
        })
        .collect();

    let per_assignment: Vec<AssignmentRow> = book
        .assignments
        .iter()
        .map(|a| {
            let submission_count = submitted_fractions(book, &a.id).len();
            let stats = stats_for(book, a).ok();
            let histogram = histogram_for(book, a)
                .map(|h| h.counts)
                .unwrap_or_else(|_| vec![0; HISTOGRAM_EDGES.len() - 1]);
            AssignmentRow {
                assignment_id: a.id.clone(),
                name: a.name.clone(),
                points: a.points,
                submission_count,
                min: stats.as_ref().map(|s| s.min),
                avg: stats.as_ref().map(|s| s.avg),
                max: stats.as_ref().map(|s| s.max),
                histogram,
            }
        })
        .collect();

    ClassSummary {
        total_points,
        per_student,
        per_assignment,
    }
}
