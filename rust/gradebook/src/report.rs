use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::calc::{compute_class_summary, ClassSummary};
use crate::flatfile::Gradebook;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    pub generated_at: String,
    #[serde(flatten)]
    pub summary: ClassSummary,
}

pub fn build_report(book: &Gradebook, total_points: u32) -> ReportModel {
    ReportModel {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        summary: compute_class_summary(book, total_points),
    }
}

/// Pretty JSON to `out_path`, or to `stdout` when no path is given.
pub fn write_report<W: Write>(
    report: &ReportModel,
    out_path: Option<&Path>,
    stdout: &mut W,
) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(report).context("failed to serialize report")?;

    let Some(path) = out_path else {
        writeln!(stdout, "{}", body)?;
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(path, body.as_bytes())
        .with_context(|| format!("failed to write report {}", path.to_string_lossy()))?;
    info!(
        path = %path.display(),
        students = report.summary.per_student.len(),
        assignments = report.summary.per_assignment.len(),
        "report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatfile::{parse_assignments, parse_roster, parse_submission_lines, Submissions};
    use tempfile::TempDir;

    fn sample() -> Gradebook {
        let mut subs = Submissions::default();
        parse_submission_lines("S01|Q1|50\n", Path::new("s.txt"), &mut subs)
            .expect("parse submissions");
        Gradebook {
            roster: parse_roster("S01Ann\nS02Ben\n"),
            assignments: parse_assignments("Quiz 1\nQ1\n1000\n", Path::new("a.txt"))
                .expect("parse assignments"),
            submissions: subs,
        }
    }

    #[test]
    fn report_serializes_flat_camel_case() {
        let report = build_report(&sample(), 1000);
        let v = serde_json::to_value(&report).expect("to json");
        assert!(v["generatedAt"].as_str().is_some_and(|s| s.ends_with('Z')));
        assert_eq!(v["totalPoints"], 1000);
        assert_eq!(v["perStudent"][0]["displayName"], "Ann");
        assert_eq!(v["perStudent"][0]["grade"], 50);
        assert_eq!(v["perStudent"][1]["grade"], 0);
        assert_eq!(v["perAssignment"][0]["submissionCount"], 1);
    }

    #[test]
    fn writes_report_file_creating_parents() {
        let dir = TempDir::new().expect("tempdir");
        let out = dir.path().join("reports").join("term1.json");
        let report = build_report(&sample(), 1000);
        let mut stdout = Vec::new();
        write_report(&report, Some(&out), &mut stdout).expect("write report");
        assert!(stdout.is_empty());

        let text = std::fs::read_to_string(&out).expect("read report");
        let v: serde_json::Value = serde_json::from_str(&text).expect("parse report");
        assert_eq!(v["perAssignment"][0]["assignmentId"], "Q1");
    }
}
