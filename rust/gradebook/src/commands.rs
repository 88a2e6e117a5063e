use std::io::Write;

use serde::Serialize;
use serde_json::json;

use crate::calc::{self, QueryError};
use crate::chart;
use crate::flatfile::Gradebook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub total_points: u32,
    pub format: OutputFormat,
}

fn error_json(e: &QueryError) -> serde_json::Value {
    json!({
        "error": {
            "code": e.code(),
            "message": e.to_string(),
        }
    })
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Query outcomes such as "not found" are printed, not returned as errors.
fn write_outcome<W, T, F>(
    out: &mut W,
    format: OutputFormat,
    result: Result<T, QueryError>,
    render_text: F,
) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match (format, result) {
        (OutputFormat::Text, Ok(v)) => write!(out, "{}", render_text(&v))?,
        (OutputFormat::Text, Err(e)) => writeln!(out, "{}", e)?,
        (OutputFormat::Json, Ok(v)) => write_json(out, &v)?,
        (OutputFormat::Json, Err(e)) => write_json(out, &error_json(&e))?,
    }
    out.flush()?;
    Ok(())
}

pub fn print_student_grade<W: Write>(
    out: &mut W,
    book: &Gradebook,
    student_name: &str,
    opts: QueryOptions,
) -> anyhow::Result<()> {
    let result = calc::student_grade(book, student_name, opts.total_points);
    write_outcome(out, opts.format, result, |g| format!("{}%\n", g.grade))
}

pub fn print_assignment_stats<W: Write>(
    out: &mut W,
    book: &Gradebook,
    assignment_name: &str,
    opts: QueryOptions,
) -> anyhow::Result<()> {
    let result = calc::assignment_stats(book, assignment_name);
    write_outcome(out, opts.format, result, |s| {
        format!("Min: {}%\nAvg: {}%\nMax: {}%\n", s.min, s.avg, s.max)
    })
}

pub fn print_assignment_histogram<W: Write>(
    out: &mut W,
    book: &Gradebook,
    assignment_name: &str,
    opts: QueryOptions,
) -> anyhow::Result<()> {
    let result = calc::assignment_histogram(book, assignment_name);
    write_outcome(out, opts.format, result, chart::render_histogram)
}
