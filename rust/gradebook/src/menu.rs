use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::commands::{self, QueryOptions};
use crate::flatfile::Gradebook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    StudentGrade,
    AssignmentStats,
    AssignmentGraph,
}

impl Selection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Selection::StudentGrade),
            "2" => Some(Selection::AssignmentStats),
            "3" => Some(Selection::AssignmentGraph),
            _ => None,
        }
    }

    fn name_prompt(self) -> &'static str {
        match self {
            Selection::StudentGrade => "What is the student's name: ",
            Selection::AssignmentStats | Selection::AssignmentGraph => {
                "What is the assignment name: "
            }
        }
    }
}

/// Writes `text` without a newline and reads one line back, minus its terminator.
/// Returns `None` at end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    text: &str,
) -> io::Result<Option<String>> {
    write!(out, "{}", text)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(
        line.trim_end_matches(|c| c == '\n' || c == '\r').to_string(),
    ))
}

/// One menu session: pick a query, give a name, print the result.
pub fn run_menu<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    book: &Gradebook,
    opts: QueryOptions,
) -> anyhow::Result<()> {
    writeln!(out, "1. Student grade")?;
    writeln!(out, "2. Assignment statistics")?;
    writeln!(out, "3. Assignment graph")?;

    let Some(raw) = prompt(input, out, "\nEnter your selection: ")? else {
        return Ok(());
    };
    let Some(selection) = Selection::parse(&raw) else {
        debug!(selection = %raw, "unrecognised menu selection");
        return Ok(());
    };
    let Some(name) = prompt(input, out, selection.name_prompt())? else {
        return Ok(());
    };
    debug!(?selection, name = %name, "menu query");

    match selection {
        Selection::StudentGrade => commands::print_student_grade(out, book, &name, opts),
        Selection::AssignmentStats => commands::print_assignment_stats(out, book, &name, opts),
        Selection::AssignmentGraph => commands::print_assignment_histogram(out, book, &name, opts),
    }
}
