use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Width of the student id prefix on each roster line.
pub const STUDENT_ID_WIDTH: usize = 3;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{}:{line}: assignment record is missing lines (expected name, id, points)",
        .path.display()
    )]
    TruncatedRecord { path: PathBuf, line: usize },
    #[error("{}:{line}: bad points value: {value:?}", .path.display())]
    BadPoints {
        path: PathBuf,
        line: usize,
        value: String,
    },
    #[error("{}:{line}: expected 3 '|' separated fields, found {found}", .path.display())]
    BadFieldCount {
        path: PathBuf,
        line: usize,
        found: usize,
    },
    #[error("{}:{line}: bad percent value: {value:?}", .path.display())]
    BadPercent {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
}

/// Students in the order they first appear in the roster file.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
    by_id: HashMap<String, usize>,
}

impl Roster {
    /// A repeated id replaces the name but keeps the original position.
    pub fn insert(&mut self, id: &str, name: &str) {
        if let Some(&idx) = self.by_id.get(id) {
            self.students[idx].name = name.to_string();
            return;
        }
        self.by_id.insert(id.to_string(), self.students.len());
        self.students.push(Student {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&Student> {
        self.by_id.get(id).map(|&idx| &self.students[idx])
    }

    /// First student in roster order whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.students.iter()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub points: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentTable {
    assignments: Vec<Assignment>,
    by_id: HashMap<String, usize>,
    id_by_name: HashMap<String, String>,
}

impl AssignmentTable {
    pub fn insert(&mut self, assignment: Assignment) {
        self.id_by_name
            .insert(assignment.name.clone(), assignment.id.clone());
        if let Some(&idx) = self.by_id.get(&assignment.id) {
            self.assignments[idx] = assignment;
            return;
        }
        self.by_id
            .insert(assignment.id.clone(), self.assignments.len());
        self.assignments.push(assignment);
    }

    pub fn get(&self, id: &str) -> Option<&Assignment> {
        self.by_id.get(id).map(|&idx| &self.assignments[idx])
    }

    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.id_by_name.get(name).map(String::as_str)
    }

    /// Reverse lookup by display name, then forward lookup by the id found.
    pub fn find_by_name(&self, name: &str) -> Option<&Assignment> {
        self.id_for_name(name).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Sparse (student id, assignment id) -> fraction of full credit.
#[derive(Debug, Clone, Default)]
pub struct Submissions {
    by_student: HashMap<String, HashMap<String, f64>>,
    count: usize,
}

impl Submissions {
    pub fn insert(&mut self, student_id: &str, assignment_id: &str, fraction: f64) {
        let prev = self
            .by_student
            .entry(student_id.to_string())
            .or_default()
            .insert(assignment_id.to_string(), fraction);
        if prev.is_none() {
            self.count += 1;
        }
    }

    pub fn get(&self, student_id: &str, assignment_id: &str) -> Option<f64> {
        self.by_student
            .get(student_id)
            .and_then(|m| m.get(assignment_id))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Everything the queries read. Built once, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Gradebook {
    pub roster: Roster,
    pub assignments: AssignmentTable,
    pub submissions: Submissions,
}

pub fn load_gradebook(
    students_path: &Path,
    assignments_path: &Path,
    submissions_dir: &Path,
) -> Result<Gradebook, LoadError> {
    let roster = parse_roster_file(students_path)?;
    let assignments = parse_assignments_file(assignments_path)?;
    let submissions = parse_submissions_dir(submissions_dir)?;
    if roster.is_empty() {
        warn!(path = %students_path.display(), "roster has no students");
    }
    if assignments.is_empty() {
        warn!(path = %assignments_path.display(), "no assignments defined");
    }
    if submissions.is_empty() {
        warn!(path = %submissions_dir.display(), "no submissions found");
    }
    debug!(
        students = roster.len(),
        assignments = assignments.len(),
        submissions = submissions.len(),
        "gradebook loaded"
    );
    Ok(Gradebook {
        roster,
        assignments,
        submissions,
    })
}

pub fn parse_roster_file(path: &Path) -> Result<Roster, LoadError> {
    let text = read_text(path)?;
    Ok(parse_roster(&text))
}

/// Fixed-width lines: the first three characters are the id, the rest is the name.
/// Short or odd lines are accepted as-is.
pub fn parse_roster(text: &str) -> Roster {
    let mut roster = Roster::default();
    for raw in text.lines() {
        let t = raw.trim();
        if t.is_empty() {
            continue;
        }
        let split = t
            .char_indices()
            .nth(STUDENT_ID_WIDTH)
            .map(|(i, _)| i)
            .unwrap_or(t.len());
        let (id, rest) = t.split_at(split);
        roster.insert(id, rest.trim());
    }
    roster
}

pub fn parse_assignments_file(path: &Path) -> Result<AssignmentTable, LoadError> {
    let text = read_text(path)?;
    parse_assignments(&text, path)
}

/// Repeating 3-line records: name, id, integer points.
pub fn parse_assignments(text: &str, path: &Path) -> Result<AssignmentTable, LoadError> {
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut table = AssignmentTable::default();
    for (rec_idx, rec) in lines.chunks(3).enumerate() {
        let first_line = rec_idx * 3 + 1;
        if rec.len() < 3 {
            return Err(LoadError::TruncatedRecord {
                path: path.to_path_buf(),
                line: first_line,
            });
        }
        let points = rec[2]
            .parse::<i64>()
            .map_err(|_| LoadError::BadPoints {
                path: path.to_path_buf(),
                line: first_line + 2,
                value: rec[2].to_string(),
            })?;
        table.insert(Assignment {
            name: rec[0].to_string(),
            id: rec[1].to_string(),
            points,
        });
    }
    Ok(table)
}

/// Reads every regular file in `folder`, sorted by name so later files win on duplicates.
pub fn parse_submissions_dir(folder: &Path) -> Result<Submissions, LoadError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for ent in std::fs::read_dir(folder).map_err(|e| io_error(folder, e))? {
        let ent = ent.map_err(|e| io_error(folder, e))?;
        let p = ent.path();
        if !p.is_file() {
            debug!(path = %p.display(), "skipping non-file entry in submissions folder");
            continue;
        }
        files.push(p);
    }
    files.sort();

    let mut submissions = Submissions::default();
    for p in &files {
        let text = read_text(p)?;
        parse_submission_lines(&text, p, &mut submissions)?;
        debug!(path = %p.display(), total = submissions.len(), "read submissions file");
    }
    Ok(submissions)
}

/// `studentId|assignmentId|percent` per line; percent is stored divided by 100.
pub fn parse_submission_lines(
    text: &str,
    path: &Path,
    out: &mut Submissions,
) -> Result<(), LoadError> {
    for (idx, raw) in text.lines().enumerate() {
        let t = raw.trim();
        if t.is_empty() {
            continue;
        }
        let parts: Vec<&str> = t.split('|').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(LoadError::BadFieldCount {
                path: path.to_path_buf(),
                line: idx + 1,
                found: parts.len(),
            });
        }
        let percent = parts[2]
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| LoadError::BadPercent {
                path: path.to_path_buf(),
                line: idx + 1,
                value: parts[2].to_string(),
            })?;
        out.insert(parts[0], parts[1], percent / 100.0);
    }
    Ok(())
}
