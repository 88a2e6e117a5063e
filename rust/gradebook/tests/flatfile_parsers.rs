#[path = "../src/flatfile.rs"]
mod flatfile;

use std::path::PathBuf;

fn fixture_path(rel: &str) -> PathBuf {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    base.join("../../").join(rel)
}

#[test]
fn parse_sample_roster() {
    let p = fixture_path("fixtures/gradebook/sample/students.txt");
    let roster = flatfile::parse_roster_file(&p).expect("parse roster");
    assert_eq!(roster.len(), 4);
    let ids: Vec<&str> = roster.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["S01", "S02", "S03", "S04"]);
    assert_eq!(
        roster.find_by_name("Carol White").map(|s| s.id.as_str()),
        Some("S03")
    );
}

#[test]
fn parse_sample_assignments() {
    let p = fixture_path("fixtures/gradebook/sample/assignments.txt");
    let table = flatfile::parse_assignments_file(&p).expect("parse assignments");
    assert_eq!(table.len(), 5);
    let total: i64 = table.iter().map(|a| a.points).sum();
    assert_eq!(total, 1000);
    assert_eq!(table.id_for_name("Final Exam"), Some("FIN"));
    assert_eq!(table.get("RL").map(|a| a.points), Some(0));
}

#[test]
fn parse_sample_submissions_later_file_wins() {
    let p = fixture_path("fixtures/gradebook/sample/submissions");
    let subs = flatfile::parse_submissions_dir(&p).expect("parse submissions");
    // 11 lines, one duplicate key across files.
    assert_eq!(subs.len(), 10);
    assert_eq!(subs.get("S03", "Q1"), Some(0.3));
    assert_eq!(subs.get("S01", "PRJ"), Some(0.9));
    assert_eq!(subs.get("S04", "Q1"), None);
}

#[test]
fn load_sample_gradebook() {
    let dir = fixture_path("fixtures/gradebook/sample");
    let book = flatfile::load_gradebook(
        &dir.join("students.txt"),
        &dir.join("assignments.txt"),
        &dir.join("submissions"),
    )
    .expect("load gradebook");
    assert_eq!(book.roster.len(), 4);
    assert_eq!(book.assignments.len(), 5);
    assert_eq!(book.submissions.get("S9X", "Q1"), Some(1.0));
}

#[test]
fn submissions_folder_skips_subdirectories() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    std::fs::create_dir(dir.path().join("archive")).expect("mkdir");
    std::fs::write(dir.path().join("archive").join("old.txt"), "not|a|number\n")
        .expect("write archived");
    std::fs::write(dir.path().join("b.txt"), "S01|Q1|20\n").expect("write b");
    std::fs::write(dir.path().join("a.txt"), "S01|Q1|10\nS02|Q1|70\n").expect("write a");

    let subs = flatfile::parse_submissions_dir(dir.path()).expect("parse submissions");
    assert_eq!(subs.len(), 2);
    assert_eq!(subs.get("S01", "Q1"), Some(0.2));
}

#[test]
fn missing_submissions_folder_is_io_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let err = flatfile::parse_submissions_dir(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, flatfile::LoadError::Io { .. }));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn bad_percent_names_file_and_line() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("day1.txt"), "S01|Q1|10\n\nS02|Q1|ten\n").expect("write");
    let err = flatfile::parse_submissions_dir(dir.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("day1.txt:3"), "unexpected message: {}", msg);
    assert!(msg.contains("\"ten\""), "unexpected message: {}", msg);
}
