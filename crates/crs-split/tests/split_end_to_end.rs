//! End-to-end splitting of a synthetic LMS archive.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crs_split::{SplitOptions, parse_tutor_entries, split_submissions};
use polars::prelude::{DataFrame, NamedFrom, Series};
use tempfile::TempDir;
use zip::ZipArchive;
use zip::write::SimpleFileOptions;

const STUDENTS: usize = 10;

fn write_fixture_archive(dir: &Path) -> PathBuf {
    let path = dir.join("Assignment 3 submissions.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    for i in 1..=STUDENTS {
        let entry = format!("Student{i:02} Tester_{:07}_assignsubmission_file_", 1_000_000 + i);
        writer
            .start_file(format!("{entry}/solution.txt"), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(format!("answer {i}").as_bytes()).unwrap();
        writer
            .start_file(format!("{entry}/code/main.rs"), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"fn main() {}").unwrap();
    }
    writer.finish().unwrap();
    path
}

fn roster() -> DataFrame {
    let first: Vec<String> = (1..=STUDENTS).map(|i| format!("Student{i:02}")).collect();
    let surname = vec!["Tester".to_string(); STUDENTS];
    let id: Vec<String> = (1..=STUDENTS).map(|i| format!("{:08}", 11_110_000 + i)).collect();
    let email: Vec<String> = (1..=STUDENTS)
        .map(|i| format!("k{:08}@students.example.org", 11_110_000 + i))
        .collect();
    DataFrame::new(vec![
        Series::new("First name".into(), first).into(),
        Series::new("Surname".into(), surname).into(),
        Series::new("ID number".into(), id).into(),
        Series::new("Email address".into(), email).into(),
    ])
    .unwrap()
}

fn archive_entries(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(|n| n.to_string()).collect()
}

#[test]
fn splits_weighted_and_rotated() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&[
        "Anna,2".to_string(),
        "Ben,3".to_string(),
        "Cara,2".to_string(),
    ])
    .unwrap();

    let mut reports = Vec::new();
    let mut on_progress = |pct: u8| reports.push(pct);
    let outcome = split_submissions(
        &archive,
        &tutors,
        Some(&roster()),
        &SplitOptions::default(),
        Some(&mut on_progress),
    )
    .unwrap();

    // Exercise number 3 read off the archive name rotates the tutor list by
    // three, which for three tutors is the original order.
    assert_eq!(outcome.exercise_number, 3);
    let names: Vec<String> = outcome
        .archives
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "Assignment 3 submissions_Anna.zip",
            "Assignment 3 submissions_Ben.zip",
            "Assignment 3 submissions_Cara.zip",
        ]
    );

    // 10 submissions at weights 2:3:2 come out as 3, 5 and 2, two files each.
    let counts: Vec<usize> = outcome.archives.iter().map(|p| archive_entries(p).len()).collect();
    assert_eq!(counts, vec![6, 10, 4]);

    // Entries live under the renamed First_Surname_ID folder.
    let first_entries = archive_entries(&outcome.archives[0]);
    assert!(
        first_entries
            .iter()
            .any(|n| n == "Student01_Tester_11110001/solution.txt"),
        "unexpected entries: {first_entries:?}"
    );
    assert!(first_entries.iter().any(|n| n.ends_with("/code/main.rs")));

    // One progress report per submission, ending at 100 percent.
    assert_eq!(reports.len(), STUDENTS);
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(reports.last(), Some(&100));
}

#[test]
fn result_table_places_entry_name_before_renamed_name() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string(), "Ben".to_string()]).unwrap();

    let outcome =
        split_submissions(&archive, &tutors, Some(&roster()), &SplitOptions::default(), None)
            .unwrap();

    assert_eq!(outcome.table.height(), STUDENTS);
    let columns = outcome.table.get_column_names_str();
    assert!(!columns.contains(&"full_name"));
    assert!(!columns.contains(&"moodle_id"));
    let width = columns.len();
    assert_eq!(columns[width - 2], "Submission file");
    assert_eq!(columns[width - 1], "New submission file");
    assert!(columns.contains(&"Tutor name"));
    assert!(columns.contains(&"Tutor weight"));
    assert!(columns.contains(&"Tutor file"));
}

#[test]
fn split_without_roster_keeps_entry_names() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();
    // No roster means no renaming keys; entries keep their original folders.
    let options = SplitOptions {
        renaming_keys: vec![],
        sorting_keys: vec![],
        ..SplitOptions::default()
    };

    let outcome = split_submissions(&archive, &tutors, None, &options, None).unwrap();

    assert_eq!(outcome.archives.len(), 1);
    let entries = archive_entries(&outcome.archives[0]);
    assert_eq!(entries.len(), 2 * STUDENTS);
    assert!(
        entries
            .iter()
            .any(|n| n == "Student01 Tester_1000001_assignsubmission_file_/solution.txt"),
        "unexpected entries: {entries:?}"
    );
    assert_eq!(outcome.table.height(), STUDENTS);
}

#[test]
fn submission_missing_from_roster_is_fatal() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();
    let partial = roster().slice(0, STUDENTS - 1);

    let err = split_submissions(&archive, &tutors, Some(&partial), &SplitOptions::default(), None)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("not part of the roster"), "{message}");
    assert!(message.contains("Student10"), "{message}");
}

#[test]
fn duplicate_roster_names_are_fatal() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();
    let mut duplicated = roster();
    let mut twin = roster().slice(0, 1);
    twin.replace(
        "ID number",
        Series::new("ID number".into(), vec!["99999999".to_string()]),
    )
    .unwrap();
    duplicated.vstack_mut(&twin).unwrap();

    let err = split_submissions(
        &archive,
        &tutors,
        Some(&duplicated),
        &SplitOptions::default(),
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("duplicate names"), "{err}");
}

#[test]
fn duplicate_names_without_submissions_do_not_mask_missing_ones() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();

    // Nine of the ten students plus a pair of extra roster rows sharing a
    // full name. The duplicates never submitted, so the short join must be
    // blamed on the missing submission, not on them.
    let mut partial = roster().slice(0, STUDENTS - 1);
    for id in ["88888888", "99999999"] {
        let extra = DataFrame::new(vec![
            Series::new("First name".into(), vec!["Dup".to_string()]).into(),
            Series::new("Surname".into(), vec!["Person".to_string()]).into(),
            Series::new("ID number".into(), vec![id.to_string()]).into(),
            Series::new(
                "Email address".into(),
                vec![format!("k{id}@students.example.org")],
            )
            .into(),
        ])
        .unwrap();
        partial.vstack_mut(&extra).unwrap();
    }

    let err = split_submissions(&archive, &tutors, Some(&partial), &SplitOptions::default(), None)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("not part of the roster"), "{message}");
    assert!(message.contains("Student10"), "{message}");
    assert!(!message.contains("duplicate names"), "{message}");
}

#[test]
fn scratch_directory_is_removed_after_split() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();
    let scratch_parent = TempDir::new().unwrap();
    let options = SplitOptions {
        scratch_dir: Some(scratch_parent.path().to_path_buf()),
        ..SplitOptions::default()
    };

    split_submissions(&archive, &tutors, Some(&roster()), &options, None).unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(scratch_parent.path())
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "leftover scratch: {leftovers:?}");

    // Failure after extraction must not leave extracted files behind either.
    let partial = roster().slice(0, STUDENTS - 1);
    split_submissions(&archive, &tutors, Some(&partial), &options, None).unwrap_err();
    let leftovers: Vec<_> = std::fs::read_dir(scratch_parent.path())
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "leftover scratch: {leftovers:?}");
}

#[test]
fn absent_renaming_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();
    let options = SplitOptions {
        renaming_keys: vec!["Matriculation".to_string()],
        ..SplitOptions::default()
    };

    let err = split_submissions(&archive, &tutors, Some(&roster()), &options, None).unwrap_err();
    assert!(err.to_string().contains("Matriculation"), "{err}");
    // No tutor archive may exist once the renaming keys fail to resolve.
    assert!(
        !dir.path().join("Assignment 3 submissions_Anna.zip").exists()
    );
}

#[test]
fn unknown_exercise_number_is_fatal() {
    let dir = TempDir::new().unwrap();
    let archive = write_fixture_archive(dir.path());
    let renamed = dir.path().join("final grades.zip");
    std::fs::rename(&archive, &renamed).unwrap();
    let tutors = parse_tutor_entries(&["Anna".to_string()]).unwrap();

    let err = split_submissions(&renamed, &tutors, None, &SplitOptions::default(), None)
        .unwrap_err();
    assert!(err.to_string().contains("exercise number"), "{err}");

    // An explicit number sidesteps the inference.
    let options = SplitOptions {
        exercise_number: Some(5),
        renaming_keys: vec![],
        sorting_keys: vec![],
        ..SplitOptions::default()
    };
    let outcome = split_submissions(&renamed, &tutors, None, &options, None).unwrap();
    assert_eq!(outcome.exercise_number, 5);
}
