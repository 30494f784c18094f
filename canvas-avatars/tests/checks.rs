use canvas_avatars::checks::{check_directory, check_paths, CheckError};
use canvas_avatars_core::config::Settings;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn settings_for(root: &Path) -> Settings {
    Settings {
        working_path: root.to_path_buf(),
        images_path: "images".into(),
        csv_directory: "roster".into(),
        csv_filename: "students.csv".into(),
        domain: "school.instructure.com".into(),
        access_token: "token".into(),
        log_filename: "logs/upload.log".into(),
    }
}

fn populate(root: &Path) {
    fs::create_dir_all(root.join("images")).unwrap();
    fs::create_dir_all(root.join("roster")).unwrap();
    fs::create_dir_all(root.join("logs")).unwrap();
    fs::write(root.join("images/a.png"), b"png").unwrap();
    fs::write(root.join("roster/students.csv"), "client_id,image_filename\n").unwrap();
}

#[test]
fn test_check_paths_accepts_complete_layout() {
    let root = tempdir().unwrap();
    populate(root.path());
    check_paths(&settings_for(root.path())).expect("layout should pass");
}

#[test]
fn test_check_paths_reports_first_problem() {
    struct TestCase {
        name: &'static str,
        breakage: fn(&Path),
        expect_empty: bool,
        expected_suffix: &'static str,
    }

    let test_cases = vec![
        TestCase {
            name: "missing log directory",
            breakage: |root| fs::remove_dir_all(root.join("logs")).unwrap(),
            expect_empty: false,
            expected_suffix: "logs",
        },
        TestCase {
            name: "missing images directory",
            breakage: |root| fs::remove_dir_all(root.join("images")).unwrap(),
            expect_empty: false,
            expected_suffix: "images",
        },
        TestCase {
            name: "empty images directory",
            breakage: |root| fs::remove_file(root.join("images/a.png")).unwrap(),
            expect_empty: true,
            expected_suffix: "images",
        },
        TestCase {
            name: "missing roster file",
            breakage: |root| {
                fs::remove_file(root.join("roster/students.csv")).unwrap();
                fs::write(root.join("roster/other.csv"), "").unwrap();
            },
            expect_empty: false,
            expected_suffix: "students.csv",
        },
    ];

    for case in test_cases {
        let root = tempdir().unwrap();
        populate(root.path());
        (case.breakage)(root.path());

        let err = check_paths(&settings_for(root.path())).unwrap_err();
        let path = match (&err, case.expect_empty) {
            (CheckError::Empty(path), true) => path,
            (CheckError::Missing(path), false) => path,
            (other, _) => panic!("{}: unexpected error {other:?}", case.name),
        };
        assert!(path.ends_with(case.expected_suffix), "{}: {path:?}", case.name);
    }
}

#[test]
fn test_check_directory_rejects_file() {
    let root = tempdir().unwrap();
    let file = root.path().join("file.txt");
    fs::write(&file, "x").unwrap();
    assert!(matches!(check_directory(&file), Err(CheckError::Missing(_))));
}
