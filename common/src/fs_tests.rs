//! Unit tests for the filesystem helpers.

use super::*;
use rstest::{fixture, rstest};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

struct Root {
    _temp: TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn root() -> Root {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    Root { _temp: temp, path }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(unix)]
fn set_mode(path: &Utf8Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("set permissions");
}

#[rstest]
fn readable_file_is_false_for_missing_path(root: Root) {
    assert!(!is_readable_file(&root.path.join("file.ext")));
}

#[rstest]
fn readable_file_is_false_for_directory(root: Root) {
    assert!(!is_readable_file(&root.path));
}

#[rstest]
fn readable_file_is_true_for_plain_file(root: Root) {
    let file = root.path.join("file.ext");
    fs::write(&file, b"").expect("write file");
    assert!(is_readable_file(&file));
}

#[cfg(unix)]
#[rstest]
fn readable_file_is_false_without_read_permission(root: Root) {
    if running_as_root() {
        return;
    }
    let file = root.path.join("file.ext");
    fs::write(&file, b"").expect("write file");
    set_mode(&file, 0o020);
    assert!(!is_readable_file(&file));
}

#[rstest]
fn readable_dir_is_false_for_missing_path(root: Root) {
    assert!(!is_readable_dir(&root.path.join("test")));
}

#[rstest]
fn readable_dir_is_false_for_file(root: Root) {
    let file = root.path.join("test");
    fs::write(&file, b"").expect("write file");
    assert!(!is_readable_dir(&file));
}

#[rstest]
fn readable_dir_is_true_for_directory(root: Root) {
    let dir = root.path.join("test");
    fs::create_dir(&dir).expect("create dir");
    assert!(is_readable_dir(&dir));
}

#[cfg(unix)]
#[rstest]
fn readable_dir_is_false_without_read_permission(root: Root) {
    if running_as_root() {
        return;
    }
    let dir = root.path.join("test");
    fs::create_dir(&dir).expect("create dir");
    set_mode(&dir, 0o020);
    let readable = is_readable_dir(&dir);
    set_mode(&dir, 0o755);
    assert!(!readable);
}

#[rstest]
fn list_dir_fails_for_file(root: Root) {
    let file = root.path.join("file.ext");
    fs::write(&file, b"").expect("write file");

    let err = list_dir(&file, &[]).expect_err("listing a file should fail");
    assert!(
        matches!(err, FsError::List { ref path, .. } if *path == file),
        "unexpected error: {err}"
    );
}

#[rstest]
fn list_dir_of_empty_directory_is_empty(root: Root) {
    let listed = list_dir(&root.path, &[]).expect("list");
    assert!(listed.is_empty());
}

#[rstest]
fn list_dir_applies_filter(root: Root) {
    fs::write(root.path.join("file.ext"), b"").expect("write file");

    let listed = list_dir(&root.path, &[&|path: &Utf8Path| {
        path.extension() == Some("txt")
    }])
    .expect("list");
    assert!(listed.is_empty());
}

#[rstest]
fn list_dir_requires_every_filter(root: Root) {
    for name in ["lib-1.0.0-a.jar", "lib-1.0.0-a.pom", "other-1.0.0.jar"] {
        fs::write(root.path.join(name), b"").expect("write file");
    }

    let listed = list_dir(
        &root.path,
        &[
            &|path: &Utf8Path| file_name_of(path).starts_with("lib-"),
            &|path: &Utf8Path| file_name_of(path).ends_with(".jar"),
        ],
    )
    .expect("list");
    assert_eq!(listed, vec![root.path.join("lib-1.0.0-a.jar")]);
}

#[rstest]
fn list_dir_returns_sorted_children(root: Root) {
    for name in ["dir2", "dir1", "dir3"] {
        fs::create_dir(root.path.join(name)).expect("create dir");
    }

    let listed = list_dir(&root.path, &[]).expect("list");
    let names: Vec<&str> = listed.iter().map(|path| file_name_of(path)).collect();
    assert_eq!(names, ["dir1", "dir2", "dir3"]);
}

#[rstest]
fn last_modified_reports_missing_path(root: Root) {
    let missing = root.path.join("missing");
    let err = last_modified(&missing).expect_err("missing path should fail");
    assert!(
        matches!(err, FsError::Metadata { ref path, .. } if *path == missing),
        "unexpected error: {err}"
    );
}

#[rstest]
fn last_modified_reads_file_time(root: Root) {
    let file = root.path.join("file.ext");
    let handle = File::create(&file).expect("create file");
    let stamp = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    handle.set_modified(stamp).expect("set mtime");
    drop(handle);

    assert_eq!(last_modified(&file).expect("mtime"), stamp);
}

#[rstest]
#[case::nested("a/b/c.jar", "c.jar")]
#[case::bare("c.jar", "c.jar")]
#[case::root("/", "")]
fn file_name_of_returns_last_component(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(file_name_of(Utf8Path::new(raw)), expected);
}
