//! Unit tests for the bundle downloader.

use super::*;
use crate::archive::{ArchiveError, MockArchiveExtractor};
use crate::naming::{BitSize, Platform};
use crate::test_utils::{FixedEnvironment, create_library, write_zip};
use rstest::{fixture, rstest};
use std::io;
use std::time::SystemTime;
use tempfile::TempDir;

const LINUX_ENTRY: &str = "mongo/Linux-V3_6_5-B64.tgz";

struct Sandbox {
    _temp: TempDir,
    home: Utf8PathBuf,
    repository: Utf8PathBuf,
    downloads: Utf8PathBuf,
}

impl Sandbox {
    fn bundle(&self, version: &str, entries: &[(&str, &[u8])]) -> Utf8PathBuf {
        let jar = create_library(
            &self.repository,
            "com.github.valery1707",
            "mongo-bundle",
            version,
            ".jar",
            SystemTime::now(),
        )
        .expect("create bundle");
        write_zip(&jar, entries).expect("write bundle");
        jar
    }

    fn locator(&self) -> RepositoryLocator {
        RepositoryLocator::new(FixedEnvironment::new().with_home(self.home.as_std_path()))
    }

    fn extractor(&self) -> BundleExtractor {
        BundleExtractor::new().with_locator(self.locator())
    }

    fn config(&self) -> DownloadConfig {
        DownloadConfig {
            temp_dir: Some(self.downloads.clone()),
            ..DownloadConfig::default()
        }
    }

    fn downloaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.downloads)
            .expect("list downloads")
            .map(|entry| {
                entry
                    .expect("download entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    let home = root.join("home");
    let repository = home.join(".m2").join("repository");
    let downloads = root.join("downloads");
    fs::create_dir_all(&repository).expect("create repository");
    fs::create_dir_all(&downloads).expect("create downloads");
    Sandbox {
        _temp: temp,
        home,
        repository,
        downloads,
    }
}

fn linux() -> Distribution {
    Distribution::new(Platform::Linux, "V3_6_5", BitSize::B64, "tgz")
}

#[rstest]
fn extracts_distribution_into_prefixed_temp_file(sandbox: Sandbox) {
    sandbox.bundle(
        "3.6.5-SNAPSHOT",
        &[
            ("mongo/Windows-V3_6_5-B64.zip", b"windows"),
            (LINUX_ENTRY, b"linux archive"),
        ],
    );

    let path = sandbox
        .extractor()
        .download(&sandbox.config(), &linux())
        .expect("download");

    assert_eq!(path.parent(), Some(sandbox.downloads.as_path()));
    let name = path.file_name().expect("file name");
    assert!(name.starts_with("embedmongo-download-"), "unexpected name {name}");
    assert!(name.ends_with(".tgz"), "unexpected name {name}");
    assert_eq!(fs::read(&path).expect("read download"), b"linux archive");
}

#[rstest]
fn release_lookup_uses_exact_version(sandbox: Sandbox) {
    sandbox.bundle("3.6.5", &[(LINUX_ENTRY, b"release")]);

    let path = sandbox
        .extractor()
        .with_snapshot(false)
        .download(&sandbox.config(), &linux())
        .expect("download");

    assert_eq!(fs::read(&path).expect("read download"), b"release");
}

#[rstest]
fn release_lookup_ignores_snapshot_bundles(sandbox: Sandbox) {
    sandbox.bundle("3.6.5-SNAPSHOT", &[(LINUX_ENTRY, b"snapshot")]);

    let err = sandbox
        .extractor()
        .with_snapshot(false)
        .download(&sandbox.config(), &linux())
        .expect_err("release bundle is absent");

    match err {
        BundleError::ArtifactNotFound { coordinate } => {
            assert_eq!(coordinate.to_string(), "com.github.valery1707:mongo-bundle:3.6.5");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sandbox.downloaded_files().is_empty());
}

#[rstest]
fn missing_entry_fails_and_removes_temp_file(sandbox: Sandbox) {
    let jar = sandbox.bundle("3.6.5-SNAPSHOT", &[("mongo/OS_X-V3_6_5-B64.tgz", b"osx")]);

    let err = sandbox
        .extractor()
        .download(&sandbox.config(), &linux())
        .expect_err("entry is absent");

    assert!(
        matches!(
            err,
            BundleError::EntryNotFound { ref entry, ref archive }
                if entry == LINUX_ENTRY && *archive == jar
        ),
        "unexpected error: {err}"
    );
    assert!(sandbox.downloaded_files().is_empty());
}

#[rstest]
fn missing_entry_can_return_empty_file(sandbox: Sandbox) {
    sandbox.bundle("3.6.5-SNAPSHOT", &[("mongo/OS_X-V3_6_5-B64.tgz", b"osx")]);

    let path = sandbox
        .extractor()
        .with_missing_entry_policy(MissingEntryPolicy::KeepEmpty)
        .download(&sandbox.config(), &linux())
        .expect("download");

    assert!(fs::read(&path).expect("read download").is_empty());
}

#[rstest]
fn custom_source_changes_coordinate_and_namespace(sandbox: Sandbox) {
    let jar = create_library(
        &sandbox.repository,
        "org.example",
        "db-bundle",
        "4.0.2",
        ".zip",
        SystemTime::now(),
    )
    .expect("create bundle");
    write_zip(&jar, &[("db/Windows-V4_0_2-B64.zip", b"db")]).expect("write bundle");
    let source = BundleSource {
        group: "org.example".to_owned(),
        artifact: "db-bundle".to_owned(),
        suffix: ".zip".to_owned(),
        namespace: "db".to_owned(),
    };
    let distribution = Distribution::new(Platform::Windows, "V4_0_2", BitSize::B64, "zip");

    let path = sandbox
        .extractor()
        .with_snapshot(false)
        .with_source(source)
        .download(&sandbox.config(), &distribution)
        .expect("download");

    assert_eq!(fs::read(&path).expect("read download"), b"db");
}

#[rstest]
fn no_repository_reports_missing_artifact() {
    let downloads = tempfile::tempdir().expect("temp dir");
    let config = DownloadConfig {
        temp_dir: Some(Utf8PathBuf::try_from(downloads.path().to_path_buf()).expect("UTF-8 path")),
        ..DownloadConfig::default()
    };
    let extractor = BundleExtractor::new().with_locator(RepositoryLocator::new(FixedEnvironment::new()));

    let err = extractor.download(&config, &linux()).expect_err("no repository");

    assert!(matches!(err, BundleError::ArtifactNotFound { .. }), "unexpected error: {err}");
    assert_eq!(fs::read_dir(downloads.path()).expect("list downloads").count(), 0);
}

#[rstest]
fn extractor_receives_bundle_and_entry_name(sandbox: Sandbox) {
    let jar = sandbox.bundle("4.0.2-SNAPSHOT", &[]);
    let expected_jar = jar.clone();
    let mut extractor = MockArchiveExtractor::new();
    extractor
        .expect_extract_named_entry()
        .withf(move |archive, entry, _| {
            archive == expected_jar.as_path() && entry == "mongo/Windows-V4_0_2-B32.zip"
        })
        .times(1)
        .returning(|_, entry, destination| {
            Ok(Extraction::Extracted {
                entry: entry.to_owned(),
                destination: destination.to_owned(),
                bytes: 0,
            })
        });
    let distribution = Distribution::new(Platform::Windows, "V4_0_2", BitSize::B32, "zip");

    let path = sandbox
        .extractor()
        .with_archive_extractor(extractor)
        .download(&sandbox.config(), &distribution)
        .expect("download");

    assert!(path.as_str().ends_with(".zip"));
}

#[rstest]
fn archive_failure_removes_temp_file(sandbox: Sandbox) {
    sandbox.bundle("3.6.5-SNAPSHOT", &[]);
    let mut extractor = MockArchiveExtractor::new();
    extractor
        .expect_extract_named_entry()
        .times(1)
        .returning(|archive, _, _| {
            Err(ArchiveError::Open {
                archive: archive.to_owned(),
                source: io::Error::other("boom"),
            })
        });

    let err = sandbox
        .extractor()
        .with_archive_extractor(extractor)
        .download(&sandbox.config(), &linux())
        .expect_err("archive failure");

    assert!(matches!(err, BundleError::Archive(_)), "unexpected error: {err}");
    assert!(sandbox.downloaded_files().is_empty());
}

#[rstest]
fn download_url_is_never_offered(sandbox: Sandbox) {
    assert_eq!(sandbox.extractor().download_url(&sandbox.config(), &linux()), None);
}

#[test]
fn default_source_names_the_mongo_bundle() {
    let source = BundleSource::default();
    let coordinate = source.coordinate(&linux(), true);
    assert_eq!(coordinate.to_string(), "com.github.valery1707:mongo-bundle:3.6.5 (snapshot)");
    assert_eq!(coordinate.suffix(), ".jar");
    assert_eq!(source.entry_name(&linux()).as_str(), LINUX_ENTRY);
}
