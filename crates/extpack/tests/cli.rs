use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const SCHEMA: &str = r#"{"allowed_files": ["extension.js", "metadata.json"], "allowed_directories": ["schemas"]}"#;

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_extpack"));
    cmd.env_remove("EXTPACK_PROJECT_ROOT").env("RUST_LOG", "off");
    cmd
}

fn run(root: &Path, args: &[&str]) -> Output {
    bin()
        .arg("--project-root")
        .arg(root)
        .args(args)
        .output()
        .expect("run extpack")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp project");
    std::fs::write(dir.path().join("archive-schema.json"), SCHEMA).expect("write schema");
    std::fs::write(
        dir.path().join("metadata.json"),
        r#"{"version": 4, "uuid": "clock@example.org"}"#,
    )
    .expect("write metadata");
    dir
}

fn write_zip(path: &Path, entries: &[&str]) {
    let file = std::fs::File::create(path).expect("create zip");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for e in entries {
        if e.ends_with('/') {
            zip.add_directory(*e, options).expect("add dir");
        } else {
            zip.start_file(*e, options).expect("start file");
            zip.write_all(b"x").expect("write entry");
        }
    }
    zip.finish().expect("finish zip");
}

#[test]
fn format_prints_rewritten_files_relative_to_root() {
    let dir = project();
    let out = run(dir.path(), &["format"]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let printed = stdout(&out);
    assert!(printed.contains("rewrote archive-schema.json"), "{printed}");
    assert!(printed.contains("rewrote metadata.json"), "{printed}");

    let out = run(dir.path(), &["format"]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    assert_eq!(stdout(&out), "", "second run must not rewrite anything");
}

#[test]
fn format_check_fails_without_writing() {
    let dir = project();
    let out = run(dir.path(), &["format", "--check"]);
    assert_eq!(out.status.code(), Some(1), "stdout={}", stdout(&out));
    assert!(stdout(&out).contains("would rewrite metadata.json"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("metadata.json")).expect("read"),
        r#"{"version": 4, "uuid": "clock@example.org"}"#
    );
}

#[test]
fn format_reports_parse_errors_with_path() {
    let dir = project();
    std::fs::write(dir.path().join("broken.json"), "{").expect("write broken");
    let out = run(dir.path(), &["format"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.starts_with("extpack: failed to parse JSON source"), "{err}");
    assert!(err.contains("broken.json"), "{err}");
}

#[test]
fn validate_accepts_matching_zip() {
    let dir = project();
    let zip = dir.path().join("ext.zip");
    write_zip(&zip, &["schemas/", "extension.js", "metadata.json"]);
    let out = run(dir.path(), &["validate", "--archive", zip.to_str().expect("utf8")]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let line = stdout(&out);
    assert!(
        line.starts_with("archive matches schema: 2 files, 1 directories (sha256 "),
        "{line}"
    );
}

#[test]
fn validate_reports_every_discrepancy_and_exits_non_zero() {
    let dir = project();
    let listing = dir.path().join("listing.txt");
    std::fs::write(&listing, "extension.js\nextra.txt\nlocale/\n").expect("write listing");
    let out = run(
        dir.path(),
        &["validate", "--listing", listing.to_str().expect("utf8")],
    );
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out), "");
    let err = stderr(&out);
    assert!(err.contains("expected but absent: metadata.json"), "{err}");
    assert!(err.contains("unexpected File: extra.txt"), "{err}");
    assert!(err.contains("unexpected Directory: locale"), "{err}");
}

#[test]
fn validate_without_schema_is_fatal() {
    let dir = tempfile::tempdir().expect("temp project");
    let listing = dir.path().join("listing.txt");
    std::fs::write(&listing, "metadata.json\n").expect("write listing");
    let out = run(
        dir.path(),
        &["validate", "--listing", listing.to_str().expect("utf8")],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("archive schema not found"));
}

#[test]
fn validate_rejects_both_sources() {
    let dir = project();
    let out = run(
        dir.path(),
        &["validate", "--archive", "a.zip", "--listing", "l.txt"],
    );
    assert_eq!(out.status.code(), Some(2), "stderr={}", stderr(&out));
}

#[test]
fn version_offline_reports_not_available() {
    let dir = project();
    let out = run(dir.path(), &["version", "--offline"]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    assert_eq!(stdout(&out), "local=4 published=N/A status=unknown\n");
}

#[test]
fn check_formats_then_validates() {
    let dir = project();
    let zip = dir.path().join("ext.zip");
    write_zip(&zip, &["extension.js", "metadata.json"]);
    let out = run(
        dir.path(),
        &["check", "--offline", "--archive", zip.to_str().expect("utf8")],
    );
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let printed = stdout(&out);
    assert!(printed.contains("rewrote metadata.json"), "{printed}");
    assert!(printed.contains("local=4 published=N/A status=unknown"), "{printed}");
    assert!(printed.contains("archive matches schema: 2 files, 0 directories"), "{printed}");
}

#[test]
fn check_blocks_on_schema_mismatch() {
    let dir = project();
    let zip = dir.path().join("ext.zip");
    write_zip(&zip, &["metadata.json"]);
    let out = run(
        dir.path(),
        &["check", "--offline", "--archive", zip.to_str().expect("utf8")],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("expected but absent: extension.js"));
    assert!(!stdout(&out).contains("archive matches schema"));
}
