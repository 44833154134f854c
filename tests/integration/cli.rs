use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_version_flag() {
    Command::cargo_bin("glean")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("glean "));
}

#[test]
fn test_unknown_output_kind_is_usage_error() {
    Command::cargo_bin("glean")
        .unwrap()
        .args(["--output", "ninja"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'ninja'"));
}

#[test]
fn test_help_lists_flags() -> Result<()> {
    let project = TestProject::new()?;
    let output = project.run_glean(&["--help"])?;
    output
        .assert_success()
        .assert_stdout_contains("--build-type")
        .assert_stdout_contains("--output")
        .assert_stdout_contains("--strict");
    Ok(())
}

#[test]
fn test_missing_manifest_fails() -> Result<()> {
    let project = TestProject::new()?;
    let output = project.run_glean(&[])?;
    output.assert_failure().assert_stderr_contains("Manifest file not found");
    assert_eq!(output.code, Some(1));
    Ok(())
}

#[test]
fn test_malformed_manifest_fails() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": [ {"project_name": "a" "#)?;
    project.run_glean(&[])?.assert_failure().assert_stderr_contains("Invalid manifest");
    Ok(())
}

#[test]
fn test_cache_root_that_is_a_file_fails() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;
    std::fs::write(project.cache_path(), "occupied")?;

    project
        .run_glean(&[])?
        .assert_failure()
        .assert_stderr_contains("is not a directory")
        .assert_stderr_contains("GLEAN_CACHE_DIR");
    Ok(())
}

#[test]
fn test_cache_root_is_created() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;
    assert!(!project.cache_path().exists());

    project.run_glean(&[])?.assert_success();
    assert!(project.cache_path().is_dir());
    Ok(())
}

#[test]
fn test_empty_manifest_prints_empty_summary() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;

    project
        .run_glean(&["--build-type", "all"])?
        .assert_success()
        .assert_stdout_contains("debug build")
        .assert_stdout_contains("release build")
        .assert_stdout_contains("0 installed, 0 up to date, 0 failed");
    Ok(())
}

#[test]
fn test_invalid_option_file_fails() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;
    project.write_options(
        r#"{"values": [{"dep_name": "a", "opt_name": "make_flags", "opt_value": []}]}"#,
    )?;

    project.run_glean(&[])?.assert_failure().assert_stderr_contains("cmake_args");
    Ok(())
}

#[test]
fn test_invalid_config_file_fails() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;
    let config = project.home_path().join(".glean").join("config.toml");
    std::fs::create_dir_all(config.parent().unwrap())?;
    std::fs::write(&config, "jobs = \"many\"\n")?;

    project.run_glean(&[])?.assert_failure().assert_stderr_contains("Configuration error");
    Ok(())
}

#[test]
fn test_export_of_empty_graph_goes_to_stdout() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;

    let output = project.run_glean(&["--output", "cmake"])?;
    output.assert_success().assert_stdout_contains("include(ExternalProject)");
    assert!(!output.stdout.contains("ExternalProject_Add"));
    Ok(())
}

#[test]
fn test_export_file_is_written() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(r#"{"dependencies": []}"#)?;

    let output = project.run_glean(&["--export-file", "deps.cmake"])?;
    output.assert_success();
    assert!(!output.stdout.contains("include(ExternalProject)"));

    let written = std::fs::read_to_string(project.project_path().join("deps.cmake"))?;
    assert!(written.contains("include(ExternalProject)"));
    Ok(())
}

#[test]
fn test_verbose_and_quiet_conflict() -> Result<()> {
    let project = TestProject::new()?;
    project.run_glean(&["-v", "-q"])?.assert_failure();
    Ok(())
}
