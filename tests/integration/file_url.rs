//! Real git clones from `file://` repositories.
//!
//! These run in export mode so only git is required.

use anyhow::Result;

use crate::common::{TestProject, have_tool, manifest_json};

const TRIVIAL_CMAKE: &str = "cmake_minimum_required(VERSION 3.10)\nproject(fixture NONE)\n";

#[test]
fn test_nested_manifest_is_discovered_from_clone() -> Result<()> {
    if !have_tool("git") {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let project = TestProject::new()?;

    let zlib = project.create_source_repo("zlib", TRIVIAL_CMAKE)?;
    let png = project.create_source_repo("png", TRIVIAL_CMAKE)?;
    png.write_file("glean.json", &manifest_json(&[("zlib", &zlib.url(), None)]))?;
    png.commit_all("Add glean.json")?;

    project.write_manifest(&manifest_json(&[("png", &png.url(), None)]))?;
    project.run_glean(&["--export-file", "deps.cmake"])?.assert_success();

    let exported = std::fs::read_to_string(project.project_path().join("deps.cmake"))?;
    let zlib_at = exported.find("ExternalProject_Add(zlib").expect("zlib exported");
    let png_at = exported.find("ExternalProject_Add(png").expect("png exported");
    assert!(zlib_at < png_at);
    assert!(exported.contains("DEPENDS zlib"));
    assert!(exported.contains("-DGLEAN_INSTALL_ROOT="));

    let png_src = project.cache_path().join("png").join("%default").join("src");
    assert!(png_src.join("glean.json").is_file());
    assert!(project.cache_path().join("zlib").join("%default").join("src").join("CMakeLists.txt").is_file());
    Ok(())
}

#[test]
fn test_pinned_tag_is_checked_out() -> Result<()> {
    if !have_tool("git") {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let project = TestProject::new()?;

    let lib = project.create_source_repo("lib", TRIVIAL_CMAKE)?;
    lib.write_file("VERSION", "1\n")?;
    lib.commit_all("Version 1")?;
    lib.tag("v1")?;
    lib.write_file("VERSION", "2\n")?;
    lib.commit_all("Version 2")?;

    project.write_manifest(&manifest_json(&[("lib", &lib.url(), Some("v1"))]))?;
    project.run_glean(&["--output", "cmake"])?.assert_success().assert_stdout_contains(r#"GIT_TAG "v1""#);

    let version = std::fs::read_to_string(project.cache_path().join("lib").join("v1").join("src").join("VERSION"))?;
    assert_eq!(version.trim(), "1");
    Ok(())
}

#[test]
fn test_second_run_reuses_cached_clone() -> Result<()> {
    if !have_tool("git") {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let project = TestProject::new()?;

    let lib = project.create_source_repo("lib", TRIVIAL_CMAKE)?;
    project.write_manifest(&manifest_json(&[("lib", &lib.url(), None)]))?;
    project.run_glean(&["--output", "cmake"])?.assert_success();

    lib.write_file("NEWS", "fresh\n")?;
    lib.commit_all("Add news")?;
    project.run_glean(&["--output", "cmake"])?.assert_success();

    let news = project.cache_path().join("lib").join("%default").join("src").join("NEWS");
    assert!(news.is_file(), "pull should have brought in the new commit");
    Ok(())
}

#[test]
fn test_cycle_between_repositories_fails() -> Result<()> {
    if !have_tool("git") {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let project = TestProject::new()?;

    let a = project.create_source_repo("a", TRIVIAL_CMAKE)?;
    let b = project.create_source_repo("b", TRIVIAL_CMAKE)?;
    a.write_file("glean.json", &manifest_json(&[("b", &b.url(), None)]))?;
    a.commit_all("a depends on b")?;
    b.write_file("glean.json", &manifest_json(&[("a", &a.url(), None)]))?;
    b.commit_all("b depends on a")?;

    project.write_manifest(&manifest_json(&[("a", &a.url(), None)]))?;
    let output = project.run_glean(&[])?;
    output.assert_failure().assert_stderr_contains("Circular dependency detected");
    assert!(!project.cache_path().join("a").join("%default").join("build").join("debug").exists());
    Ok(())
}

#[test]
fn test_unreachable_remote_is_a_node_failure() -> Result<()> {
    if !have_tool("git") {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let project = TestProject::new()?;
    let missing = project.home_path().join("no-such-repo");
    let url = format!("file://{}", missing.display());
    project.write_manifest(&manifest_json(&[("ghost", &url, None)]))?;

    project
        .run_glean(&[])?
        .assert_success()
        .assert_stdout_contains("ghost")
        .assert_stdout_contains("clone failed");

    project.run_glean(&["--strict"])?.assert_failure().assert_stderr_contains("failed to build");
    Ok(())
}
