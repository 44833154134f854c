//! Full configure/build/install runs with real git and CMake.

use anyhow::Result;

use crate::common::{TestProject, have_tool, manifest_json};

const INSTALLING_CMAKE: &str = r#"cmake_minimum_required(VERSION 3.10)
project(hello NONE)
install(FILES hello.txt DESTINATION share/hello)
"#;

fn tools_available() -> bool {
    if have_tool("git") && have_tool("cmake") {
        true
    } else {
        eprintln!("skipping: git or cmake not available");
        false
    }
}

#[test]
fn test_dependency_is_installed_into_prefix() -> Result<()> {
    if !tools_available() {
        return Ok(());
    }
    let project = TestProject::new()?;

    let hello = project.create_source_repo("hello", INSTALLING_CMAKE)?;
    hello.write_file("hello.txt", "hello\n")?;
    hello.commit_all("Add hello.txt")?;

    project.write_manifest(&manifest_json(&[("hello", &hello.url(), None)]))?;
    project
        .run_glean(&["-j", "1"])?
        .assert_success()
        .assert_stdout_contains("hello installed")
        .assert_stdout_contains("1 installed, 0 up to date, 0 failed");

    assert!(project.prefix_path().join("share").join("hello").join("hello.txt").is_file());
    let entry = project.cache_path().join("hello").join("%default");
    assert!(entry.join("glean_init.cmake").is_file());
    assert!(entry.join("build").join("debug").join("CMakeCache.txt").is_file());
    Ok(())
}

#[test]
fn test_both_build_types_get_their_own_tree() -> Result<()> {
    if !tools_available() {
        return Ok(());
    }
    let project = TestProject::new()?;

    let hello = project.create_source_repo("hello", INSTALLING_CMAKE)?;
    hello.write_file("hello.txt", "hello\n")?;
    hello.commit_all("Add hello.txt")?;

    project.write_manifest(&manifest_json(&[("hello", &hello.url(), None)]))?;
    project
        .run_glean(&["--build-type", "all"])?
        .assert_success()
        .assert_stdout_contains("debug build")
        .assert_stdout_contains("release build");

    let build = project.cache_path().join("hello").join("%default").join("build");
    assert!(build.join("debug").join("CMakeCache.txt").is_file());
    assert!(build.join("release").join("CMakeCache.txt").is_file());
    Ok(())
}

#[test]
fn test_configure_failure_is_isolated() -> Result<()> {
    if !tools_available() {
        return Ok(());
    }
    let project = TestProject::new()?;

    let good = project.create_source_repo("good", INSTALLING_CMAKE)?;
    good.write_file("hello.txt", "hello\n")?;
    good.commit_all("Add hello.txt")?;
    let bad = project.create_source_repo(
        "bad",
        "cmake_minimum_required(VERSION 3.10)\nproject(bad NONE)\nmessage(FATAL_ERROR \"boom\")\n",
    )?;

    project.write_manifest(&manifest_json(&[("bad", &bad.url(), None), ("good", &good.url(), None)]))?;
    let output = project.run_glean(&[])?;
    output
        .assert_success()
        .assert_stdout_contains("bad configure failed")
        .assert_stdout_contains("good installed");
    assert!(project.prefix_path().join("share").join("hello").join("hello.txt").is_file());

    project.run_glean(&["--strict"])?.assert_failure().assert_stderr_contains("bad");
    Ok(())
}
