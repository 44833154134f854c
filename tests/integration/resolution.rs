//! Discovery plus orchestration through the library API, with every tool
//! call answered by [`ScriptedRunner`].

use anyhow::Result;
use std::path::Path;

use glean::action::Step;
use glean::cache::CacheEntry;
use glean::core::{BuildContext, GleanError, UpdatePolicy};
use glean::manifest::{DependencyOptions, DependencySpec};
use glean::orchestrator::{NodeStatus, Orchestrator, RunMode};
use glean::resolver::Resolver;
use glean::test_utils::{ScriptedRunner, manifest_json};

struct Workspace {
    _temp: tempfile::TempDir,
    context: BuildContext,
    manifest_path: std::path::PathBuf,
}

impl Workspace {
    fn new(root_manifest: &str) -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let context = BuildContext::new(temp.path().join("prefix"), temp.path().join("cache"));
        std::fs::create_dir_all(&context.cache_root)?;
        let manifest_path = temp.path().join("glean.json");
        std::fs::write(&manifest_path, root_manifest)?;
        Ok(Self {
            _temp: temp,
            context,
            manifest_path,
        })
    }
}

fn steps_without_checkout(runner: &ScriptedRunner, project: &str) -> Vec<Step> {
    runner.steps_for(project).into_iter().filter(|s| *s != Step::Checkout).collect()
}

#[tokio::test]
async fn test_two_independent_dependencies_end_to_end() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("A", "u1", Some("v1")), ("B", "u2", None)]))?;
    let runner = ScriptedRunner::new();
    let options = DependencyOptions::default();

    let mut graph = Resolver::new(&ws.context, &options, &runner).resolve(&ws.manifest_path).await?;
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 0);

    let report = Orchestrator::new(&ws.context, &runner).run(&mut graph, &RunMode::Process).await?;

    let expected = vec![Step::Clone, Step::Configure, Step::Build, Step::Install];
    assert_eq!(steps_without_checkout(&runner, "A"), expected);
    assert_eq!(runner.steps_for("B"), expected);
    assert_eq!(runner.count_step("A", Step::Checkout), 1);

    assert!(report.is_success());
    assert_eq!(report.passes.len(), 1);
    assert_eq!(report.passes[0].installed(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_ref_skips_checkout_and_uses_master() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("zlib", "https://example.com/zlib.git", None)]))?;
    let runner = ScriptedRunner::new();
    let options = DependencyOptions::default();

    let mut graph = Resolver::new(&ws.context, &options, &runner).resolve(&ws.manifest_path).await?;
    Orchestrator::new(&ws.context, &runner).process(&mut graph).await?;

    assert_eq!(runner.count_step("zlib", Step::Checkout), 0);

    let entry = CacheEntry::layout_for(
        &DependencySpec::new("zlib", "https://example.com/zlib.git"),
        &ws.context.cache_root,
    );
    let descriptor = std::fs::read_to_string(&entry.descriptor_file)?;
    assert!(descriptor.contains(r#"set(GLEAN_GIT_TAG "master""#));
    Ok(())
}

#[tokio::test]
async fn test_nested_manifests_build_children_first() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("app", "u/app", None)]))?;
    let runner = ScriptedRunner::new()
        .plant_manifest("app", manifest_json(&[("png", "u/png", None), ("fmt", "u/fmt", Some("10.2.1"))]))
        .plant_manifest("png", manifest_json(&[("zlib", "u/zlib", None)]));
    let options = DependencyOptions::default();

    let mut graph = Resolver::new(&ws.context, &options, &runner).resolve(&ws.manifest_path).await?;
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.get_direct_deps("app"), vec!["png".to_string(), "fmt".to_string()]);

    let report = Orchestrator::new(&ws.context, &runner).process(&mut graph).await?;
    let order: Vec<&str> =
        report.passes[0].outcomes.iter().map(|o| o.project_name.as_str()).collect();
    let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert!(pos("zlib") < pos("png"));
    assert!(pos("png") < pos("app"));
    assert!(pos("fmt") < pos("app"));

    // Nodes shipping a glean.json get GLEAN_INSTALL_ROOT on configure
    let app_configure = runner
        .invocations()
        .into_iter()
        .find(|i| i.project == "app" && i.step == Step::Configure)
        .unwrap();
    assert!(app_configure.args.iter().any(|a| a.starts_with("-DGLEAN_INSTALL_ROOT=")));
    let zlib_configure = runner
        .invocations()
        .into_iter()
        .find(|i| i.project == "zlib" && i.step == Step::Configure)
        .unwrap();
    assert!(!zlib_configure.args.iter().any(|a| a.starts_with("-DGLEAN_INSTALL_ROOT=")));
    Ok(())
}

#[tokio::test]
async fn test_cycle_aborts_before_any_cmake() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("a", "u/a", None)]))?;
    let runner = ScriptedRunner::new()
        .plant_manifest("a", manifest_json(&[("b", "u/b", None)]))
        .plant_manifest("b", manifest_json(&[("c", "u/c", None)]))
        .plant_manifest("c", manifest_json(&[("a", "u/a", None)]));
    let options = DependencyOptions::default();

    let err = Resolver::new(&ws.context, &options, &runner)
        .resolve(&ws.manifest_path)
        .await
        .unwrap_err();

    match err.downcast_ref::<GleanError>() {
        Some(GleanError::CyclicDependency {
            projects,
            ..
        }) => {
            let mut projects = projects.clone();
            projects.sort();
            assert_eq!(projects, vec!["a", "b", "c"]);
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
    assert!(!runner.ran_cmake());
    Ok(())
}

#[tokio::test]
async fn test_option_overrides_reach_configure() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("fmt", "u/fmt", None), ("zlib", "u/zlib", None)]))?;
    let mut context = ws.context.clone();
    context.default_cmake_args = vec!["-DBUILD_TESTING=OFF".to_string()];

    let options_path = ws.manifest_path.with_file_name("glean_options.json");
    std::fs::write(
        &options_path,
        r#"{"values": [{"dep_name": "fmt", "opt_name": "cmake_args", "opt_value": ["-DFMT_DOC=OFF"], "merge_type": "replace"}]}"#,
    )?;
    let options = DependencyOptions::load(&options_path)?;
    let runner = ScriptedRunner::new();

    let mut graph = Resolver::new(&context, &options, &runner).resolve(&ws.manifest_path).await?;
    Orchestrator::new(&context, &runner).process(&mut graph).await?;

    let configure_args = |project: &str| {
        runner
            .invocations()
            .into_iter()
            .find(|i| i.project == project && i.step == Step::Configure)
            .map(|i| i.args)
            .unwrap()
    };
    let fmt = configure_args("fmt");
    assert!(fmt.contains(&"-DFMT_DOC=OFF".to_string()));
    assert!(!fmt.contains(&"-DBUILD_TESTING=OFF".to_string()));
    let zlib = configure_args("zlib");
    assert!(zlib.contains(&"-DBUILD_TESTING=OFF".to_string()));
    assert!(!zlib.contains(&"-DFMT_DOC=OFF".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_stamp_policy_skips_unchanged_pinned_nodes() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("pinned", "u/p", Some("v1")), ("floating", "u/f", None)]))?;
    let mut context = ws.context.clone();
    context.update_policy = UpdatePolicy::Stamp;
    let runner = ScriptedRunner::new();
    let options = DependencyOptions::default();

    for _ in 0..2 {
        let mut graph = Resolver::new(&context, &options, &runner).resolve(&ws.manifest_path).await?;
        Orchestrator::new(&context, &runner).process(&mut graph).await?;
    }

    assert_eq!(runner.count_step("pinned", Step::Configure), 1);
    assert_eq!(runner.count_step("floating", Step::Configure), 2);
    assert_eq!(runner.count_step("pinned", Step::Clone), 1);
    assert_eq!(runner.count_step("pinned", Step::Pull), 1);

    // A changed option set invalidates the stamp
    context.default_cmake_args = vec!["-DNEW=ON".to_string()];
    let mut graph = Resolver::new(&context, &options, &runner).resolve(&ws.manifest_path).await?;
    let report = Orchestrator::new(&context, &runner).process(&mut graph).await?;
    assert_eq!(runner.count_step("pinned", Step::Configure), 2);
    assert!(report.passes[0].outcomes.iter().all(|o| o.status == NodeStatus::Installed));
    Ok(())
}

#[tokio::test]
async fn test_stamp_policy_rebuilds_branch_that_moved() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("tracking", "u/t", Some("main")), ("tagged", "u/g", Some("v1"))]))?;
    let mut context = ws.context.clone();
    context.update_policy = UpdatePolicy::Stamp;
    let runner = ScriptedRunner::new().advance_on_pull("tracking");
    let options = DependencyOptions::default();

    for _ in 0..3 {
        let mut graph = Resolver::new(&context, &options, &runner).resolve(&ws.manifest_path).await?;
        Orchestrator::new(&context, &runner).process(&mut graph).await?;
    }

    // Every pull of "main" brought a new commit, so every run reinstalls it
    assert_eq!(runner.count_step("tracking", Step::Pull), 2);
    assert_eq!(runner.count_step("tracking", Step::Configure), 3);
    assert_eq!(runner.count_step("tagged", Step::Configure), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_clone_is_reported_not_fatal() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("broken", "u/x", None), ("ok", "u/ok", None)]))?;
    let runner = ScriptedRunner::new().fail_step("broken", Step::Clone);
    let options = DependencyOptions::default();

    let mut graph = Resolver::new(&ws.context, &options, &runner).resolve(&ws.manifest_path).await?;
    let report = Orchestrator::new(&ws.context, &runner).process(&mut graph).await?;

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].project_name, "broken");
    assert!(matches!(failures[0].status, NodeStatus::Failed { step: Step::Clone, .. }));
    assert_eq!(runner.count_step("broken", Step::Configure), 0);
    assert_eq!(runner.count_step("ok", Step::Install), 1);

    let Some(GleanError::BuildFailures {
        count,
        projects,
    }) = report.failure_error()
    else {
        panic!("expected an aggregated failure");
    };
    assert_eq!(count, 1);
    assert_eq!(projects, vec!["broken".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_export_mode_runs_no_cmake() -> Result<()> {
    let ws = Workspace::new(&manifest_json(&[("app", "u/app", None)]))?;
    let runner =
        ScriptedRunner::new().plant_manifest("app", manifest_json(&[("zlib", "u/zlib", Some("v1.3"))]));
    let options = DependencyOptions::default();

    let mut graph = Resolver::new(&ws.context, &options, &runner).resolve(&ws.manifest_path).await?;
    let rendered = glean::orchestrator::export(&graph, &ws.context)?;
    let report = Orchestrator::new(&ws.context, &runner)
        .run(&mut graph, &RunMode::Export {
            target: Some(Path::new(&ws.context.cache_root).join("deps.cmake")),
        })
        .await?;

    assert!(report.passes.is_empty());
    assert!(!runner.ran_cmake());
    assert!(rendered.contains(r#"GIT_TAG "v1.3""#));
    assert!(rendered.contains("DEPENDS zlib"));
    Ok(())
}
