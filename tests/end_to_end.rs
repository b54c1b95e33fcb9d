mod common;
use crate::common::builders::{ConfigFileBuilder, ProgramConfigBuilder};
use crate::common::fake_launcher::FakeLauncher;
use crate::common::{init_tracing, with_timeout, write_file};

use std::error::Error;
use std::sync::Arc;

use mpitasks::compile::CompileGate;
use mpitasks::discover::{discover_all, DiscoverySpec};
use mpitasks::exec::ExecutionEnvironment;
use mpitasks::fs::{FileSystem, RealFileSystem};
use mpitasks::launch::{LaunchContext, LaunchSpecBuilder};
use mpitasks::registry::{TaskRegistry, TaskRunner, TaskState};
use mpitasks::types::{BindPolicy, LaunchOverrides};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn discovered_blocking_program_gets_exact_launch_tokens() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let root = dir.path();
        write_file(root, "examples/Blocking.src", "main");
        write_file(root, "examples/Cross.src", "main");
        write_file(root, "examples/README.md", "docs");

        // Discovery on its own.
        let spec = DiscoverySpec::new(root, "src");
        let ids = discover_all(&RealFileSystem, &spec)?;
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["examples.Blocking", "examples.Cross"]);

        // Registry from a config pointing at the same tree.
        let cfg = ConfigFileBuilder::new()
            .discover(root, "src")
            .launcher("/opt/ompi/bin/mpirun")
            .classpath("build/classes")
            .build_in(root);

        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let registry = TaskRegistry::from_config(&cfg, fs.as_ref())?;
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["runexamplesBlocking", "runexamplesCross"]);

        let launcher = FakeLauncher::new();
        let runner = TaskRunner::new(
            LaunchSpecBuilder::new(LaunchContext::from_config(&cfg)),
            ExecutionEnvironment::from_config(&cfg),
            CompileGate::disabled(fs),
            launcher.clone(),
        );

        let overrides = LaunchOverrides {
            process_count: Some(6),
            bind_policy: Some(BindPolicy::None),
            debug: Some(true),
            ignore_exit_value: None,
        };
        let task = registry.task("runexamplesBlocking")?;
        let result = runner.invoke_with(task, &overrides).await?;
        assert_eq!(result.exit_code, 0);
        assert_eq!(task.state(), TaskState::Succeeded);
        assert_eq!(registry.task("runexamplesCross")?.state(), TaskState::Registered);

        let classpath = root.join("build/classes").to_string_lossy().into_owned();
        let launched = launcher.launched();
        assert_eq!(launched.len(), 1);
        assert_eq!(
            launched[0].tokens,
            vec![
                "/opt/ompi/bin/mpirun".to_string(),
                "--bind-to".to_string(),
                "none".to_string(),
                "--report-bindings".to_string(),
                "-np".to_string(),
                "6".to_string(),
                "java".to_string(),
                "-cp".to_string(),
                classpath,
                "examples.Blocking".to_string(),
            ]
        );
        assert!(launched[0].echo);

        let lib_dir = root.join("libs/ompi/lib").to_string_lossy().into_owned();
        assert_eq!(
            launched[0].env,
            vec![("LD_LIBRARY_PATH".to_string(), lib_dir)]
        );

        Ok(())
    })
    .await
}

#[tokio::test]
async fn static_program_options_override_discovered_defaults() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let root = dir.path();
        write_file(root, "src/Blocking.java", "static void main");
        write_file(root, "src/Cross.java", "static void main");
        write_file(root, "src/Utils.java", "helpers only");

        let cfg = ConfigFileBuilder::new()
            .discover(root.join("src"), "java")
            .entry_marker(r"static\s+void\s+main")
            .namespace_prefix("jromp.mpi.examples")
            .default_np(4)
            .default_bind_to(BindPolicy::None)
            .with_program("Blocking", ProgramConfigBuilder::new().np(6).arg("--size=100").build())
            .with_program("io.github.mpi.Main", ProgramConfigBuilder::new().np(2).build())
            .build_in(root);

        let registry = TaskRegistry::from_config(&cfg, &RealFileSystem)?;
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["runBlocking", "runCross", "runiogithubmpiMain"]);

        let blocking = registry.task("runBlocking")?;
        assert_eq!(blocking.options().process_count, 6);
        assert_eq!(blocking.options().bind_policy, BindPolicy::None);
        assert_eq!(blocking.args(), &["--size=100".to_string()]);

        let cross = registry.task("runCross")?;
        assert_eq!(cross.options().process_count, 4);

        let launcher = FakeLauncher::new();
        let runner = TaskRunner::new(
            LaunchSpecBuilder::new(LaunchContext::from_config(&cfg)),
            ExecutionEnvironment::new(),
            CompileGate::disabled(Arc::new(RealFileSystem)),
            launcher.clone(),
        );
        runner.invoke(blocking).await?;

        let launched = launcher.launched();
        let tokens = &launched[0].tokens;
        assert_eq!(&tokens[tokens.len() - 2..], &["jromp.mpi.examples.Blocking", "--size=100"]);
        assert!(!launched[0].echo);

        Ok(())
    })
    .await
}

#[cfg(unix)]
#[test]
fn discovery_stays_inside_the_root_with_symlink_loops() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("root");
    write_file(&root, "A.src", "main");
    write_file(dir.path(), "Outside.src", "main");
    std::os::unix::fs::symlink("..", root.join("up"))?;
    std::os::unix::fs::symlink(&root, root.join("self"))?;

    let ids = discover_all(&RealFileSystem, &DiscoverySpec::new(&root, "src"))?;
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["A"]);
    Ok(())
}

#[tokio::test]
async fn config_sections_reach_the_launched_processes() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let root = dir.path();
        write_file(root, "src/Ring.java", "static void main");
        write_file(root, "src/Helper.java", "static void main");

        let cfg = ConfigFileBuilder::new()
            .discover(root.join("src"), "java")
            .exclude("Helper.java")
            .lib_dir("native")
            .task_prefix("mpi")
            .compile_cmd(&["make", "classes"])
            .env("OMPI_MCA_rmaps_base_oversubscribe", "1")
            .with_program(
                "Ring",
                ProgramConfigBuilder::new()
                    .bind_to(BindPolicy::To("core".to_string()))
                    .debug(true)
                    .build(),
            )
            .build_in(root);

        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let registry = TaskRegistry::from_config(&cfg, fs.as_ref())?;
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["mpiRing"]);

        let env = ExecutionEnvironment::from_config(&cfg);
        let launcher = FakeLauncher::new();
        let runner = TaskRunner::new(
            LaunchSpecBuilder::new(LaunchContext::from_config(&cfg)),
            env.clone(),
            CompileGate::from_config(&cfg, fs, env),
            launcher.clone(),
        );
        runner.invoke(registry.task("mpiRing")?).await?;

        let launched = launcher.launched();
        assert_eq!(launcher.launched_tasks(), vec!["compile", "mpiRing"]);
        assert_eq!(launched[0].tokens, vec!["make", "classes"]);

        let expected_env = vec![
            (
                "LD_LIBRARY_PATH".to_string(),
                root.join("native").to_string_lossy().into_owned(),
            ),
            ("OMPI_MCA_rmaps_base_oversubscribe".to_string(), "1".to_string()),
        ];
        assert_eq!(launched[0].env, expected_env);
        assert_eq!(launched[1].env, expected_env);

        assert_eq!(&launched[1].tokens[1..4], &["--bind-to", "core", "--report-bindings"]);
        assert!(launched[1].echo);
        Ok(())
    })
    .await
}
