#![cfg(unix)]

mod common;
use crate::common::{capture_logs, init_tracing, with_timeout, write_file};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use mpitasks::config::load_and_validate;
use mpitasks::errors::MpitasksError;
use mpitasks::exec::{ExecutionEnvironment, LaunchRequest, Launcher, ProcessLauncher};
use mpitasks::logging::filter_directives;
use mpitasks::fs::{FileSystem, RealFileSystem};
use mpitasks::launch::LaunchCommand;
use mpitasks::registry::{TaskRegistry, TaskRunner, TaskState};
use tracing::instrument::WithSubscriber;

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> LaunchCommand {
    LaunchCommand::from_argv(["sh", "-c", script]).unwrap()
}

fn request<'a>(
    command: &'a LaunchCommand,
    env: &'a ExecutionEnvironment,
    ignore_exit_value: bool,
) -> LaunchRequest<'a> {
    LaunchRequest {
        task: "runRing",
        command,
        env,
        ignore_exit_value,
        echo: true,
    }
}

#[tokio::test]
async fn non_zero_exit_fails_unless_ignored() -> TestResult {
    with_timeout(async {
        init_tracing();

        let launcher = ProcessLauncher::new();
        let env = ExecutionEnvironment::new();
        let cmd = sh("exit 3");

        match launcher.launch(request(&cmd, &env, false)).await {
            Err(MpitasksError::LaunchFailure { task, code }) => {
                assert_eq!(task, "runRing");
                assert_eq!(code, 3);
            }
            other => panic!("expected LaunchFailure, got {:?}", other),
        }

        let result = launcher.launch(request(&cmd, &env, true)).await?;
        assert_eq!(result.exit_code, 3);
        assert!(!result.success());

        let ok = sh("exit 0");
        assert!(launcher.launch(request(&ok, &env, false)).await?.success());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn environment_is_overlaid_on_the_inherited_one() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let mut env = ExecutionEnvironment::new();
        env.set("MPITASKS_OVERLAY", "expected");

        // The overlay adds variables; PATH is still inherited.
        let cmd = LaunchCommand::from_argv([
            "sh",
            "-c",
            r#"test "$MPITASKS_OVERLAY" = expected && test -n "$PATH" && test -f marker"#,
        ])
        .unwrap();
        write_file(dir.path(), "marker", "");

        let launcher = ProcessLauncher::new().with_working_dir(dir.path());
        let result = launcher.launch(request(&cmd, &env, false)).await?;
        assert_eq!(result.exit_code, 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn missing_launcher_binary_is_a_spawn_error() -> TestResult {
    with_timeout(async {
        init_tracing();

        let env = ExecutionEnvironment::new();
        let cmd = LaunchCommand::from_argv(["/nonexistent/mpitasks/mpirun", "-np", "2"]).unwrap();

        let err = ProcessLauncher::new()
            .launch(request(&cmd, &env, true))
            .await
            .unwrap_err();
        match err {
            MpitasksError::Spawn { program, .. } => {
                assert_eq!(program, "/nonexistent/mpitasks/mpirun");
            }
            other => panic!("expected Spawn, got {:?}", other),
        }
        Ok(())
    })
    .await
}

#[tokio::test]
async fn relative_config_path_launches_from_the_project_root() -> TestResult {
    with_timeout(async {
        init_tracing();

        // Test binaries run from the package root; build the project below it
        // and address the config relative to the current directory.
        let cwd = std::env::current_dir()?;
        let dir = tempfile::Builder::new().prefix(".mpitasks-rel").tempdir_in(&cwd)?;
        let rel_root = dir.path().strip_prefix(&cwd)?.join("proj");

        let abs_root = cwd.join(&rel_root);
        write_file(&abs_root, "Mpitasks.toml", "[config]\nlauncher = \"bin/fake\"\n\n[program.Main]\n");
        std::fs::create_dir_all(abs_root.join("bin"))?;
        let true_bin = ["/bin/true", "/usr/bin/true"]
            .into_iter()
            .find(|p| Path::new(p).exists())
            .ok_or("no `true` binary")?;
        std::os::unix::fs::symlink(true_bin, abs_root.join("bin/fake"))?;

        let cfg = load_and_validate(rel_root.join("Mpitasks.toml"))?;
        assert!(cfg.root_dir().is_absolute());
        assert_eq!(cfg.launcher_path(), abs_root.join("bin/fake"));

        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let registry = TaskRegistry::from_config(&cfg, fs.as_ref())?;
        let runner = TaskRunner::from_config(&cfg, fs);

        let task = registry.task("runMain")?;
        let result = runner.invoke(task).await?;
        assert_eq!(result.exit_code, 0);
        assert_eq!(task.state(), TaskState::Succeeded);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn debug_echo_is_logged_even_at_warn_level() -> TestResult {
    with_timeout(async {
        let (dispatch, logs) = capture_logs(&filter_directives(tracing::Level::WARN));

        let mut env = ExecutionEnvironment::new();
        env.set("LD_LIBRARY_PATH", "/ompi/lib");
        let cmd = sh("exit 4");

        let result = ProcessLauncher::new()
            .launch(request(&cmd, &env, true))
            .with_subscriber(dispatch)
            .await?;
        assert_eq!(result.exit_code, 4);

        let out = logs.contents();
        assert!(out.contains("mpitasks::echo"), "{out}");
        assert!(out.contains("exec: LD_LIBRARY_PATH=/ompi/lib sh -c 'exit 4'"), "{out}");
        assert!(out.contains("done: LD_LIBRARY_PATH=/ompi/lib sh -c 'exit 4'"), "{out}");
        assert!(out.contains("exit_code=4"), "{out}");
        // Ordinary info and debug lines stay filtered.
        assert!(!out.contains("launcher process exited"), "{out}");
        assert!(!out.contains("spawning launcher process"), "{out}");
        Ok(())
    })
    .await
}
