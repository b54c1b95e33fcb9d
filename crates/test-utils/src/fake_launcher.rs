use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use mpitasks::errors::Result;
use mpitasks::exec::{check_exit, ExecutionResult, LaunchRequest, Launcher};

/// One recorded launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLaunch {
    pub task: String,
    pub tokens: Vec<String>,
    pub env: Vec<(String, String)>,
    pub ignore_exit_value: bool,
    pub echo: bool,
}

/// A fake launcher that:
/// - records every request instead of spawning a process
/// - answers with a scripted exit code per task name (default 0)
/// - applies the real exit-code policy.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    launched: Arc<Mutex<Vec<RecordedLaunch>>>,
    exit_codes: Arc<Mutex<HashMap<String, i32>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make launches of `task` exit with `code`.
    pub fn exit_with(self, task: &str, code: i32) -> Self {
        self.exit_codes
            .lock()
            .unwrap()
            .insert(task.to_string(), code);
        self
    }

    pub fn launched(&self) -> Vec<RecordedLaunch> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_tasks(&self) -> Vec<String> {
        self.launched().into_iter().map(|l| l.task).collect()
    }
}

impl Launcher for FakeLauncher {
    fn launch<'a>(
        &'a self,
        request: LaunchRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>> {
        Box::pin(async move {
            self.launched.lock().unwrap().push(RecordedLaunch {
                task: request.task.to_string(),
                tokens: request.command.tokens().to_vec(),
                env: request
                    .env
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ignore_exit_value: request.ignore_exit_value,
                echo: request.echo,
            });

            let exit_code = self
                .exit_codes
                .lock()
                .unwrap()
                .get(request.task)
                .copied()
                .unwrap_or(0);

            check_exit(&request, ExecutionResult { exit_code })
        })
    }
}
