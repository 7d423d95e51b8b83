//! End-to-end session tests against real `sh` agents.

#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use devagent_core::AgentSettings;
use devagent_models::{CommandType, MessageRole};
use devagent_session::{AgentSession, RequestPhase, SessionError, SessionEvent};
use tempfile::{tempdir, TempDir};

struct Workspace {
    root: TempDir,
    temp: TempDir,
}

impl Workspace {
    /// Workspace whose `agent.sh` has the given body. The script receives
    /// `--input-file <path>` as `$1 $2`.
    fn with_agent(body: &str) -> Self {
        let root = tempdir().unwrap();
        std::fs::write(root.path().join("agent.sh"), body).unwrap();
        Self {
            root,
            temp: tempdir().unwrap(),
        }
    }

    fn settings(&self) -> AgentSettings {
        AgentSettings::new()
            .with_script_path("agent.sh")
            .with_interpreter("sh")
            .with_workspace_root(self.root.path())
            .with_install_dir("/nonexistent")
            .with_temp_dir(self.temp.path())
    }

    fn session(&self) -> AgentSession {
        AgentSession::new(self.settings())
    }

    fn artifacts_left(&self) -> usize {
        std::fs::read_dir(self.temp.path()).unwrap().count()
    }
}

#[tokio::test]
async fn test_agent_reads_request_file() {
    let ws = Workspace::with_agent("cat \"$2\"\n");
    let session = ws.session();
    session.set_current_file("/src/app.py", "print('hi')").await;

    let reply = session
        .submit("can you explain this?")
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let request: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(request["command"], "can you explain this?");
    assert_eq!(request["command_type"], "explain");
    assert_eq!(request["file_path"], "/src/app.py");
    assert_eq!(request["file_content"], "print('hi')");
    assert_eq!(ws.artifacts_left(), 0);
}

#[tokio::test]
async fn test_stderr_becomes_warning_section() {
    let ws = Workspace::with_agent("printf ok; printf warn >&2\n");
    let session = ws.session();

    let reply = session.submit("summarize").await.unwrap().wait().await.unwrap();

    assert_eq!(reply, "ok\n\nWarnings/Errors:\nwarn");
}

#[tokio::test]
async fn test_silent_agent() {
    let ws = Workspace::with_agent("exit 0\n");
    let session = ws.session();

    let reply = session.submit("summarize").await.unwrap().wait().await.unwrap();

    assert_eq!(reply, "Agent script executed successfully with no output.");
}

#[tokio::test]
async fn test_failing_agent_is_routed() {
    let ws = Workspace::with_agent("echo 'Traceback: boom' >&2\nexit 4\n");
    let session = ws.session();

    let err = session.submit("summarize").await.unwrap().wait().await.unwrap_err();

    match err {
        SessionError::Gateway(e) => assert_eq!(e.exit_code(), Some(4)),
        other => panic!("unexpected error: {:?}", other),
    }

    let history = session.history().await;
    let last = history.last().unwrap();
    assert_eq!(last.role(), MessageRole::Agent);
    assert!(last.content().starts_with("Error: "));
    assert!(last.content().contains("Traceback: boom"));
    assert_eq!(ws.artifacts_left(), 0);
}

#[tokio::test]
async fn test_missing_script_reports_without_running() {
    let ws = Workspace::with_agent("exit 0\n");
    let settings = ws.settings().with_script_path("not_there.py");
    let session = AgentSession::new(settings);

    let reply = session.submit("summarize").await.unwrap().wait().await.unwrap();

    assert!(reply.starts_with("Error: Agent script not found at not_there.py"));
    assert!(reply.contains("Please check the 'script_path' setting."));
    assert_eq!(ws.artifacts_left(), 0);
}

#[tokio::test]
async fn test_slow_agent_times_out() {
    let ws = Workspace::with_agent("sleep 10\n");
    let settings = ws.settings().with_timeout(Duration::from_secs(1));
    let session = AgentSession::new(settings);

    let started = std::time::Instant::now();
    let err = session.submit("summarize").await.unwrap().wait().await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    match err {
        SessionError::Gateway(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {:?}", other),
    }
    let history = session.history().await;
    assert_eq!(
        history.last().unwrap().content(),
        "Error: Agent script execution timed out after 1 seconds"
    );
    assert_eq!(ws.artifacts_left(), 0);
}

#[tokio::test]
async fn test_clear_kills_running_agent() {
    let ws = Workspace::with_agent("sleep 30\n");
    let session = ws.session();
    let mut events = session.subscribe();

    let ticket = session.submit("summarize").await.unwrap();

    // Wait for the request file to appear, i.e. the agent is running.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while ws.artifacts_left() == 0 {
        assert!(std::time::Instant::now() < deadline, "agent never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    session.clear().await;

    assert!(ticket.wait().await.unwrap_err().is_cancelled());
    assert_eq!(ws.artifacts_left(), 0);
    assert!(session.history().await.is_empty());

    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Phase { phase, .. } = event {
            phases.push(phase);
        }
    }
    assert_eq!(
        phases,
        vec![
            RequestPhase::Dispatched,
            RequestPhase::Cancelled,
            RequestPhase::Idle
        ]
    );
}

#[tokio::test]
async fn test_direct_run_leaves_history_alone() {
    let ws = Workspace::with_agent("printf direct\n");
    let session = ws.session();

    let reply = session
        .run("anything", CommandType::Custom, "", "")
        .await
        .unwrap();

    assert_eq!(reply, "direct");
    assert_eq!(session.history().await.len(), 1);
}

#[tokio::test]
async fn test_absolute_script_path() {
    let ws = Workspace::with_agent("printf absolute\n");
    let script = ws.root.path().join("agent.sh");
    assert!(Path::new(&script).is_absolute());

    let settings = AgentSettings::new()
        .with_script_path(script.to_string_lossy())
        .with_interpreter("sh")
        .with_install_dir("/nonexistent")
        .with_temp_dir(ws.temp.path());
    let session = AgentSession::new(settings);

    let reply = session.submit("go").await.unwrap().wait().await.unwrap();
    assert_eq!(reply, "absolute");
}
