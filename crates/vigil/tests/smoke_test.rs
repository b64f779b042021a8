//! Smoke tests for the vigil binary
//!
//! Each test writes a pipeline configuration to a temp dir, runs the real
//! binary against it and checks what came out the other end.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;

const EVENTS: &str = concat!(
    "{\"sf.type\": \"PE\", \"sf.opflags\": \"EXEC\", \"sf.ts\": 100, \"sf.proc.tid\": 7, \"sf.proc.exe\": \"/bin/sh\", \"sf.node.id\": \"n1\"}\n",
    "{\"sf.type\": \"FE\", \"sf.ts\": 101, \"sf.file.oid\": \"0a0b\", \"sf.file.path\": \"/etc/shadow\", \"sf.node.id\": \"n1\"}\n",
    "not json\n",
    "{\"sf.type\": \"NF\", \"sf.ts\": 102, \"sf.net.sip\": \"10.0.0.1\", \"sf.net.dport\": 443, \"sf.node.id\": \"n1\"}\n",
);

fn write_config(dir: &Path, exporter: &str) -> std::path::PathBuf {
    let input = dir.join("events.jsonl");
    std::fs::write(&input, EVENTS).unwrap();

    let config = format!(
        r#"
[log]
level = "warn"

[[pipeline]]
processor = "EventReader"
handler = "Flattener"
out = "flat RecordChan"
path = {input:?}

[[pipeline]]
processor = "Exporter"
in = "flat RecordChan"
{exporter}
"#,
        input = input.display().to_string(),
    );
    let path = dir.join("vigil.toml");
    std::fs::write(&path, config).unwrap();
    path
}

async fn vigil(args: &[&str]) -> Output {
    let child = Command::new(env!("CARGO_BIN_EXE_vigil"))
        .args(args)
        .kill_on_drop(true)
        .output();
    timeout(Duration::from_secs(30), child)
        .await
        .expect("vigil did not exit")
        .expect("failed to run vigil")
}

fn read_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_run_file_export_structured() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.jsonl");
    let config = write_config(
        dir.path(),
        &format!(
            "export = \"file\"\npath = {:?}\nshape = \"structured\"\nbuffer = 1",
            out.display().to_string()
        ),
    );

    let output = vigil(&["run", "--config", config.to_str().unwrap()]).await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let events = read_lines(&out);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["type"], "PE");
    assert_eq!(events[0]["proc"]["exe"], "/bin/sh");
    assert!(events[0].get("file").is_none());
    assert_eq!(events[1]["file"]["path"], "/etc/shadow");
    assert_eq!(events[2]["net"]["dport"], 443);
}

#[tokio::test]
async fn test_default_command_is_run_with_stdout_export() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "export = \"stdout\"");

    let output = vigil(&["--config", config.to_str().unwrap()]).await;
    assert!(output.status.success());

    // logs go to stderr, so stdout carries only events
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["record"]["sf.type"], "PE");
    assert_eq!(events[2]["record"]["sf.net.sip"], "10.0.0.1");
}

#[tokio::test]
async fn test_check_reports_plan() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "export = \"stdout\"");

    let output = vigil(&["check", "--config", config.to_str().unwrap()]).await;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 stage(s), 1 channel(s)"), "{stdout}");
    assert!(stdout.contains("EventReader/Flattener"));
    assert!(stdout.contains("flat (RecordChan)"));
}

#[tokio::test]
async fn test_unknown_processor_fails_before_running() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("never.jsonl");
    let input = dir.path().join("events.jsonl");
    std::fs::write(&input, EVENTS).unwrap();
    let config = dir.path().join("vigil.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[[pipeline]]
processor = "EventReader"
handler = "Flattener"
out = "flat RecordChan"
path = {:?}

[[pipeline]]
processor = "Enricher"
in = "flat RecordChan"
out = "enriched RecordChan"

[[pipeline]]
processor = "Exporter"
in = "enriched RecordChan"
export = "file"
path = {:?}
"#,
            input.display().to_string(),
            out.display().to_string()
        ),
    )
    .unwrap();

    let run = vigil(&["run", "--config", config.to_str().unwrap()]).await;
    assert!(!run.status.success());
    assert!(String::from_utf8_lossy(&run.stderr).contains("Enricher"));
    assert!(!out.exists());

    let check = vigil(&["check", "--config", config.to_str().unwrap()]).await;
    assert!(!check.status.success());
}

#[tokio::test]
async fn test_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let output = vigil(&[
        "run",
        "--config",
        dir.path().join("absent.toml").to_str().unwrap(),
    ])
    .await;
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_bad_log_level_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "export = \"stdout\"");

    let output = vigil(&[
        "check",
        "--config",
        config.to_str().unwrap(),
        "--log-level",
        "vigil=loudest",
    ])
    .await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid log filter"));
}
