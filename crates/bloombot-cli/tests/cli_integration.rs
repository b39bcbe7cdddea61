//! CLI integration tests that run the actual bloombot binary.
//! Tests that talk to Gemini are marked `#[ignore]`.

use std::path::PathBuf;
use std::process::Command;

fn bloombot() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bloombot"))
}

/// A scratch project dir with HOME pointed inside it, so no user config leaks in.
fn sandbox() -> PathBuf {
    let tmp = std::env::temp_dir().join(format!("bloombot-cli-test-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(tmp.join("home")).unwrap();
    tmp
}

fn sandboxed(dir: &PathBuf) -> Command {
    let mut cmd = bloombot();
    cmd.current_dir(dir)
        .env("HOME", dir.join("home"))
        .env("XDG_CONFIG_HOME", dir.join("home/.config"))
        .env("XDG_CACHE_HOME", dir.join("home/.cache"))
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_lists_commands() {
    let output = bloombot().arg("--help").output().expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["identify", "chat", "tui", "schema", "config"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_cli_schema_is_json() {
    let dir = sandbox();
    let output = sandboxed(&dir).arg("schema").output().expect("failed to execute");
    assert!(
        output.status.success(),
        "bloombot schema failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let schema: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("invalid JSON output");
    assert_eq!(schema["type"], "OBJECT");
    assert_eq!(
        schema["properties"]["difficulty"]["enum"],
        serde_json::json!(["Easy", "Moderate", "Challenging"])
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_config_redacts_key_and_merges_layers() {
    let dir = sandbox();
    std::fs::create_dir_all(dir.join(".bloombot")).unwrap();
    std::fs::write(
        dir.join(".bloombot/config.toml"),
        "[gemini]\nmodel = \"gemini-2.5-flash\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(".bloombot/config.local.toml"),
        "[gemini]\napi_key = \"sk-very-secret\"\n\n[chat]\nthinking_budget = 9000\n",
    )
    .unwrap();

    let output = sandboxed(&dir).arg("config").output().expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("gemini-2.5-flash"));
    assert!(stdout.contains("<redacted>"));
    assert!(!stdout.contains("sk-very-secret"));
    // Chat budget above the identify budget is clamped with a warning.
    assert!(stdout.contains("thinking_budget = 2000"));
    assert!(stderr.contains("warning:"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_identify_without_key_fails() {
    let dir = sandbox();
    std::fs::write(dir.join("leaf.jpg"), [0xFF, 0xD8, 0xFF]).unwrap();

    let output = sandboxed(&dir)
        .args(["identify", "leaf.jpg"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API key"), "unexpected stderr: {stderr}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_identify_missing_file_fails() {
    let dir = sandbox();
    let output = sandboxed(&dir)
        .env("GEMINI_API_KEY", "test-key")
        .args(["identify", "does-not-exist.jpg"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.jpg"));

    let _ = std::fs::remove_dir_all(&dir);
}

/// Needs `GEMINI_API_KEY` and `BLOOMBOT_TEST_PHOTO` pointing at a real plant photo.
#[test]
#[ignore]
fn test_cli_identify_json_live() {
    let photo = std::env::var("BLOOMBOT_TEST_PHOTO").expect("BLOOMBOT_TEST_PHOTO not set");
    let output = bloombot()
        .args(["identify", &photo, "--json"])
        .output()
        .expect("failed to execute");
    assert!(
        output.status.success(),
        "identify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let plant: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("invalid JSON output");
    assert!(plant["commonName"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(plant.get("image").is_none());
}

#[test]
#[ignore]
fn test_cli_chat_quit_live() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = bloombot()
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"How often should I water a pothos?\n/quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("bloombot>"));
}
