use std::fs;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

const CHAT_LOG: &str = "\
민수 님과 카카오톡 대화
저장한 날짜 : 2024-01-05 10:00:00

[민수] [오전 9:00] 헤더 이전 메시지
--- 2024년 1월 2일 화요일 ---
[지영] [오후 12:10] 점심 뭐 먹었어?
[민수] [오후 12:15] 짜장면 먹었지 ㅋㅋ
[지영] [오후 12:16] 사진
[지영] [오후 3:00] 주말에 뭐해
[민수] [오후 3:05] 집에서 쉴래 ㅋㅋ 영화 보면서
--- 2024년 1월 3일 수요일 ---
[민수] [오전 12:30] 아직 안 자?
[지영] [오전 7:05] 이제 일어났어ㅠㅠ
[민수] [오전 7:10] 삭제된 메시지입니다.
";

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let log_path = root.join("chat.txt");
    fs::write(&log_path, CHAT_LOG).unwrap();

    // Not created: commands fall back to defaults.
    let config_path = root.join("config").join("echochat.toml");

    (tmp, log_path, config_path)
}

fn run_echochat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_echochat"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run echochat: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_echochat_with_stdin(
    config_path: &Path,
    args: &[&str],
    stdin: &str,
) -> (String, String, bool) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_echochat"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env("RUST_LOG", "echochat=info")
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run echochat: {}", e));

    // The child may exit before reading everything.
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_parse_emits_csv() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, stderr, success) = run_echochat(&config, &["parse", log.to_str().unwrap()]);
    assert!(success, "parse failed: {}", stderr);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Date,Time,Speaker,Message");
    assert_eq!(lines[1], "2024-01-02,12:10,지영,점심 뭐 먹었어?");
    assert_eq!(lines[2], "2024-01-02,12:15,민수,짜장면 먹었지 ㅋㅋ");
    assert!(lines.contains(&"2024-01-03,00:30,민수,아직 안 자?"));
    assert!(lines.contains(&"2024-01-03,07:05,지영,이제 일어났어ㅠㅠ"));
    // header + 6 messages; pre-header line, photo, and deleted message dropped
    assert_eq!(lines.len(), 7);
    assert!(!stdout.contains("헤더 이전"));
    assert!(!stdout.contains("사진"));
}

#[test]
fn test_parse_writes_output_file() {
    let (tmp, log, config) = setup_test_env();
    let out = tmp.path().join("out").join("cleaned.csv");

    let (_, stderr, success) = run_echochat(
        &config,
        &["parse", log.to_str().unwrap(), "--output", out.to_str().unwrap()],
    );
    assert!(success, "parse failed: {}", stderr);
    assert!(stderr.contains("Exported 6 messages"));

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("Date,Time,Speaker,Message\n"));
}

#[test]
fn test_parse_json() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) =
        run_echochat(&config, &["parse", log.to_str().unwrap(), "--format", "json"]);
    assert!(success);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 6);
    assert_eq!(rows[0]["speaker"], "지영");
}

#[test]
fn test_parse_missing_log_fails() {
    let (tmp, _log, config) = setup_test_env();
    let missing = tmp.path().join("missing.txt");

    let (_, stderr, success) = run_echochat(&config, &["parse", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to read chat log"));
}

#[test]
fn test_speakers() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) = run_echochat(&config, &["speakers", log.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("0. 지영 (3 messages)"));
    assert!(stdout.contains("1. 민수 (3 messages)"));
}

#[test]
fn test_profile_json() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) = run_echochat(
        &config,
        &["profile", log.to_str().unwrap(), "--speaker", "민수", "--json"],
    );
    assert!(success);
    let profile: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(profile["top_expressions"], serde_json::json!(["ㅋㅋ"]));
    assert_eq!(profile["top_words"][0], "ㅋㅋ");
}

#[test]
fn test_profile_unknown_speaker_uses_fallback() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) = run_echochat(
        &config,
        &["profile", log.to_str().unwrap(), "--speaker", "철수", "--json"],
    );
    assert!(success);
    let profile: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(profile["avg_length"], 15);
    assert_eq!(profile["top_words"], serde_json::json!([]));
}

#[test]
fn test_retrieve_speaker_history() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, stderr, success) = run_echochat(
        &config,
        &[
            "retrieve",
            log.to_str().unwrap(),
            "--speaker",
            "민수",
            "영화 볼래?",
            "--limit",
            "1",
        ],
    );
    assert!(success, "retrieve failed: {}", stderr);
    assert!(stdout.starts_with("1. ["));
    assert!(stdout.contains("집에서 쉴래 ㅋㅋ 영화 보면서"));
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_retrieve_reply_strategy_explain() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) = run_echochat(
        &config,
        &[
            "retrieve",
            log.to_str().unwrap(),
            "--speaker",
            "민수",
            "이번 주말에 뭐해",
            "--strategy",
            "reply",
            "--limit",
            "1",
            "--explain",
        ],
    );
    assert!(success);
    assert!(stdout.contains("집에서 쉴래 ㅋㅋ 영화 보면서"));
    assert!(stdout.contains("in reply to: 주말에 뭐해"));
}

#[test]
fn test_retrieve_unknown_speaker() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) = run_echochat(
        &config,
        &["retrieve", log.to_str().unwrap(), "--speaker", "철수", "안녕"],
    );
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_prompt_command() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, _, success) = run_echochat(
        &config,
        &["prompt", log.to_str().unwrap(), "--speaker", "민수", "뭐해?"],
    );
    assert!(success);
    assert!(stdout.contains("[system]"));
    assert!(stdout.contains(r#"You must speak like "민수"."#));
    assert!(stdout.contains("Common expressions: ㅋㅋ"));
}

#[test]
fn test_config_overrides_deny_list() {
    let (tmp, log, _) = setup_test_env();
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "[normalizer]\ndeny_list = [\"짜장면\"]\n").unwrap();

    let (stdout, _, success) = run_echochat(&config, &["parse", log.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("지영,사진"));
    assert!(!stdout.contains("짜장면"));
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, log, _) = setup_test_env();
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "[session]\nhistory_limit = 0\n").unwrap();

    let (_, stderr, success) = run_echochat(&config, &["speakers", log.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("history_limit"));
}

#[test]
fn test_chat_reprompts_until_valid_speaker_index() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, stderr, success) =
        run_echochat_with_stdin(&config, &["chat", log.to_str().unwrap()], "abc\n7\n1\n\n");
    assert!(success, "chat failed: {}", stderr);

    assert!(stdout.contains("0. 지영"));
    assert!(stdout.contains("1. 민수"));
    assert_eq!(stdout.matches("잘못된 입력입니다").count(), 2);
    assert!(stderr.contains("chat session started"));
    assert!(stderr.contains("민수"));
    assert!(!stderr.contains("Error"));
}

#[test]
fn test_chat_without_selection_fails() {
    let (_tmp, log, config) = setup_test_env();

    let (_, stderr, success) =
        run_echochat_with_stdin(&config, &["chat", log.to_str().unwrap()], "abc\n");
    assert!(!success);
    assert!(stderr.contains("No speaker selected"));
}

#[test]
fn test_chat_quit_with_named_speaker() {
    let (_tmp, log, config) = setup_test_env();

    let (stdout, stderr, success) = run_echochat_with_stdin(
        &config,
        &["chat", log.to_str().unwrap(), "--speaker", "지영"],
        "/quit\n",
    );
    assert!(success, "chat failed: {}", stderr);

    // No speaker menu and no reply when the speaker is given and the
    // first line quits.
    assert!(!stdout.contains("0. 지영"));
    assert!(!stdout.contains("지영: "));
    assert!(stderr.contains("chat session started"));
}

#[test]
fn test_chat_rejects_zero_history_limit() {
    let (_tmp, log, config) = setup_test_env();

    let (_, stderr, success) = run_echochat_with_stdin(
        &config,
        &["chat", log.to_str().unwrap(), "--speaker", "지영", "--history-limit", "0"],
        "",
    );
    assert!(!success);
    assert!(stderr.contains("--history-limit must be >= 1"));
}
