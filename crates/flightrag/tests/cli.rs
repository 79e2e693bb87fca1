use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_lists_options() {
  Command::cargo_bin("adsb-chat")
    .unwrap()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("--store"))
    .stdout(predicate::str::contains("--rebuild"))
    .stdout(predicate::str::contains("--ask"));
}

#[test]
fn test_missing_api_key_exits_with_remediation() {
  let temp = TempDir::new().unwrap();

  Command::cargo_bin("adsb-chat")
    .unwrap()
    .current_dir(temp.path())
    .env_remove("GROQ_API_KEY")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("GROQ_API_KEY not found in environment variables!"))
    .stderr(predicate::str::contains("GROQ_API_KEY=your_api_key_here"));

  assert!(!temp.path().join("data").exists());
}
