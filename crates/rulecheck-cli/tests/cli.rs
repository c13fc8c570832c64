use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn rulecheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rulecheck"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("RULECHECK_MODE")
        .env_remove("RULECHECK_URL_PREFIXES")
        .env_remove("RULECHECK_DNS_TIMEOUT_MS")
        .env_remove("RULECHECK_ABSENT_FIELDS")
        .output()
        .expect("failed to run rulecheck")
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path_str(&path)
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_check_passes() {
    let dir = TempDir::new().unwrap();
    let inputs = write(&dir, "inputs.json", r#"{"username": "alice", "age": 30}"#);
    let rules = write(&dir, "rules.yaml", "username: [required, 'min:3']\nage: 'between:18|99'\n");

    let output = rulecheck(&["check", "--inputs", &inputs, "--rules", &rules]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "All checks passed");
}

#[test]
fn test_check_prints_messages_and_fails() {
    let dir = TempDir::new().unwrap();
    let inputs = write(&dir, "inputs.json", r#"{"username": "ab", "password": "short"}"#);
    let rules = write(
        &dir,
        "rules.json",
        r#"{"username": ["required", "min:3"], "password": ["required", "min:8"]}"#,
    );

    let output = rulecheck(&["check", "--inputs", &inputs, "--rules", &rules]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        vec![
            "'username' is too small. (min: 3)",
            "'password' is too small. (min: 8)",
        ]
    );
}

#[test]
fn test_boolean_mode() {
    let dir = TempDir::new().unwrap();
    let inputs = write(&dir, "inputs.json", r#"{"email": "nope"}"#);
    let rules = write(&dir, "rules.json", r#"{"email": "email"}"#);

    let output = rulecheck(&["check", "--inputs", &inputs, "--rules", &rules, "--mode", "boolean"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).trim(), "false");
}

#[test]
fn test_json_output() {
    let dir = TempDir::new().unwrap();
    let inputs = write(&dir, "inputs.json", r#"{"site": "git://example.com"}"#);
    let rules = write(&dir, "rules.json", r#"{"site": "url"}"#);

    let output = rulecheck(&[
        "check", "--inputs", &inputs, "--rules", &rules, "--format", "json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["passed"], false);
    assert_eq!(report["mode"], "strict");
    assert_eq!(report["errors"]["site"][0]["rule"], "url");

    let output = rulecheck(&[
        "check", "--inputs", &inputs, "--rules", &rules, "--url-prefix", "git://",
    ]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_unknown_rule_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let inputs = write(&dir, "inputs.json", r#"{"name": "x"}"#);
    let rules = write(&dir, "rules.json", r#"{"name": "requird"}"#);

    let output = rulecheck(&["check", "--inputs", &inputs, "--rules", &rules]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown rule 'requird'"));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let rules = write(&dir, "rules.json", r#"{"name": "required"}"#);
    let missing = path_str(&dir.path().join("missing.json"));

    let output = rulecheck(&["check", "--inputs", &missing, "--rules", &rules]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_bad_mode_is_a_usage_error() {
    let output = rulecheck(&["check", "--inputs", "a.json", "--rules", "b.json", "--mode", "loud"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_rules_listing() {
    let output = rulecheck(&["rules"]);
    assert_eq!(output.status.code(), Some(0));
    let listing = stdout(&output);
    assert!(listing.lines().any(|line| line.starts_with("between") && line.ends_with("params: 2")));
    assert!(listing.lines().any(|line| line.starts_with("creditcard")));

    let output = rulecheck(&["rules", "--json"]);
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(rules
        .as_array()
        .unwrap()
        .iter()
        .any(|rule| rule["name"] == "in" && rule["params"] == "1 to 2"));
}
