use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("oscwire"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn sample_stream() -> std::path::PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join("basic")
        .join("input.bin")
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("encode")).and(contains("match")));
}

#[test]
fn decode_stdout_outputs_report() {
    let assert = cmd()
        .arg("decode")
        .arg(sample_stream())
        .arg("--stdout")
        .assert()
        .success();
    let report = stdout_json(&assert);
    assert_eq!(report["messages"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["messages"][0]["address"], "/synth/1/freq");
    assert_eq!(report["pending"]["state"], "data");
    assert_eq!(report["tool"]["name"], "oscwire");
    assert!(report["generated_at"].as_str().is_some_and(|s| s.contains('T')));
}

#[test]
fn decode_writes_report_file() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("decode")
        .arg(sample_stream())
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK:"));

    let json = std::fs::read_to_string(&report).expect("read report");
    let value: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["report_version"], 1);
}

#[test]
fn decode_quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(sample_stream())
        .arg("-o")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");

    cmd()
        .arg("decode")
        .arg(missing)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(sample_stream())
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("stream.bin");
    std::fs::copy(sample_stream(), &input).expect("copy input");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("must differ"));
}

#[test]
fn glob_with_multiple_matches_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::copy(sample_stream(), temp.path().join("a.bin")).expect("copy a");
    std::fs::copy(sample_stream(), temp.path().join("b.bin")).expect("copy b");

    cmd()
        .arg("decode")
        .arg(temp.path().join("*.bin"))
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("multiple files match").and(contains("hint:")));
}

#[test]
fn glob_with_single_match_decodes() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::copy(sample_stream(), temp.path().join("only.bin")).expect("copy input");

    cmd()
        .arg("decode")
        .arg(temp.path().join("*.bin"))
        .arg("--stdout")
        .assert()
        .success();
}

#[test]
fn strict_decode_fails_on_malformed_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("junk.bin");
    std::fs::write(&input, b"xx/a\0\0,\0\0\0").expect("write input");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .code(2)
        .stdout(contains("\"halted\":true"))
        .stderr(contains("decoding halted"));

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .success()
        .stdout(contains("\"address\":\"/a\""));
}

#[test]
fn encode_then_decode_round_trips() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("msg.bin");

    cmd()
        .arg("encode")
        .arg("/synth/1/freq")
        .arg("i:-7")
        .arg("s:sine")
        .arg("b:cafe")
        .arg("T")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("bytes written"));

    let bytes = std::fs::read(&output).expect("read output");
    assert_eq!(bytes.len() % 4, 0);
    assert_eq!(&bytes[..16], b"/synth/1/freq\0\0\0");

    let assert = cmd()
        .arg("decode")
        .arg(&output)
        .arg("--stdout")
        .assert()
        .success();
    let report = stdout_json(&assert);
    let msg = &report["messages"][0];
    assert_eq!(msg["type_tags"], "isbT");
    assert_eq!(msg["args"][0]["value"], -7);
    assert_eq!(msg["args"][2]["value"], "cafe");
    assert!(report.get("pending").is_none());
}

#[test]
fn encode_rejects_bad_argument() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg("encode")
        .arg("/x")
        .arg("b:abc")
        .arg("-o")
        .arg(temp.path().join("msg.bin"))
        .assert()
        .code(2)
        .stderr(contains("invalid argument").and(contains("hint:")));
}

#[test]
fn match_reports_full_and_prefix() {
    let assert = cmd()
        .arg("match")
        .arg("/foo/{bar,baz}")
        .arg("/foo/baz")
        .assert()
        .success();
    let value = stdout_json(&assert);
    assert_eq!(value["full"], true);
    assert_eq!(value["pattern_complete"], true);

    let assert = cmd()
        .arg("match")
        .arg("/foo/*")
        .arg("/foo/bar/baz")
        .assert()
        .code(1);
    let value = stdout_json(&assert);
    assert_eq!(value["full"], false);
    assert_eq!(value["route_offset"], 8);
}

#[test]
fn invalid_log_level_is_reported() {
    cmd()
        .arg("--log-level")
        .arg("loud")
        .arg("match")
        .arg("/a")
        .arg("/a")
        .assert()
        .code(2)
        .stderr(contains("invalid log level"));
}
