use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::thread;
use tempfile::TempDir;

/// Starts a loopback server answering every request with `200 {"id": 1}`
/// and returns its base URL.
///
/// 启动一个对每个请求都返回 `200 {"id": 1}` 的本地回环服务器，并返回其基础 URL。
fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            thread::spawn(move || {
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 1024];
                while !String::from_utf8_lossy(&buffer).contains("\r\n\r\n") {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                    }
                }
                let body = r#"{"id": 1}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            });
        }
    });
    url
}

fn write_suite(dir: &TempDir, base_url: &str, second_status: u16) -> std::path::PathBuf {
    let path = dir.path().join("ApiSuite.toml");
    let content = format!(
        r#"
language = "en"

[suite]
id = "cli-suite"
name = "CLI Suite"

[run]
environment = "test"
base_url = "{base_url}"

[[cases]]
id = "item"
name = "Item has an id"
method = "GET"
endpoint = "/items/1"
validation = ["response has property id", "id is number"]
category = "positive"

[[cases]]
id = "second"
name = "Second check"
method = "GET"
endpoint = "/items/2"
expected_status = {second_status}
category = "negative"
"#
    );
    fs::write(&path, content).unwrap();
    path
}

fn api_runner() -> Command {
    Command::cargo_bin("api-runner").unwrap()
}

/// A suite whose cases all pass exits successfully and says so.
///
/// 所有用例都通过的套件成功退出并给出相应提示。
#[test]
fn test_successful_run() {
    let dir = TempDir::new().unwrap();
    let config = write_suite(&dir, &spawn_server(), 200);

    api_runner()
        .args(["--lang", "en", "run", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("All tests passed!"))
        .stdout(predicate::str::contains("Item has an id"));
}

/// A failing case makes the process exit with a failure code.
///
/// 失败的用例会使进程以失败退出码结束。
#[test]
fn test_failing_run() {
    let dir = TempDir::new().unwrap();
    let config = write_suite(&dir, &spawn_server(), 404);

    api_runner()
        .args(["--lang", "en", "run", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Some tests failed."))
        .stdout(predicate::str::contains("Expected status code 404 but got 200"))
        .stderr(predicate::str::contains("failed"));
}

/// The category filter restricts the run to matching cases.
///
/// 类别过滤器将运行限制为匹配的用例。
#[test]
fn test_category_filter() {
    let dir = TempDir::new().unwrap();
    // The `negative` case would fail; filtering it out makes the run pass.
    let config = write_suite(&dir, &spawn_server(), 404);

    api_runner()
        .args(["--lang", "en", "run", "--category", "positive", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("All tests passed!"));
}

/// JSON and HTML reports are written, and the JSON one can be re-rendered.
///
/// 写出 JSON 与 HTML 报告，且 JSON 报告可以被重新渲染。
#[test]
fn test_reports_are_written_and_replayed() {
    let dir = TempDir::new().unwrap();
    let config = write_suite(&dir, &spawn_server(), 200);
    let json = dir.path().join("reports/run.json");
    let html = dir.path().join("reports/run.html");

    api_runner()
        .args(["--lang", "en", "run", "--config"])
        .arg(&config)
        .arg("--json")
        .arg(&json)
        .arg("--html")
        .arg(&html)
        .assert()
        .success();

    assert!(json.exists());
    let page = fs::read_to_string(&html).unwrap();
    assert!(page.contains("CLI Suite - Run Report"));

    let replayed = dir.path().join("replayed.html");
    api_runner()
        .args(["--lang", "en", "report"])
        .arg(&json)
        .arg("--html")
        .arg(&replayed)
        .assert()
        .success()
        .stdout(predicate::str::contains("CLI Suite - Run Report"));
    assert!(replayed.exists());
}

/// The base URL flag overrides the suite file.
///
/// 基础 URL 参数会覆盖套件文件中的设置。
#[test]
fn test_base_url_override() {
    let dir = TempDir::new().unwrap();
    let config = write_suite(&dir, "http://127.0.0.1:9", 200);

    api_runner()
        .args(["--lang", "en", "run", "--base-url", &spawn_server(), "--config"])
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn test_missing_config_fails() {
    let dir = TempDir::new().unwrap();

    api_runner()
        .args(["--lang", "en", "run", "--config"])
        .arg(dir.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_init_creates_config_once() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("ApiSuite.toml");

    init(&output, false)
        .success()
        .stdout(predicate::str::contains("Created"));
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("[suite]"));

    init(&output, false)
        .success()
        .stdout(predicate::str::contains("already exists"));

    fs::write(&output, "# edited").unwrap();
    init(&output, true).success();
    assert!(fs::read_to_string(&output).unwrap().contains("[[cases]]"));
}

fn init(output: &Path, force: bool) -> assert_cmd::assert::Assert {
    let mut cmd = api_runner();
    cmd.args(["--lang", "en", "init", "--non-interactive", "--output"])
        .arg(output);
    if force {
        cmd.arg("--force");
    }
    cmd.assert()
}

#[test]
fn test_missing_subcommand_prints_help() {
    api_runner()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
