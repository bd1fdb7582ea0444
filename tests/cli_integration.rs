// CLI integration tests for the stdio transport and route listing.
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::{Value, json};

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_jsonrpc-router");
    Command::new(exe)
}

fn parse_json_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect()
}

#[test]
fn serve_answers_requests_over_stdio() {
    let mut child = cmd()
        .args(["serve"])
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn");

    {
        let mut stdin = child.stdin.take().expect("stdin");
        stdin
            .write_all(
                concat!(
                    "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"echo\",\"params\":{\"text\":\"hi\"}}\n",
                    "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"missingMethod\"}\n",
                    "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"sum\",\"params\":[1,2]}\n",
                )
                .as_bytes(),
            )
            .expect("write requests");
    }

    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());
    let replies = parse_json_lines(&output.stdout);
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["result"], json!({"text": "hi"}));
    assert_eq!(replies[1]["error"]["code"], json!(-32601));
    assert_eq!(replies[2]["id"], json!(3));
    assert_eq!(replies[2]["result"], json!(3.0));
}

#[test]
fn routes_lists_groups_and_methods() {
    let output = cmd().args(["routes"]).output().expect("routes");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert!(text.contains("Echo:"));
    assert!(text.contains("Math:"));
    for method in ["echo", "sum", "ping"] {
        assert_eq!(text.matches(&format!("  - {method}\n")).count(), 1);
    }
}

#[test]
fn zero_line_limit_is_a_usage_error() {
    let output = cmd()
        .args(["serve", "--max-line-bytes", "0"])
        .stdin(Stdio::null())
        .output()
        .expect("serve");
    assert_eq!(output.status.code(), Some(2));
    let line = String::from_utf8_lossy(&output.stderr);
    let error: Value = serde_json::from_str(line.lines().last().expect("error line")).expect("json");
    assert_eq!(error["error"]["kind"], json!("Usage"));
}
