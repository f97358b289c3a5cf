use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_listusersd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn listusersd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn submission_carried_by_the_render_request_shows_up_in_the_same_listing() {
    let workspace = temp_dir("listusers-write-then-read");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.import",
        json!({
            "users": [
                { "id": 1, "firstName": "Ada", "lastName": "Alpha", "email": "ada@example.org" },
                { "id": 2, "firstName": "Ben", "lastName": "Beta", "email": "ben@example.org" }
            ]
        }),
    );

    // The render request carries the submission; the returned table must
    // already reflect the write.
    let rendered = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "listing.render",
        json!({ "userid": 2, "grade": 7 }),
    );
    assert_eq!(rendered.get("applied").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(rendered.get("users").and_then(|v| v.as_i64()), Some(2));
    assert_eq!(rendered.get("graded").and_then(|v| v.as_i64()), Some(1));
    let html = rendered.get("html").and_then(|v| v.as_str()).expect("html");
    assert_eq!(html.matches("value=\"7\" readonly").count(), 1);
    // User 1 is still ungraded: empty control.
    assert_eq!(html.matches("value=\"\" readonly").count(), 1);

    let grades = request_ok(&mut stdin, &mut reader, "4", "grades.all", json!({}));
    let map = grades
        .get("grades")
        .and_then(|v| v.as_object())
        .expect("grades map");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("2").and_then(|v| v.as_i64()), Some(7));

    // Re-submit for the same user: single record, overwritten.
    let rendered = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "listing.render",
        json!({ "userid": 2, "grade": 9 }),
    );
    let html = rendered.get("html").and_then(|v| v.as_str()).expect("html");
    assert_eq!(html.matches("value=\"9\" readonly").count(), 1);
    assert_eq!(html.matches("value=\"7\" readonly").count(), 0);

    let grades = request_ok(&mut stdin, &mut reader, "6", "grades.all", json!({}));
    let map = grades
        .get("grades")
        .and_then(|v| v.as_object())
        .expect("grades map");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("2").and_then(|v| v.as_i64()), Some(9));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn render_without_submission_leaves_store_untouched() {
    let workspace = temp_dir("listusers-render-readonly");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.import",
        json!({
            "users": [
                { "id": 1, "firstName": "Ada", "lastName": "Alpha", "email": "ada@example.org" }
            ]
        }),
    );

    let rendered = request_ok(&mut stdin, &mut reader, "3", "listing.render", json!({}));
    assert_eq!(
        rendered.get("applied").and_then(|v| v.as_bool()),
        Some(false)
    );
    assert_eq!(rendered.get("graded").and_then(|v| v.as_i64()), Some(0));

    let grades = request_ok(&mut stdin, &mut reader, "4", "grades.all", json!({}));
    let map = grades
        .get("grades")
        .and_then(|v| v.as_object())
        .expect("grades map");
    assert!(map.is_empty());

    let _ = std::fs::remove_dir_all(workspace);
}
